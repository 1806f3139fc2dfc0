// src/models.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Customer master record from dw.dim_customer.
///
/// `customer_id` is immutable once created. A record with `merged_into` set
/// was folded into another customer by a merge and is always archived at the
/// moment the merge commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub customer_name: String,
    pub market: String,
    pub merchant_group: Option<String>,
    pub archived: bool,
    pub merged_into: Option<String>,
}

/// Product master record from dw.dim_product. Products are archived and
/// restored but never merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: i32,
    pub product_code: String,
    pub item_name: String,
    pub product_group: String,
    pub archived: bool,
}

/// Minimal `{id, name}` pair fed to the match finder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerCandidate {
    pub customer_id: String,
    pub customer_name: String,
}

/// Match-quality tier derived from a continuous similarity score, for human
/// review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    High,
    Medium,
    Low,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::High => "high",
            MatchType::Medium => "medium",
            MatchType::Low => "low",
        }
    }

    /// Ordering rank; a higher rank means a stronger match.
    pub fn rank(&self) -> u8 {
        match self {
            MatchType::Exact => 3,
            MatchType::High => 2,
            MatchType::Medium => 1,
            MatchType::Low => 0,
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A candidate pairing between a newly imported customer (source) and a
/// historical one (target).
///
/// Matches are recomputed on every finder run and never persisted; an
/// operator either acts on one immediately or discards it.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerMatch {
    pub source_id: String,
    pub source_name: String,
    pub target_id: String,
    pub target_name: String,
    pub similarity_score: f64,
    pub match_type: MatchType,
}

/// Aggregate view of one finder run, for logging and operator display.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchSummary {
    pub total: usize,
    pub exact: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub avg_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_type_rank_ordering() {
        assert!(MatchType::Exact.rank() > MatchType::High.rank());
        assert!(MatchType::High.rank() > MatchType::Medium.rank());
        assert!(MatchType::Medium.rank() > MatchType::Low.rank());
    }

    #[test]
    fn test_match_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&MatchType::Exact).unwrap(), "\"exact\"");
        assert_eq!(serde_json::to_string(&MatchType::High).unwrap(), "\"high\"");
    }
}
