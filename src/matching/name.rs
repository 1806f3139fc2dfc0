// src/matching/name.rs

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::models::{CustomerCandidate, CustomerMatch, MatchSummary, MatchType};

// Weights for the blended similarity score.
const SEQUENCE_WEIGHT: f64 = 0.4;
const JACCARD_WEIGHT: f64 = 0.3;
const WORD_MATCH_WEIGHT: f64 = 0.2;
const SUBSTRING_WEIGHT: f64 = 0.1;
const SUBSTRING_BONUS: f64 = 0.3;

// Tier boundaries, inclusive on the lower bound.
const EXACT_THRESHOLD: f64 = 0.95;
const HIGH_THRESHOLD: f64 = 0.70;
const MEDIUM_THRESHOLD: f64 = 0.50;

/// Default minimum score for the match finder; operators adjust between 0.3
/// and 0.9 in the review UI.
pub const DEFAULT_MIN_SCORE: f64 = 0.5;

pub const MIN_TOKEN_LENGTH: usize = 2;

pub const STOPWORDS: [&str; 11] = [
    "the", "a", "an", "and", "or", "of", "for", "to", "in", "on", "at",
];

// Site/channel noise carried by imported names, e.g. "Local - 1:Farmlands:Kamo".
static NOISE_PREFIXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"^local\s*-\s*\d+:", r"^export\s*-\s*\d+:", r"^the\s+"]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("noise prefix pattern"))
        .collect()
});

static SEPARATOR_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[:\-_/\\]+").expect("separator pattern"));

/// Canonicalizes a raw customer name for comparison.
///
/// Lower-cases, strips noise prefixes, turns separator runs into spaces,
/// drops everything outside `[a-z0-9 ]`, and collapses whitespace. Empty or
/// all-noise input degrades to an empty string rather than an error; the
/// output is a fixpoint, so re-normalizing never changes it.
///
/// `"Local - 1:Farmlands:Kamo"` -> `"farmlands kamo"`
/// `"The Brand Outlet - Cashier1"` -> `"brand outlet cashier1"`
pub fn normalize_customer_name(name: &str) -> String {
    let mut normalized = name.to_lowercase();

    loop {
        let mut stripped = false;
        for pattern in NOISE_PREFIXES.iter() {
            let replaced = pattern.replace(&normalized, "");
            if replaced != normalized {
                normalized = replaced.into_owned();
                stripped = true;
            }
        }
        if !stripped {
            break;
        }
    }

    let normalized = SEPARATOR_RUNS.replace_all(&normalized, " ");
    let normalized: String = normalized
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();

    normalized.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits a name into its significant word parts: normalized tokens with
/// single characters and stopwords removed.
pub fn extract_name_parts(name: &str) -> HashSet<String> {
    normalize_customer_name(name)
        .split_whitespace()
        .filter(|token| token.len() >= MIN_TOKEN_LENGTH && !STOPWORDS.contains(token))
        .map(str::to_string)
        .collect()
}

/// Character-level sequence similarity: 2*LCS(a, b) / (|a| + |b|).
fn sequence_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return if a.is_empty() && b.is_empty() { 1.0 } else { 0.0 };
    }
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    let mut prev = vec![0usize; b_chars.len() + 1];
    let mut curr = vec![0usize; b_chars.len() + 1];
    for &ca in &a_chars {
        for (j, &cb) in b_chars.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
        curr[0] = 0;
    }
    let lcs = prev[b_chars.len()];

    (2.0 * lcs as f64) / ((a_chars.len() + b_chars.len()) as f64)
}

/// Blended similarity between two customer names, in `[0, 1]`.
///
/// Edit-style sequence similarity alone fails on reordered words
/// ("Farmlands Kamo" vs "Kamo Farmlands") and token overlap alone fails on
/// near-identical single-token names, so the score combines both with a
/// word-match ratio and a bonus when one normalized name contains the other.
pub fn calculate_similarity(name1: &str, name2: &str) -> f64 {
    let norm1 = normalize_customer_name(name1);
    let norm2 = normalize_customer_name(name2);

    if norm1.is_empty() || norm2.is_empty() {
        return 0.0;
    }
    if norm1 == norm2 {
        return 1.0;
    }

    let seq_score = sequence_ratio(&norm1, &norm2);

    let parts1 = extract_name_parts(name1);
    let parts2 = extract_name_parts(name2);
    let (jaccard, word_match) = if !parts1.is_empty() && !parts2.is_empty() {
        let intersection = parts1.intersection(&parts2).count() as f64;
        let union = parts1.union(&parts2).count() as f64;
        let smaller = parts1.len().min(parts2.len()) as f64;
        (intersection / union, intersection / smaller)
    } else {
        (0.0, 0.0)
    };

    let substring_score = if norm1.contains(&norm2) || norm2.contains(&norm1) {
        SUBSTRING_BONUS
    } else {
        0.0
    };

    let score = seq_score * SEQUENCE_WEIGHT
        + jaccard * JACCARD_WEIGHT
        + word_match * WORD_MATCH_WEIGHT
        + substring_score * SUBSTRING_WEIGHT;

    score.min(1.0)
}

/// Buckets a similarity score into a review tier.
pub fn classify_match(score: f64) -> MatchType {
    if score >= EXACT_THRESHOLD {
        MatchType::Exact
    } else if score >= HIGH_THRESHOLD {
        MatchType::High
    } else if score >= MEDIUM_THRESHOLD {
        MatchType::Medium
    } else {
        MatchType::Low
    }
}

/// Pairs each newly imported customer with its best-scoring historical
/// candidate at or above `min_score`.
///
/// Historical candidates are scanned in ascending id order so that exact
/// score ties resolve to the same candidate on every run. A new record with
/// no candidate over the threshold simply produces no match. The result is
/// ordered by descending score, then source id.
pub fn find_customer_matches(
    new_customers: &[CustomerCandidate],
    historical_customers: &[CustomerCandidate],
    min_score: f64,
) -> Vec<CustomerMatch> {
    let mut historical: Vec<&CustomerCandidate> = historical_customers.iter().collect();
    historical.sort_by(|a, b| a.customer_id.cmp(&b.customer_id));

    let mut matches = Vec::new();
    for new in new_customers {
        if new.customer_name.is_empty() {
            continue;
        }

        let mut best: Option<(f64, &CustomerCandidate)> = None;
        for &hist in &historical {
            if hist.customer_name.is_empty() || hist.customer_id == new.customer_id {
                continue;
            }
            let score = calculate_similarity(&new.customer_name, &hist.customer_name);
            if score >= min_score && best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, hist));
            }
        }

        if let Some((score, hist)) = best {
            matches.push(CustomerMatch {
                source_id: new.customer_id.clone(),
                source_name: new.customer_name.clone(),
                target_id: hist.customer_id.clone(),
                target_name: hist.customer_name.clone(),
                similarity_score: score,
                match_type: classify_match(score),
            });
        }
    }

    matches.sort_by(|a, b| {
        b.similarity_score
            .total_cmp(&a.similarity_score)
            .then_with(|| a.source_id.cmp(&b.source_id))
    });
    matches
}

/// Per-tier counts and average score over a finder result.
pub fn summarize_matches(matches: &[CustomerMatch]) -> MatchSummary {
    let mut summary = MatchSummary {
        total: matches.len(),
        ..Default::default()
    };
    for m in matches {
        match m.match_type {
            MatchType::Exact => summary.exact += 1,
            MatchType::High => summary.high += 1,
            MatchType::Medium => summary.medium += 1,
            MatchType::Low => summary.low += 1,
        }
    }
    if !matches.is_empty() {
        summary.avg_score =
            matches.iter().map(|m| m.similarity_score).sum::<f64>() / matches.len() as f64;
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, name: &str) -> CustomerCandidate {
        CustomerCandidate {
            customer_id: id.to_string(),
            customer_name: name.to_string(),
        }
    }

    #[test]
    fn test_normalize_strips_channel_prefixes() {
        assert_eq!(
            normalize_customer_name("Local - 1:Farmlands:Kamo"),
            "farmlands kamo"
        );
        assert_eq!(
            normalize_customer_name("Export - 12:Offshore Traders"),
            "offshore traders"
        );
        assert_eq!(
            normalize_customer_name("The Brand Outlet - Cashier1"),
            "brand outlet cashier1"
        );
    }

    #[test]
    fn test_normalize_separators_and_noise() {
        assert_eq!(normalize_customer_name("Farmlands - Kamo"), "farmlands kamo");
        assert_eq!(normalize_customer_name("A/B_C\\D:E"), "a b c d e");
        assert_eq!(normalize_customer_name("O'Brien & Sons Ltd."), "obrien sons ltd");
        assert_eq!(normalize_customer_name("  Spaced   Out  "), "spaced out");
    }

    #[test]
    fn test_normalize_degenerate_input() {
        assert_eq!(normalize_customer_name(""), "");
        assert_eq!(normalize_customer_name("   "), "");
        assert_eq!(normalize_customer_name("!!!???"), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "Local - 1:Farmlands:Kamo",
            "The The Shop",
            "Farmlands - Te Puke",
            "Export - 3:The Local Depot",
            "",
            "plain name",
        ];
        for sample in samples {
            let once = normalize_customer_name(sample);
            assert_eq!(normalize_customer_name(&once), once, "input {:?}", sample);
        }
    }

    #[test]
    fn test_extract_name_parts_drops_stopwords_and_short_tokens() {
        let parts = extract_name_parts("The Farmlands of Kamo & Co - A");
        assert!(parts.contains("farmlands"));
        assert!(parts.contains("kamo"));
        assert!(parts.contains("co"));
        assert!(!parts.contains("the"));
        assert!(!parts.contains("of"));
        assert!(!parts.contains("a"));
    }

    #[test]
    fn test_similarity_bounds_and_identity() {
        let pairs = [
            ("Farmlands Kamo", "Kamo Farmlands"),
            ("Alpha", "Omega"),
            ("", "Something"),
            ("Local - 1:X:Y", "X Y"),
        ];
        for (a, b) in pairs {
            let score = calculate_similarity(a, b);
            assert!((0.0..=1.0).contains(&score), "{} vs {} -> {}", a, b, score);
        }
        assert_eq!(calculate_similarity("Farmlands Kamo", "Farmlands Kamo"), 1.0);
        assert_eq!(calculate_similarity("Farmlands - Kamo", "farmlands kamo"), 1.0);
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let pairs = [
            ("Farmlands Kamo", "Kamo Farmlands"),
            ("Brand Outlet", "The Brand Outlet - Cashier1"),
            ("Harbour Supplies", "Harbour Supplies North"),
        ];
        for (a, b) in pairs {
            assert_eq!(calculate_similarity(a, b), calculate_similarity(b, a));
        }
    }

    #[test]
    fn test_similarity_empty_input_scores_zero() {
        assert_eq!(calculate_similarity("", ""), 0.0);
        assert_eq!(calculate_similarity("", "Farmlands"), 0.0);
        assert_eq!(calculate_similarity("???", "Farmlands"), 0.0);
    }

    #[test]
    fn test_similarity_survives_word_reordering() {
        // Token overlap carries the score where pure edit distance collapses.
        let score = calculate_similarity("Farmlands Kamo", "Kamo Farmlands");
        assert!(score >= 0.5, "got {}", score);
    }

    #[test]
    fn test_similarity_rewards_abbreviations() {
        let full = calculate_similarity("Harbour Supplies", "Harbour Supplies North Branch");
        let unrelated = calculate_similarity("Harbour Supplies", "Kamo Farmlands");
        assert!(full > unrelated);
    }

    #[test]
    fn test_separator_variants_score_near_exact() {
        let score = calculate_similarity("Farmlands - Kamo", "Farmlands Kamo");
        assert!(score >= 0.95, "got {}", score);
    }

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify_match(1.0), MatchType::Exact);
        assert_eq!(classify_match(0.95), MatchType::Exact);
        assert_eq!(classify_match(0.94), MatchType::High);
        assert_eq!(classify_match(0.70), MatchType::High);
        assert_eq!(classify_match(0.69), MatchType::Medium);
        assert_eq!(classify_match(0.50), MatchType::Medium);
        assert_eq!(classify_match(0.49), MatchType::Low);
        assert_eq!(classify_match(0.0), MatchType::Low);
    }

    #[test]
    fn test_classify_is_monotone() {
        let mut previous = classify_match(0.0).rank();
        let mut score = 0.0;
        while score <= 1.0 {
            let rank = classify_match(score).rank();
            assert!(rank >= previous);
            previous = rank;
            score += 0.01;
        }
    }

    #[test]
    fn test_find_matches_basic_scenario() {
        let new = vec![candidate("u1", "Farmlands Te Puke")];
        let historical = vec![candidate("5", "Farmlands - Te Puke")];
        let matches = find_customer_matches(&new, &historical, 0.5);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].source_id, "u1");
        assert_eq!(matches[0].target_id, "5");
        assert!(matches[0].similarity_score >= 0.7);
    }

    #[test]
    fn test_find_matches_threshold_and_uniqueness() {
        let new = vec![
            candidate("u1", "Farmlands Kamo"),
            candidate("u2", "Completely Unrelated Name"),
        ];
        let historical = vec![
            candidate("1", "Farmlands - Kamo"),
            candidate("2", "Farmlands - Te Puke"),
            candidate("3", "Harbour Supplies"),
        ];
        let matches = find_customer_matches(&new, &historical, 0.6);

        let sources: Vec<&str> = matches.iter().map(|m| m.source_id.as_str()).collect();
        assert_eq!(sources, vec!["u1"]);
        for m in &matches {
            assert!(m.similarity_score >= 0.6);
        }
    }

    #[test]
    fn test_find_matches_picks_best_candidate() {
        let new = vec![candidate("u1", "Farmlands Kamo")];
        let historical = vec![
            candidate("1", "Farmlands - Te Puke"),
            candidate("2", "Farmlands - Kamo"),
        ];
        let matches = find_customer_matches(&new, &historical, 0.3);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].target_id, "2");
    }

    #[test]
    fn test_find_matches_skips_same_id_and_empty_names() {
        let new = vec![candidate("7", "Farmlands Kamo"), candidate("u2", "")];
        let historical = vec![candidate("7", "Farmlands Kamo"), candidate("8", "")];
        let matches = find_customer_matches(&new, &historical, 0.1);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_find_matches_empty_inputs() {
        assert!(find_customer_matches(&[], &[], 0.5).is_empty());
        assert!(find_customer_matches(&[candidate("u1", "X")], &[], 0.5).is_empty());
    }

    #[test]
    fn test_find_matches_ordered_by_score_descending() {
        let new = vec![
            candidate("u1", "Harbour Supplies Northland Region"),
            candidate("u2", "Farmlands Kamo"),
        ];
        let historical = vec![
            candidate("1", "Farmlands - Kamo"),
            candidate("2", "Harbour Supplies"),
        ];
        let matches = find_customer_matches(&new, &historical, 0.3);
        assert_eq!(matches.len(), 2);
        assert!(matches[0].similarity_score >= matches[1].similarity_score);
    }

    #[test]
    fn test_find_matches_tie_break_is_first_id() {
        // Two identical historical names force an exact score tie; the lower
        // id must win regardless of input ordering.
        let new = vec![candidate("u1", "Farmlands Kamo")];
        let historical_a = vec![
            candidate("20", "Farmlands Kamo"),
            candidate("10", "Farmlands Kamo"),
        ];
        let historical_b = vec![
            candidate("10", "Farmlands Kamo"),
            candidate("20", "Farmlands Kamo"),
        ];
        let match_a = &find_customer_matches(&new, &historical_a, 0.5)[0];
        let match_b = &find_customer_matches(&new, &historical_b, 0.5)[0];
        assert_eq!(match_a.target_id, "10");
        assert_eq!(match_b.target_id, "10");
    }

    #[test]
    fn test_summarize_matches() {
        let new = vec![
            candidate("u1", "Farmlands Kamo"),
            candidate("u2", "Harbour Supplies"),
        ];
        let historical = vec![
            candidate("1", "Farmlands - Kamo"),
            candidate("2", "Harbour Supplies North"),
        ];
        let matches = find_customer_matches(&new, &historical, 0.3);
        let summary = summarize_matches(&matches);

        assert_eq!(summary.total, matches.len());
        assert_eq!(
            summary.exact + summary.high + summary.medium + summary.low,
            summary.total
        );
        assert!(summary.avg_score > 0.0);

        let empty = summarize_matches(&[]);
        assert_eq!(empty.total, 0);
        assert_eq!(empty.avg_score, 0.0);
    }
}
