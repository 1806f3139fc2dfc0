// src/lib.rs

pub mod archive;
pub mod db;
pub mod dimensions;
pub mod matching;
pub mod merge;
pub mod models;

pub use db::PgPool;
pub use matching::name::{
    calculate_similarity, classify_match, extract_name_parts, find_customer_matches,
    normalize_customer_name, summarize_matches, DEFAULT_MIN_SCORE,
};
pub use models::{
    CustomerCandidate, CustomerMatch, CustomerRecord, MatchSummary, MatchType, ProductRecord,
};
