//! Relevance gate for discovered URLs
//!
//! Pure functions: scoring search results against keywords, threshold
//! filtering, and URL deduplication.

mod dedup;
mod scorer;

pub use dedup::{deduplicate, deduplicate_results};
pub use scorer::{calculate_score, filter, score_result, score_results, EARLY_WINDOW};
