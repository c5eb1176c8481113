//! Post search for Clubhub
//!
//! Implements:
//! - Query normalization and tokenization
//! - Trigram similarity (shared by SQL and in-process scoring)
//! - Match-score normalization with a strict acceptance threshold
//! - One-time capability probe for database-side trigram scoring
//! - Ranked search with an in-process safety net

mod capability;
mod fallback;
mod query;
mod ranked;
mod score;
mod source;
mod trigram;

pub use capability::*;
pub use fallback::*;
pub use query::*;
pub use ranked::*;
pub use score::*;
pub use source::*;
pub use trigram::*;

/// Tunables for ranked search
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Tokens considered per query
    pub max_tokens: usize,
    /// Newest posts scored by the in-process path
    pub fallback_candidates: usize,
    /// Characters of title + content split into words per post
    pub fallback_scan_chars: usize,
    /// Stop scanning a post once a word reaches this similarity
    pub short_circuit_similarity: f64,
    /// Hard cap on any requested limit
    pub max_limit: usize,
    /// Re-score in process when the database finds nothing
    pub safety_net: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_tokens: MAX_QUERY_TOKENS,
            fallback_candidates: 500,
            fallback_scan_chars: 3000,
            short_circuit_similarity: 0.9,
            max_limit: 200,
            safety_net: true,
        }
    }
}
