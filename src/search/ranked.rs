//! Ranked post search
//!
//! Chooses between scoring inside the database and scoring in process,
//! and re-runs in process when the database returns nothing for a
//! non-empty query (its word handling can miss non-Latin scripts).

use serde::{Deserialize, Serialize};

use super::capability::FuzzyCapability;
use super::fallback::FallbackScorer;
use super::query::{normalize, tokenize, NormalizedQuery};
use super::source::{CandidateSource, PushdownPlan, SearchHit};
use super::SearchConfig;
use crate::error::Result;
use crate::types::PostFilter;

/// Which code path produced a result list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPath {
    /// Empty query: newest first, no scoring
    Unranked,
    /// Scored by the database
    Database,
    /// Scored in process because the database lacks trigram support
    InProcess,
    /// Database returned nothing; in-process rescoring ran instead
    SafetyNet,
}

/// Ordered search output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,
    pub path: SearchPath,
}

impl SearchResults {
    pub fn post_ids(&self) -> Vec<i64> {
        self.hits.iter().map(|hit| hit.post.id).collect()
    }
}

/// What the database path returned, before deciding on a retry
#[derive(Debug, Clone, PartialEq)]
pub enum PushdownOutcome {
    Ranked(Vec<SearchHit>),
    /// Nothing matched a non-empty query; worth re-checking in process
    EmptySuspicious,
    /// Nothing matched and no re-check is wanted
    EmptyFinal,
}

/// Post search over a candidate source
pub struct RankedSearch<'a, S: CandidateSource + ?Sized> {
    source: &'a S,
    capability: &'a FuzzyCapability,
    config: &'a SearchConfig,
}

impl<'a, S: CandidateSource + ?Sized> RankedSearch<'a, S> {
    pub fn new(source: &'a S, capability: &'a FuzzyCapability, config: &'a SearchConfig) -> Self {
        Self {
            source,
            capability,
            config,
        }
    }

    /// Search the posts matching `filter` for `raw_query`.
    ///
    /// `limit` is clamped to `max_limit`; `None` returns every accepted hit.
    pub fn search(
        &self,
        filter: &PostFilter,
        raw_query: &str,
        limit: Option<usize>,
    ) -> Result<SearchResults> {
        let limit = limit.map(|l| l.min(self.config.max_limit));

        let query = match normalize(raw_query) {
            NormalizedQuery::Empty => {
                let hits = self
                    .source
                    .recent_posts(filter, limit)?
                    .into_iter()
                    .map(SearchHit::unranked)
                    .collect();
                return Ok(SearchResults {
                    hits,
                    path: SearchPath::Unranked,
                });
            }
            NormalizedQuery::Text(text) => text,
        };

        let tokens = tokenize(&query, self.config.max_tokens);

        if !self.capability.is_available() {
            let hits = self.in_process(filter, &tokens, limit)?;
            tracing::debug!(query = %query, hits = hits.len(), "in-process search");
            return Ok(SearchResults {
                hits,
                path: SearchPath::InProcess,
            });
        }

        match self.pushdown(filter, &query, &tokens, limit)? {
            PushdownOutcome::Ranked(hits) => {
                tracing::debug!(query = %query, hits = hits.len(), "database search");
                Ok(SearchResults {
                    hits,
                    path: SearchPath::Database,
                })
            }
            PushdownOutcome::EmptyFinal => Ok(SearchResults {
                hits: Vec::new(),
                path: SearchPath::Database,
            }),
            PushdownOutcome::EmptySuspicious => {
                let hits = self.in_process(filter, &tokens, limit)?;
                tracing::info!(
                    query = %query,
                    hits = hits.len(),
                    "database search found nothing, rescored in process"
                );
                Ok(SearchResults {
                    hits,
                    path: SearchPath::SafetyNet,
                })
            }
        }
    }

    /// Let the store score the candidates
    pub fn pushdown(
        &self,
        filter: &PostFilter,
        query: &str,
        tokens: &[String],
        limit: Option<usize>,
    ) -> Result<PushdownOutcome> {
        let plan = PushdownPlan::new(query, tokens);
        let hits = self.source.ranked_posts(filter, &plan, limit)?;

        Ok(if !hits.is_empty() {
            PushdownOutcome::Ranked(hits)
        } else if self.config.safety_net {
            PushdownOutcome::EmptySuspicious
        } else {
            PushdownOutcome::EmptyFinal
        })
    }

    /// Score the newest `fallback_candidates` posts in process
    pub fn in_process(
        &self,
        filter: &PostFilter,
        tokens: &[String],
        limit: Option<usize>,
    ) -> Result<Vec<SearchHit>> {
        let candidates = self
            .source
            .recent_posts(filter, Some(self.config.fallback_candidates))?;
        Ok(FallbackScorer::new(tokens, self.config).rank(candidates, limit))
    }
}
