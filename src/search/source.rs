//! Candidate sources for ranked search
//!
//! A source hands out the base post set (already restricted by a
//! [`PostFilter`]) and, when it can, ranks that set itself from a
//! [`PushdownPlan`]. SQLite storage is the production source;
//! [`InMemoryPosts`] evaluates the same plan in process.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::query::{distinct_case_variants, fold};
use super::score::{is_accepted, match_score};
use super::trigram::similarity;
use crate::error::Result;
use crate::types::{Post, PostFilter};

/// A post in a result list, with its match score when ranking happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub post: Post,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub score: Option<f64>,
}

impl SearchHit {
    pub fn unranked(post: Post) -> Self {
        Self { post, score: None }
    }

    pub fn scored(post: Post, score: f64) -> Self {
        Self {
            post,
            score: Some(score),
        }
    }
}

/// Everything a store needs to score posts without calling back into Rust
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushdownPlan {
    /// Case variants of the whole query, folded and deduplicated, tested
    /// for containment in the folded title and content
    pub exact_variants: Vec<String>,
    /// Case variants of every token, compared by trigram similarity
    pub token_variants: Vec<String>,
}

impl PushdownPlan {
    pub fn new(query: &str, tokens: &[String]) -> Self {
        let mut token_variants = Vec::new();
        for token in tokens {
            for variant in distinct_case_variants(token) {
                if !token_variants.contains(&variant) {
                    token_variants.push(variant);
                }
            }
        }

        let mut exact_variants: Vec<String> = Vec::new();
        for variant in distinct_case_variants(query) {
            let folded = fold(&variant);
            if !exact_variants.contains(&folded) {
                exact_variants.push(folded);
            }
        }

        Self {
            exact_variants,
            token_variants,
        }
    }

    /// Raw similarity of one post under this plan
    pub fn raw_similarity(&self, post: &Post) -> f64 {
        let title = fold(&post.title);
        let content = fold(&post.content);
        let exact = self
            .exact_variants
            .iter()
            .any(|variant| title.contains(variant.as_str()) || content.contains(variant.as_str()));
        if exact {
            return 1.0;
        }

        self.token_variants
            .iter()
            .flat_map(|variant| {
                [
                    similarity(variant, &post.title),
                    similarity(variant, &post.content),
                ]
            })
            .fold(0.0, f64::max)
    }
}

/// Store of candidate posts
pub trait CandidateSource {
    /// Posts matching `filter`, newest first (`published_at desc, id desc`)
    fn recent_posts(&self, filter: &PostFilter, limit: Option<usize>) -> Result<Vec<Post>>;

    /// Posts matching `filter` ranked by the store itself: accepted hits only,
    /// ordered by `score desc, published_at desc, id desc`
    fn ranked_posts(
        &self,
        filter: &PostFilter,
        plan: &PushdownPlan,
        limit: Option<usize>,
    ) -> Result<Vec<SearchHit>>;
}

/// Newest-first ordering used for unranked listings and as the tie-break
pub fn recency_order(a: &Post, b: &Post) -> Ordering {
    b.published_at
        .cmp(&a.published_at)
        .then_with(|| b.id.cmp(&a.id))
}

/// Result ordering: best score first, then newest
pub fn hit_order(a: &SearchHit, b: &SearchHit) -> Ordering {
    let sa = a.score.unwrap_or(0.0);
    let sb = b.score.unwrap_or(0.0);
    sb.total_cmp(&sa)
        .then_with(|| recency_order(&a.post, &b.post))
}

/// Posts held in memory; ranks with the same semantics as the SQL path
#[derive(Debug, Clone, Default)]
pub struct InMemoryPosts {
    posts: Vec<Post>,
}

impl InMemoryPosts {
    pub fn new(posts: Vec<Post>) -> Self {
        Self { posts }
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    fn filtered<'a>(&'a self, filter: &'a PostFilter) -> impl Iterator<Item = &'a Post> + 'a {
        self.posts.iter().filter(move |post| filter.matches(post))
    }
}

impl CandidateSource for InMemoryPosts {
    fn recent_posts(&self, filter: &PostFilter, limit: Option<usize>) -> Result<Vec<Post>> {
        let mut posts: Vec<Post> = self.filtered(filter).cloned().collect();
        posts.sort_by(recency_order);
        if let Some(limit) = limit {
            posts.truncate(limit);
        }
        Ok(posts)
    }

    fn ranked_posts(
        &self,
        filter: &PostFilter,
        plan: &PushdownPlan,
        limit: Option<usize>,
    ) -> Result<Vec<SearchHit>> {
        let mut hits: Vec<SearchHit> = self
            .filtered(filter)
            .filter_map(|post| {
                let score = match_score(plan.raw_similarity(post));
                is_accepted(score).then(|| SearchHit::scored(post.clone(), score))
            })
            .collect();
        hits.sort_by(hit_order);
        if let Some(limit) = limit {
            hits.truncate(limit);
        }
        Ok(hits)
    }
}
