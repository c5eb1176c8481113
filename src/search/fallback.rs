//! In-process ranking used when the database cannot score posts itself

use super::score::{is_accepted, match_score};
use super::source::{hit_order, SearchHit};
use super::trigram::TrigramSet;
use super::SearchConfig;
use crate::types::Post;

/// Scores posts against a tokenized query word by word
#[derive(Debug, Clone)]
pub struct FallbackScorer {
    tokens: Vec<String>,
    token_sets: Vec<TrigramSet>,
    scan_chars: usize,
    short_circuit: f64,
}

impl FallbackScorer {
    /// `tokens` must already be case-folded
    pub fn new(tokens: &[String], config: &SearchConfig) -> Self {
        Self {
            tokens: tokens.to_vec(),
            token_sets: tokens.iter().map(|t| TrigramSet::new(t)).collect(),
            scan_chars: config.fallback_scan_chars,
            short_circuit: config.short_circuit_similarity,
        }
    }

    /// Best similarity between any token and any word of the post.
    ///
    /// A token found verbatim in the folded text scores 1.0 outright. Only
    /// the first `scan_chars` characters are split into words, and the scan
    /// stops at the first similarity of `short_circuit` or more.
    pub fn raw_similarity(&self, post: &Post) -> f64 {
        let haystack = format!("{} {}", post.title, post.content).to_lowercase();

        if self.tokens.iter().any(|token| haystack.contains(token.as_str())) {
            return 1.0;
        }

        let scanned: String = haystack.chars().take(self.scan_chars).collect();
        let mut best = 0.0_f64;

        for word in words(&scanned) {
            let word_set = TrigramSet::new(word);
            for token_set in &self.token_sets {
                best = best.max(token_set.similarity(&word_set));
                if best >= self.short_circuit {
                    return best;
                }
            }
        }

        best
    }

    /// Score, filter and order `posts`; `limit` truncates the ordered list
    pub fn rank(&self, posts: Vec<Post>, limit: Option<usize>) -> Vec<SearchHit> {
        let mut hits: Vec<SearchHit> = posts
            .into_iter()
            .filter_map(|post| {
                let score = match_score(self.raw_similarity(&post));
                is_accepted(score).then(|| SearchHit::scored(post, score))
            })
            .collect();

        hits.sort_by(hit_order);
        if let Some(limit) = limit {
            hits.truncate(limit);
        }
        hits
    }
}

/// Punctuation-free words of already folded text
fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PostType;
    use chrono::{Duration, TimeZone, Utc};

    fn post(id: i64, title: &str, content: &str) -> Post {
        Post {
            id,
            club_id: 1,
            title: title.into(),
            content: content.into(),
            image_url: String::new(),
            post_type: PostType::Event,
            is_form: false,
            published_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
                + Duration::hours(id),
        }
    }

    fn scorer(tokens: &[&str]) -> FallbackScorer {
        let tokens: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        FallbackScorer::new(&tokens, &SearchConfig::default())
    }

    #[test]
    fn test_literal_token_scores_one() {
        let s = scorer(&["chess"]);
        assert_eq!(s.raw_similarity(&post(1, "Chess Club Meetup", "")), 1.0);
        assert_eq!(s.raw_similarity(&post(2, "Meetup", "we play CHESS")), 1.0);
    }

    #[test]
    fn test_word_level_similarity() {
        let s = scorer(&["chesz"]);
        let sim = s.raw_similarity(&post(1, "Weekly", "chess, every friday!"));
        assert!((sim - 4.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_scan_window() {
        let config = SearchConfig {
            fallback_scan_chars: 10,
            ..SearchConfig::default()
        };
        let s = FallbackScorer::new(&["tournament".to_string()], &config);
        let far = format!("{} tournamnet", "x".repeat(50));
        assert_eq!(s.raw_similarity(&post(1, "Notice", &far)), 0.0);
    }

    #[test]
    fn test_rank_orders_and_limits() {
        let s = scorer(&["chess"]);
        let posts = vec![
            post(1, "Chess club", ""),
            post(2, "Art jam", "painting session"),
            post(3, "Chess night", ""),
        ];
        let hits = s.rank(posts.clone(), None);
        let ids: Vec<i64> = hits.iter().map(|h| h.post.id).collect();
        assert_eq!(ids, vec![3, 1]);

        let hits = s.rank(posts, Some(1));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].post.id, 3);
    }

    #[test]
    fn test_words_strip_punctuation() {
        let collected: Vec<&str> = words("chess, go; (art)--jam").collect();
        assert_eq!(collected, vec!["chess", "go", "art", "jam"]);
    }
}
