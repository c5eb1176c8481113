//! Post listing and database-side ranking
//!
//! The ranked query mirrors `PushdownPlan::raw_similarity`: a containment
//! shortcut over the whole query's case variants, otherwise the maximum
//! `similarity()` of any token variant against title or content.

use rusqlite::{Connection, ToSql};

use super::connection::Storage;
use super::functions::{FOLD_FUNCTION, MATCH_SCORE_FUNCTION, SIMILARITY_FUNCTION};
use super::queries::{post_from_row, POST_COLUMNS};
use crate::error::Result;
use crate::search::{CandidateSource, PushdownPlan, SearchHit, ACCEPT_THRESHOLD};
use crate::types::{Post, PostFilter};

/// Append the SQL conditions for a post filter
fn push_filter(
    filter: &PostFilter,
    conditions: &mut Vec<String>,
    params: &mut Vec<Box<dyn ToSql>>,
) {
    if let Some(club_id) = filter.club_id {
        conditions.push("p.club_id = ?".to_string());
        params.push(Box::new(club_id));
    }
    if filter.event_like {
        conditions.push("(p.post_type = 'event' OR p.is_form = 1)".to_string());
    }
    if let Some(post_type) = &filter.post_type {
        conditions.push("p.post_type = ?".to_string());
        params.push(Box::new(post_type.clone()));
    }
    if let Some(is_form) = filter.is_form {
        conditions.push("p.is_form = ?".to_string());
        params.push(Box::new(is_form));
    }
}

fn where_clause(conditions: &[String]) -> String {
    if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    }
}

/// SQLite treats a negative LIMIT as unbounded
fn sql_limit(limit: Option<usize>) -> i64 {
    limit.map(|l| l as i64).unwrap_or(-1)
}

/// Newest posts matching `filter`
pub fn recent_posts(conn: &Connection, filter: &PostFilter, limit: Option<usize>) -> Result<Vec<Post>> {
    let mut conditions = Vec::new();
    let mut params: Vec<Box<dyn ToSql>> = Vec::new();
    push_filter(filter, &mut conditions, &mut params);

    let sql = format!(
        "SELECT {} FROM posts p{} ORDER BY p.published_at DESC, p.id DESC LIMIT ?",
        POST_COLUMNS,
        where_clause(&conditions)
    );
    params.push(Box::new(sql_limit(limit)));

    let param_refs: Vec<&dyn ToSql> = params.iter().map(|b| b.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let posts = stmt
        .query_map(param_refs.as_slice(), post_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(posts)
}

/// Rank posts inside SQLite with the registered trigram functions.
///
/// Fails with "no such function" when the functions are not registered;
/// callers are expected to consult the capability probe first.
pub fn ranked_posts(
    conn: &Connection,
    filter: &PostFilter,
    plan: &PushdownPlan,
    limit: Option<usize>,
) -> Result<Vec<SearchHit>> {
    let mut params: Vec<Box<dyn ToSql>> = Vec::new();

    // Containment shortcut; `instr` on folded text is literal and Unicode-aware
    let mut exact = Vec::new();
    for variant in &plan.exact_variants {
        exact.push(format!(
            "instr({fold}(p.title), ?) > 0 OR instr({fold}(p.content), ?) > 0",
            fold = FOLD_FUNCTION
        ));
        params.push(Box::new(variant.clone()));
        params.push(Box::new(variant.clone()));
    }

    // Per-(variant, field) similarity signals
    let mut signals = vec!["0.0".to_string()];
    for variant in &plan.token_variants {
        signals.push(format!("{}(?, p.title)", SIMILARITY_FUNCTION));
        signals.push(format!("{}(?, p.content)", SIMILARITY_FUNCTION));
        params.push(Box::new(variant.clone()));
        params.push(Box::new(variant.clone()));
    }
    // One-argument max() is the aggregate, so only use it with two or more
    let best_signal = if signals.len() > 1 {
        format!("max({})", signals.join(", "))
    } else {
        "0.0".to_string()
    };

    let raw_similarity = if exact.is_empty() {
        best_signal
    } else {
        format!(
            "CASE WHEN {} THEN 1.0 ELSE {} END",
            exact.join(" OR "),
            best_signal
        )
    };

    let mut conditions = Vec::new();
    push_filter(filter, &mut conditions, &mut params);

    let sql = format!(
        "SELECT * FROM (
            SELECT {columns}, {score_fn}({raw}) AS score
            FROM posts p{filter}
         ) ranked
         WHERE score > ?
         ORDER BY score DESC, published_at DESC, id DESC
         LIMIT ?",
        columns = POST_COLUMNS,
        score_fn = MATCH_SCORE_FUNCTION,
        raw = raw_similarity,
        filter = where_clause(&conditions),
    );
    params.push(Box::new(ACCEPT_THRESHOLD));
    params.push(Box::new(sql_limit(limit)));

    let param_refs: Vec<&dyn ToSql> = params.iter().map(|b| b.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let hits = stmt
        .query_map(param_refs.as_slice(), |row| {
            let post = post_from_row(row)?;
            let score: f64 = row.get("score")?;
            Ok(SearchHit::scored(post, score))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(hits)
}

impl CandidateSource for Storage {
    fn recent_posts(&self, filter: &PostFilter, limit: Option<usize>) -> Result<Vec<Post>> {
        self.with_connection(|conn| recent_posts(conn, filter, limit))
    }

    fn ranked_posts(
        &self,
        filter: &PostFilter,
        plan: &PushdownPlan,
        limit: Option<usize>,
    ) -> Result<Vec<SearchHit>> {
        self.with_connection(|conn| ranked_posts(conn, filter, plan, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::queries::{create_club, create_post};
    use crate::types::{CreateClubInput, CreatePostInput, PostType};
    use chrono::{Duration, TimeZone, Utc};

    fn seeded() -> Storage {
        let storage = Storage::open_in_memory().unwrap();
        storage
            .with_transaction(|conn| {
                let club = create_club(
                    conn,
                    &CreateClubInput {
                        name: "Games".into(),
                        description: String::new(),
                        avatar_url: String::new(),
                    },
                )?;
                let other = create_club(
                    conn,
                    &CreateClubInput {
                        name: "Arts".into(),
                        description: String::new(),
                        avatar_url: String::new(),
                    },
                )?;
                let base = Utc.with_ymd_and_hms(2024, 10, 1, 18, 0, 0).unwrap();
                let rows = [
                    (club.id, "Chess", "", PostType::Event, false),
                    (club.id, "100% attendance_prize", "", PostType::Post, false),
                    (other.id, "Art jam", "painting session", PostType::Event, true),
                    (other.id, "Chest of drawers sale", "", PostType::Announcement, false),
                ];
                for (i, (club_id, title, content, post_type, is_form)) in rows.into_iter().enumerate() {
                    create_post(
                        conn,
                        &CreatePostInput {
                            club_id,
                            title: title.into(),
                            content: content.into(),
                            image_url: String::new(),
                            post_type,
                            is_form,
                            published_at: Some(base + Duration::minutes(i as i64)),
                        },
                    )?;
                }
                Ok(())
            })
            .unwrap();
        storage
    }

    #[test]
    fn test_recent_posts_filters() {
        let storage = seeded();
        let all = storage.recent_posts(&PostFilter::default(), None).unwrap();
        assert_eq!(all.iter().map(|p| p.id).collect::<Vec<_>>(), vec![4, 3, 2, 1]);

        let events = storage
            .recent_posts(
                &PostFilter {
                    event_like: true,
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        assert_eq!(events.iter().map(|p| p.id).collect::<Vec<_>>(), vec![3, 1]);

        let club_two = storage
            .recent_posts(
                &PostFilter {
                    club_id: Some(2),
                    post_type: Some("announcement".into()),
                    ..Default::default()
                },
                Some(5),
            )
            .unwrap();
        assert_eq!(club_two.len(), 1);
        assert_eq!(club_two[0].id, 4);

        let unknown = PostFilter::from_params(None, Some("gala"), None, None);
        assert!(storage.recent_posts(&unknown, None).unwrap().is_empty());
    }

    #[test]
    fn test_ranked_literal_wildcards() {
        let storage = seeded();
        let plan = PushdownPlan::new("0% a", &["0%".into(), "a".into()]);
        let hits = storage
            .ranked_posts(&PostFilter::default(), &plan, None)
            .unwrap();
        // "%" must not act as a wildcard: only the literal title contains "0% a"
        assert_eq!(hits[0].post.id, 2);
        assert_eq!(hits[0].score, Some(1.0));
    }

    #[test]
    fn test_ranked_fuzzy_and_filter() {
        let storage = seeded();
        let plan = PushdownPlan::new("chesz", &["chesz".into()]);
        let hits = storage
            .ranked_posts(&PostFilter::default(), &plan, None)
            .unwrap();
        assert_eq!(hits.iter().map(|h| h.post.id).collect::<Vec<_>>(), vec![1]);

        let hits = storage
            .ranked_posts(
                &PostFilter {
                    club_id: Some(2),
                    ..Default::default()
                },
                &plan,
                None,
            )
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_ranked_without_functions_fails() {
        let storage = Storage::open_in_memory_without_trigram().unwrap();
        let plan = PushdownPlan::new("chess", &["chess".into()]);
        assert!(storage
            .ranked_posts(&PostFilter::default(), &plan, None)
            .is_err());
    }
}
