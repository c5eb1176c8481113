//! SQL scalar functions for database-side trigram ranking
//!
//! `similarity(a, b)`, `match_score(x)` and `fold(x)` are thin wrappers over
//! the search module, registered per connection. The presence of
//! `similarity()` is what the capability probe looks for.

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

use super::connection::Storage;
use crate::error::Result;
use crate::search::{fold, match_score, similarity, CapabilityProbe};

/// Name of the SQL similarity function
pub const SIMILARITY_FUNCTION: &str = "similarity";

/// Name of the SQL score-normalization function
pub const MATCH_SCORE_FUNCTION: &str = "match_score";

/// Name of the SQL Unicode case-folding function; SQLite's own `lower()`
/// only folds ASCII
pub const FOLD_FUNCTION: &str = "fold";

/// Register `similarity()`, `match_score()` and `fold()` on a connection
pub fn register_trigram_functions(conn: &Connection) -> Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    conn.create_scalar_function(SIMILARITY_FUNCTION, 2, flags, |ctx| {
        let a: Option<String> = ctx.get(0)?;
        let b: Option<String> = ctx.get(1)?;
        Ok(match (a, b) {
            (Some(a), Some(b)) => similarity(&a, &b),
            _ => 0.0,
        })
    })?;

    conn.create_scalar_function(MATCH_SCORE_FUNCTION, 1, flags, |ctx| {
        let raw: Option<f64> = ctx.get(0)?;
        Ok(match_score(raw.unwrap_or(0.0)))
    })?;

    conn.create_scalar_function(FOLD_FUNCTION, 1, flags, |ctx| {
        let text: Option<String> = ctx.get(0)?;
        Ok(text.map(|t| fold(&t)))
    })?;

    tracing::debug!("Registered SQL trigram functions");
    Ok(())
}

/// Whether `err` is SQLite reporting an unknown function.
///
/// Bundled SQLite reports prepare errors with their input offset, which
/// rusqlite surfaces as `SqlInputError` rather than `SqliteFailure`.
fn is_missing_function(err: &rusqlite::Error) -> bool {
    let message = match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => message.as_str(),
        rusqlite::Error::SqlInputError { msg, .. } => msg.as_str(),
        _ => return false,
    };
    message.starts_with("no such function")
}

impl CapabilityProbe for Storage {
    fn probe_fuzzy_capability(&self) -> Result<bool> {
        self.with_connection(|conn| {
            let probe = format!("SELECT {}('', '')", SIMILARITY_FUNCTION);
            match conn.query_row(&probe, [], |row| row.get::<_, f64>(0)) {
                Ok(_) => Ok(true),
                Err(e) if is_missing_function(&e) => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
    }
}
