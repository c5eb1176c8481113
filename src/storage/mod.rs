//! Storage engine for Clubhub
//!
//! Handles SQLite database operations, WAL mode, schema management and the
//! SQL trigram functions used for database-side post ranking.

mod connection;
mod functions;
mod migrations;
pub mod post_search;
pub mod queries;

pub use connection::Storage;
pub use functions::{
    register_trigram_functions, FOLD_FUNCTION, MATCH_SCORE_FUNCTION, SIMILARITY_FUNCTION,
};
pub use migrations::SCHEMA_VERSION;
