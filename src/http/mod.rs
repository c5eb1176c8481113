//! REST API for Clubhub

mod server;

pub use server::{AppState, HttpServer, PostListParams};
