//! HTTP server for posts, clubs and search

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::error::{ClubhubError, Result};
use crate::search::{parse_limit, FuzzyCapability, RankedSearch, SearchConfig};
use crate::storage::queries::{create_club, create_post, get_post, list_clubs, platform_stats};
use crate::storage::Storage;
use crate::types::{CreateClubInput, CreatePostInput, PostFilter, PostId};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    pub capability: Arc<FuzzyCapability>,
    pub search_config: Arc<SearchConfig>,
}

impl AppState {
    pub fn new(storage: Storage, capability: FuzzyCapability, search_config: SearchConfig) -> Self {
        Self {
            storage,
            capability: Arc::new(capability),
            search_config: Arc::new(search_config),
        }
    }
}

/// Query parameters of `GET /posts`; all raw so bad values are ignored, not rejected
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostListParams {
    pub q: Option<String>,
    pub club: Option<String>,
    #[serde(rename = "type")]
    pub post_type: Option<String>,
    pub is_form: Option<String>,
    pub event_like: Option<String>,
    pub limit: Option<String>,
}

impl PostListParams {
    pub fn filter(&self) -> PostFilter {
        PostFilter::from_params(
            self.club.as_deref(),
            self.post_type.as_deref(),
            self.is_form.as_deref(),
            self.event_like.as_deref(),
        )
    }
}

/// HTTP server
pub struct HttpServer {
    state: AppState,
    addr: SocketAddr,
}

impl HttpServer {
    pub fn new(state: AppState, port: u16) -> Self {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        Self { state, addr }
    }

    /// Build the router
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/stats", get(stats_handler))
            .route("/clubs", get(list_clubs_handler).post(create_club_handler))
            .route("/posts", get(list_posts_handler).post(create_post_handler))
            .route("/posts/:id", get(get_post_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Start the server
    pub async fn start(self) -> std::io::Result<()> {
        let app = Self::router(self.state);

        tracing::info!("HTTP server listening on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// Error wrapper turning crate errors into JSON responses
struct ApiError(ClubhubError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

impl From<ClubhubError> for ApiError {
    fn from(err: ClubhubError) -> Self {
        ApiError(err)
    }
}

/// SQLite calls block; keep them off the async workers
async fn blocking<T, F>(f: F) -> std::result::Result<T, ApiError>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError(ClubhubError::Internal(e.to_string())))?
        .map_err(ApiError)
}

/// Health check endpoint
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
        "fuzzy_search": state.capability.is_resolved().then(|| state.capability.is_available()),
    }))
}

async fn stats_handler(State(state): State<AppState>) -> std::result::Result<Response, ApiError> {
    let stats = blocking(move || state.storage.with_connection(platform_stats)).await?;
    Ok(Json(stats).into_response())
}

async fn list_clubs_handler(
    State(state): State<AppState>,
) -> std::result::Result<Response, ApiError> {
    let clubs = blocking(move || state.storage.with_connection(list_clubs)).await?;
    Ok(Json(clubs).into_response())
}

async fn create_club_handler(
    State(state): State<AppState>,
    Json(input): Json<CreateClubInput>,
) -> std::result::Result<Response, ApiError> {
    let club = blocking(move || {
        state
            .storage
            .with_transaction(|conn| create_club(conn, &input))
    })
    .await?;
    Ok((StatusCode::CREATED, Json(club)).into_response())
}

/// `GET /posts`: newest first, or ranked when `q` is present
async fn list_posts_handler(
    State(state): State<AppState>,
    Query(params): Query<PostListParams>,
) -> std::result::Result<Response, ApiError> {
    let results = blocking(move || {
        let filter = params.filter();
        let limit = parse_limit(params.limit.as_deref(), state.search_config.max_limit);
        let query = params.q.as_deref().unwrap_or("");
        RankedSearch::new(&state.storage, &state.capability, &state.search_config)
            .search(&filter, query, limit)
    })
    .await?;
    Ok(Json(results).into_response())
}

async fn get_post_handler(
    State(state): State<AppState>,
    Path(id): Path<PostId>,
) -> std::result::Result<Response, ApiError> {
    let post = blocking(move || state.storage.with_connection(|conn| get_post(conn, id))).await?;
    Ok(Json(post).into_response())
}

/// `POST /posts`: create and fan out subscriber notifications
async fn create_post_handler(
    State(state): State<AppState>,
    Json(input): Json<CreatePostInput>,
) -> std::result::Result<Response, ApiError> {
    let post = blocking(move || {
        state
            .storage
            .with_transaction(|conn| create_post(conn, &input))
    })
    .await?;
    Ok((StatusCode::CREATED, Json(post)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_filter() {
        let params = PostListParams {
            club: Some("3".into()),
            post_type: Some("event".into()),
            is_form: Some("yes".into()),
            ..Default::default()
        };
        let filter = params.filter();
        assert_eq!(filter.club_id, Some(3));
        assert_eq!(filter.is_form, None);
    }

    #[test]
    fn test_api_error_status() {
        let response = ApiError(ClubhubError::not_found("post", 1)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = ApiError(ClubhubError::InvalidInput("x".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
