use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use background_service::FetchEngine;
use serde::{Deserialize, Serialize};
use serde_json::json;
use stats_core::validate_subreddit_name;
use std::sync::Arc;
use tracing::{debug, info};

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<FetchEngine>,
}

impl AppState {
    pub fn new(engine: Arc<FetchEngine>) -> Self {
        Self { engine }
    }
}

#[derive(Debug, Deserialize)]
pub struct PostsQuery {
    subreddits: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FetchResponse {
    pub message: String,
    pub subreddits: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TopPostResponse {
    pub title: String,
    pub author: String,
    #[serde(rename = "UpVotes")]
    pub up_votes: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUserResponse {
    pub user_name: String,
    pub post_count: u64,
}

pub fn build_router(engine: Arc<FetchEngine>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/reddit/posts", get(fetch_posts))
        .route("/api/reddit/top-post", get(top_post))
        .route("/api/reddit/top-user", get(top_user))
        .with_state(AppState::new(engine))
}

/// Split a comma-separated list into trimmed, non-empty, de-duplicated names,
/// keeping first-occurrence order. Any entry that is not a valid subreddit
/// name rejects the whole request.
pub fn parse_subreddits(raw: Option<&str>) -> ApiResult<Vec<String>> {
    let raw = raw.unwrap_or_default();

    let mut names: Vec<String> = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        validate_subreddit_name(name).map_err(|_| {
            ApiError::Validation(format!("'{}' is not a valid subreddit name", name))
        })?;
        if !names.iter().any(|seen| seen == name) {
            names.push(name.to_string());
        }
    }

    if names.is_empty() {
        return Err(ApiError::Validation(
            "query parameter 'subreddits' must name at least one subreddit".to_string(),
        ));
    }
    Ok(names)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

async fn fetch_posts(
    State(state): State<AppState>,
    Query(query): Query<PostsQuery>,
) -> ApiResult<Json<FetchResponse>> {
    let subreddits = parse_subreddits(query.subreddits.as_deref()).map_err(|e| {
        debug!("Rejected fetch request: {}", e);
        e
    })?;

    info!(count = subreddits.len(), "Fetch triggered over HTTP");
    state.engine.fetch_all(&subreddits).await?;

    Ok(Json(FetchResponse {
        message: format!("Fetched hot posts from {} subreddit(s)", subreddits.len()),
        subreddits,
    }))
}

async fn top_post(State(state): State<AppState>) -> ApiResult<Json<TopPostResponse>> {
    let post = state
        .engine
        .top_post()
        .ok_or(ApiError::NotFound("no posts have been fetched yet"))?;

    Ok(Json(TopPostResponse {
        title: post.title,
        author: post.author,
        up_votes: post.upvotes,
    }))
}

async fn top_user(State(state): State<AppState>) -> ApiResult<Json<TopUserResponse>> {
    let author = state
        .engine
        .top_author()
        .ok_or(ApiError::NotFound("no authors have been counted yet"))?;

    Ok(Json(TopUserResponse {
        user_name: author.name,
        post_count: author.post_count,
    }))
}
