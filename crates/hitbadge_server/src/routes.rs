//! Route table and handlers.
//!
//! # Responsibility
//! - Extract `(user, repo)` from paths and call the store or stats service.
//! - Serialize results as an SVG badge or JSON stats documents.
//!
//! # Invariants
//! - Path segments outside `[A-Za-z0-9_.-]+` are an unmatched route (404),
//!   including segments that fail to percent-decode to UTF-8.
//! - Storage calls run on the blocking pool, never on async workers.
//! - Every per-request failure becomes HTTP 500; handlers never panic the process.

use crate::badge::render_badge;
use crate::error::ApiError;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use hitbadge_core::{is_valid_identifier, CounterStore, StatsDocument, StatsService};
use log::{info, warn};
use serde_json::json;

const SVG_CONTENT_TYPE: &str = "image/svg+xml";
const NO_CACHE: &str = "max-age=0, no-cache, no-store, must-revalidate";
const NOT_FOUND_BODY: &str = "404 page not found\n";

/// Shared handler state: one store handle for the process lifetime.
#[derive(Debug, Clone)]
pub struct AppState {
    store: CounterStore,
    stats: StatsService,
}

impl AppState {
    pub fn new(store: CounterStore) -> Self {
        Self {
            stats: StatsService::new(store.clone()),
            store,
        }
    }
}

/// Builds the route table. Trailing-slash variants of stats routes are
/// registered explicitly.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/badge/:user/:file", get(serve_badge))
        .route("/stats/:user/:repo", get(serve_repo_stats))
        .route("/stats/:user/:repo/", get(serve_repo_stats))
        .route("/stats/:user", get(serve_user_stats))
        .route("/stats/:user/", get(serve_user_stats))
        .route("/stats", get(serve_all_stats))
        .route("/stats/", get(serve_all_stats))
        .fallback(not_found)
        .with_state(state)
}

async fn serve_badge(
    State(state): State<AppState>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Response {
    let Ok(Path((user, file))) = path else {
        return not_found().await;
    };
    let Some(repo) = file.strip_suffix(".svg").map(str::to_string) else {
        return not_found().await;
    };
    if !segments_match(&[user.as_str(), repo.as_str()]) {
        return not_found().await;
    }

    let store = state.store;
    let (task_user, task_repo) = (user.clone(), repo.clone());
    let result = run_blocking(move || store.increment_and_get(&task_user, &task_repo)).await;

    match result {
        Ok(count) => {
            info!("event=http_request route=badge status=200 user={user} repo={repo}");
            (
                [
                    (header::CONTENT_TYPE, SVG_CONTENT_TYPE),
                    (header::CACHE_CONTROL, NO_CACHE),
                ],
                render_badge(count),
            )
                .into_response()
        }
        Err(err) => {
            warn!("event=http_request route=badge status=500 user={user} repo={repo} error={err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "user": user, "repo": repo, "error": err.message() })),
            )
                .into_response()
        }
    }
}

async fn serve_repo_stats(
    State(state): State<AppState>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Response {
    let Ok(Path((user, repo))) = path else {
        return not_found().await;
    };
    if !segments_match(&[user.as_str(), repo.as_str()]) {
        return not_found().await;
    }
    let stats = state.stats;
    stats_response(
        "repo_stats",
        run_blocking(move || stats.repo_stats(&user, &repo)).await,
        StatsDocument::from,
    )
}

async fn serve_user_stats(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Response {
    let Ok(Path(user)) = path else {
        return not_found().await;
    };
    if !segments_match(&[user.as_str()]) {
        return not_found().await;
    }
    let stats = state.stats;
    stats_response(
        "user_stats",
        run_blocking(move || stats.user_stats(&user)).await,
        StatsDocument::from,
    )
}

async fn serve_all_stats(State(state): State<AppState>) -> Response {
    let stats = state.stats;
    stats_response(
        "all_stats",
        run_blocking(move || stats.all_stats()).await,
        StatsDocument::new,
    )
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
}

fn stats_response<T>(
    route: &str,
    result: Result<T, ApiError>,
    render: impl FnOnce(T) -> StatsDocument,
) -> Response {
    match result {
        Ok(view) => {
            info!("event=http_request route={route} status=200");
            Json(render(view)).into_response()
        }
        Err(err) => {
            warn!("event=http_request route={route} status=500 error={err}");
            err.into_response()
        }
    }
}

fn segments_match(segments: &[&str]) -> bool {
    segments.iter().all(|segment| is_valid_identifier(segment))
}

async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> hitbadge_core::StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| ApiError::Task(err.to_string()))?
        .map_err(ApiError::from)
}
