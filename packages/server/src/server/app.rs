//! Application setup and router configuration.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::kernel::{PostgresJobQueue, ServerDeps};
use crate::server::routes::{
    daily_summary, delete_post, health_handler, rewards_category, run_daily_analysis,
    submit_action, submit_post, user_activity,
};

/// Image uploads are capped at 10 MiB.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
    pub queue: Arc<PostgresJobQueue>,
}

/// Build the Axum application router
pub fn build_app(deps: Arc<ServerDeps>, queue: Arc<PostgresJobQueue>) -> Router {
    let state = AppState { deps, queue };

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/v1/submit_action", post(submit_action))
        .route("/v1/submit_post", post(submit_post))
        .route("/v1/delete/:post_id", delete(delete_post))
        .route("/admin/run-daily-analysis", post(run_daily_analysis))
        .route("/admin/daily-summary", get(daily_summary))
        .route("/admin/user-activity/:user_id", get(user_activity))
        .route("/api/rewards/:category", get(rewards_category))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
