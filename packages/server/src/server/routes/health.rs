use axum::extract::State;
use axum::{http::StatusCode, Json};
use serde::Serialize;

use crate::server::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    database: String,
}

/// Health check endpoint
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    // Check database connection
    let db_status = match sqlx::query("SELECT 1").execute(&state.deps.db_pool).await {
        Ok(_) => "ok",
        Err(_) => "error",
    };

    let overall_status = if db_status == "ok" { "healthy" } else { "unhealthy" };

    let status_code = if db_status == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: overall_status.to_string(),
            database: db_status.to_string(),
        }),
    )
}
