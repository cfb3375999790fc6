//! Administrative triggers and read-only views over the ledger and the
//! latest published cohorts.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::common::round4;
use crate::domains::cohorts::{DailyAnalyzer, DailyCohorts};
use crate::domains::scoring::{store, Category};
use crate::server::app::AppState;
use crate::server::types::{bad_request, not_found, ApiError};

/// `POST /admin/run-daily-analysis` — trigger the cohort engine now.
pub async fn run_daily_analysis(State(state): State<AppState>) -> Result<Response, ApiError> {
    let analyzer = DailyAnalyzer::new(state.deps.db_pool.clone());

    let Some(cohorts) = analyzer.run().await? else {
        return Ok((
            StatusCode::CONFLICT,
            Json(json!({ "error": "daily analysis is already running" })),
        )
            .into_response());
    };

    let summary: serde_json::Map<String, serde_json::Value> = cohorts
        .cohorts
        .iter()
        .map(|(category, cohort)| {
            (
                category.as_str().to_string(),
                json!({
                    "qualified": cohort.qualified.len(),
                    "empathy": cohort.empathy.len(),
                }),
            )
        })
        .collect();

    Ok(Json(json!({
        "status": "completed",
        "run_date": cohorts.run_date,
        "categories": summary,
    }))
    .into_response())
}

/// `GET /admin/daily-summary` — the latest published cohorts in full.
pub async fn daily_summary(State(state): State<AppState>) -> Result<Response, ApiError> {
    match DailyCohorts::latest(&state.deps.db_pool).await? {
        Some(cohorts) => Ok(Json(cohorts).into_response()),
        None => Ok(not_found("no analysis has been published yet")),
    }
}

/// `GET /admin/user-activity/{user_id}` — one user's ledger state.
pub async fn user_activity(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Response, ApiError> {
    let Some(record) = store::fetch(&state.deps.db_pool, &user_id).await? else {
        return Ok(not_found("user not found"));
    };

    let now = Utc::now();
    let categories: serde_json::Map<String, serde_json::Value> = Category::ALL
        .iter()
        .map(|category| {
            (
                category.as_str().to_string(),
                json!({
                    "points": round4(record.points(*category)),
                    "monthly_cap": category.monthly_cap(),
                    "today_count": record.recent_count(*category, now),
                    "daily_limit": category.daily_limit(),
                    "lifetime_count": record.lifetime_count(*category),
                    "qualified_today": record.qualified(*category, now),
                }),
            )
        })
        .collect();

    Ok(Json(json!({
        "user_id": record.user_id,
        "normalized_score": round4(record.normalized_score()),
        "total_points": round4(record.total_points()),
        "one_time_points": round4(record.one_time_points),
        "one_time_events": record.one_time_events,
        "last_reset_date": record.last_reset_date,
        "last_active_date": record.last_active_date,
        "consecutive_activity_days": record.consecutive_activity_days,
        "historical_engagement_score": round4(record.historical_engagement_score),
        "categories": categories,
    }))
    .into_response())
}

/// `GET /api/rewards/{category}` — category metadata plus the latest cohorts.
pub async fn rewards_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Response, ApiError> {
    let Some(category) = Category::parse(&category) else {
        return Ok(bad_request(format!("unknown reward category '{}'", category)));
    };

    let latest = DailyCohorts::latest(&state.deps.db_pool).await?;
    let (run_date, cohort) = match &latest {
        Some(cohorts) => (
            Some(cohorts.run_date),
            cohorts.category(category).clone(),
        ),
        None => (None, Default::default()),
    };

    Ok(Json(json!({
        "category": category.as_str(),
        "name": category.display_name(),
        "description": category.description(),
        "daily_requirement": category.daily_limit(),
        "point_value": category.point_value(),
        "run_date": run_date,
        "qualified": cohort.qualified,
        "empathy": cohort.empathy,
    }))
    .into_response())
}
