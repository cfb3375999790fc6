//! Interaction intake: the synchronous fast path for cheap actions and the
//! asynchronous queue path for content-bearing ones.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::common::ActionResult;
use crate::domains::scoring::{config, ApplyOutcome, Category};
use crate::kernel::{ProcessPostCommand, ValidateCommentCommand};
use crate::server::app::AppState;
use crate::server::types::{
    bad_request, not_found, ApiError, ProcessingResponse, SubmitActionRequest,
};

/// `POST /v1/submit_action` — score a cheap interaction synchronously.
///
/// Posts must go through `/v1/submit_post`; comments with a webhook URL are
/// routed through the queue for content validation.
pub async fn submit_action(
    State(state): State<AppState>,
    Json(request): Json<SubmitActionRequest>,
) -> Result<Response, ApiError> {
    let scoring_user = request
        .interactor_address
        .clone()
        .unwrap_or_else(|| request.creator_address.clone());
    let interaction_type = request.interaction.interaction_type.to_lowercase();

    info!(
        interaction_type = %interaction_type,
        user_id = %scoring_user,
        "interaction received"
    );

    let engine = state.deps.scoring_engine();

    let result = match interaction_type.as_str() {
        "post" => {
            return Ok(bad_request(
                "interactionType 'post' must be submitted via /v1/submit_post",
            ));
        }
        "comment" => {
            let Some(content) = request
                .interaction
                .data
                .as_deref()
                .filter(|d| !d.trim().is_empty())
            else {
                return Ok(bad_request("comment requires Interaction.data"));
            };

            if let Some(webhook_url) = &request.webhook_url {
                state
                    .queue
                    .enqueue(ValidateCommentCommand {
                        creator_address: request.creator_address.clone(),
                        interactor_address: request.interactor_address.clone(),
                        content: content.to_string(),
                        webhook_url: Some(webhook_url.clone()),
                    })
                    .await?;
                return Ok(
                    (StatusCode::ACCEPTED, Json(ProcessingResponse::comment())).into_response()
                );
            }

            // No webhook: validate inline and answer directly
            match state.deps.content_validator().check_gibberish(content).await {
                Some(reason) => {
                    ActionResult::rejected(reason, engine.final_score(&scoring_user).await?)
                }
                None => apply_to_result(
                    engine.apply(&scoring_user, Category::Comments, None).await?,
                ),
            }
        }
        "registration" | "verification" => {
            let (event_id, points) = if interaction_type == "registration" {
                ("REGISTRATION", config::POINTS_FOR_REGISTRATION)
            } else {
                ("VERIFICATION", config::POINTS_FOR_VERIFICATION)
            };
            let outcome = engine.apply_one_time(&scoring_user, event_id, points).await?;
            if outcome.accepted {
                ActionResult::approved(outcome.delta, "One-time bonus credited.", outcome.final_score)
            } else {
                ActionResult::rejected("one-time event already credited", outcome.final_score)
            }
        }
        other => {
            let Some(category) = Category::from_interaction_type(other) else {
                return Ok(bad_request(format!(
                    "interactionType '{}' not supported",
                    other
                )));
            };
            apply_to_result(engine.apply(&scoring_user, category, None).await?)
        }
    };

    Ok(Json(result).into_response())
}

fn apply_to_result(outcome: ApplyOutcome) -> ActionResult {
    match outcome {
        ApplyOutcome::Accepted {
            delta, final_score, ..
        } => ActionResult::approved(delta, "Interaction approved and scored.", final_score),
        ApplyOutcome::DailyLimited { final_score } => {
            ActionResult::rejected("daily limit", final_score)
        }
        ApplyOutcome::MonthlyCapped { final_score } => {
            ActionResult::approved(0.0, "capped", final_score)
        }
    }
}

/// `POST /v1/submit_post` — multipart post submission; queues a validation
/// job and returns immediately.
pub async fn submit_post(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut creator_address = None;
    let mut interactor_address = None;
    let mut data = None;
    let mut webhook_url = None;
    let mut post_id = None;
    let mut image: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("creatorAddress") => creator_address = Some(field.text().await?),
            Some("interactorAddress") => interactor_address = Some(field.text().await?),
            Some("data") => data = Some(field.text().await?),
            Some("webhookUrl") => webhook_url = Some(field.text().await?),
            Some("post_id") => post_id = Some(field.text().await?),
            Some("image") => image = Some(field.bytes().await?.to_vec()),
            _ => {}
        }
    }

    let Some(creator_address) = creator_address.filter(|v| !v.is_empty()) else {
        return Ok(bad_request("creatorAddress is required"));
    };
    let Some(data) = data.filter(|v| !v.trim().is_empty()) else {
        return Ok(bad_request("data is required"));
    };
    let Some(webhook_url) = webhook_url.filter(|v| !v.is_empty()) else {
        return Ok(bad_request("webhookUrl is required"));
    };
    let Some(post_id) = post_id.filter(|v| !v.is_empty()) else {
        return Ok(bad_request("post_id is required"));
    };

    let enqueued = state
        .queue
        .enqueue(ProcessPostCommand {
            creator_address: creator_address.clone(),
            interactor_address: interactor_address.filter(|v| !v.is_empty()),
            post_id: post_id.clone(),
            content: data,
            image_b64: image.map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes)),
            webhook_url,
        })
        .await?;

    info!(
        post_id = %post_id,
        creator = %creator_address,
        duplicate = !enqueued.is_created(),
        "post job queued"
    );

    Ok((StatusCode::ACCEPTED, Json(ProcessingResponse::post())).into_response())
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub user_id: String,
}

/// `DELETE /v1/delete/{post_id}?user_id=…` — remove a post and refund its
/// award exactly.
pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Result<Response, ApiError> {
    let index = state.deps.content_index();

    let Some(refund) = index.delete(&post_id, &params.user_id).await? else {
        return Ok(not_found("post not found"));
    };

    state
        .deps
        .scoring_engine()
        .refund_post(&params.user_id, refund.awarded_points, refund.awarded_at)
        .await?;

    Ok(Json(json!({
        "status": "deleted",
        "post_id": post_id,
        "user_id": params.user_id,
    }))
    .into_response())
}
