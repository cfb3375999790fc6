//! HTTP request and response bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Body of `POST /v1/submit_action`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitActionRequest {
    #[serde(rename = "creatorAddress")]
    pub creator_address: String,
    #[serde(rename = "interactorAddress")]
    pub interactor_address: Option<String>,
    #[serde(rename = "Interaction")]
    pub interaction: InteractionBody,
    #[serde(rename = "webhookUrl")]
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionBody {
    #[serde(rename = "interactionType")]
    pub interaction_type: String,
    pub data: Option<String>,
}

/// 202 body for accepted asynchronous submissions.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResponse {
    pub status: &'static str,
    pub message: &'static str,
}

impl ProcessingResponse {
    pub fn post() -> Self {
        Self {
            status: "processing",
            message: "Post accepted. Result will be sent to webhook.",
        }
    }

    pub fn comment() -> Self {
        Self {
            status: "processing",
            message: "Comment accepted. Result will be sent to webhook.",
        }
    }
}

/// Wrapper turning internal failures into a 500 JSON response.
pub struct ApiError(pub anyhow::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "internal server error" })),
        )
            .into_response()
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// 400 response with a message.
pub fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": message.into() })),
    )
        .into_response()
}

/// 404 response with a message.
pub fn not_found(message: impl Into<String>) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": message.into() })),
    )
        .into_response()
}
