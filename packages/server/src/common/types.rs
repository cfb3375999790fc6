//! Wire types shared between the HTTP surface and the background workers.

use serde::{Deserialize, Serialize};

/// Result of a synchronous interaction, returned directly to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub ai_agent_response_approved: bool,
    pub significance_score: f64,
    pub reason: String,
    pub final_user_score: f64,
}

impl ActionResult {
    pub fn approved(delta: f64, reason: impl Into<String>, final_score: f64) -> Self {
        Self {
            ai_agent_response_approved: true,
            significance_score: round4(delta),
            reason: reason.into(),
            final_user_score: round4(final_score),
        }
    }

    pub fn rejected(reason: impl Into<String>, final_score: f64) -> Self {
        Self {
            ai_agent_response_approved: false,
            significance_score: 0.0,
            reason: reason.into(),
            final_user_score: round4(final_score),
        }
    }
}

/// Validation block of an asynchronous result, mirroring [`ActionResult`]
/// with the post identifier attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub ai_agent_response_approved: bool,
    pub significance_score: f64,
    pub reason: String,
    pub final_user_score: f64,
    #[serde(rename = "post_id", default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
}

/// Payload POSTed to the caller-supplied webhook when an asynchronous job
/// completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub creator_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interactor_address: Option<String>,
    pub validation: ValidationResult,
}

impl WebhookPayload {
    pub fn new(
        creator_address: impl Into<String>,
        interactor_address: Option<String>,
        post_id: Option<String>,
        result: ActionResult,
    ) -> Self {
        Self {
            creator_address: creator_address.into(),
            interactor_address,
            validation: ValidationResult {
                ai_agent_response_approved: result.ai_agent_response_approved,
                significance_score: result.significance_score,
                reason: result.reason,
                final_user_score: result.final_user_score,
                post_id,
            },
        }
    }
}

/// Round to four decimal places for wire responses.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_payload_uses_wire_field_names() {
        let payload = WebhookPayload::new(
            "0xabc",
            Some("0xdef".to_string()),
            Some("P1".to_string()),
            ActionResult::approved(1.55, "Content approved and scored.", 1.4091),
        );

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["creatorAddress"], "0xabc");
        assert_eq!(json["interactorAddress"], "0xdef");
        assert_eq!(json["validation"]["aiAgentResponseApproved"], true);
        assert_eq!(json["validation"]["significanceScore"], 1.55);
        assert_eq!(json["validation"]["post_id"], "P1");
    }

    #[test]
    fn rounding_is_four_places() {
        assert_eq!(round4(0.454545454), 0.4545);
        assert_eq!(round4(1.55), 1.55);
    }
}
