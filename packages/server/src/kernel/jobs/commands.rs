//! Background commands carried by the job queue.

use serde::{Deserialize, Serialize};

use super::queue::CommandMeta;

/// Validate, score, and report an asynchronous post submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessPostCommand {
    pub creator_address: String,
    pub interactor_address: Option<String>,
    pub post_id: String,
    pub content: String,
    /// Base64-encoded image bytes, when the post carries one
    pub image_b64: Option<String>,
    pub webhook_url: String,
}

impl ProcessPostCommand {
    pub const COMMAND_TYPE: &'static str = "post:process";
}

impl CommandMeta for ProcessPostCommand {
    fn command_type(&self) -> &'static str {
        Self::COMMAND_TYPE
    }

    /// One live job per caller-chosen post id; redeliveries and duplicate
    /// submissions collapse onto it.
    fn idempotency_key(&self) -> Option<String> {
        Some(format!("post:{}", self.post_id))
    }
}

/// Gibberish-check and score a comment, reporting through the webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateCommentCommand {
    pub creator_address: String,
    pub interactor_address: Option<String>,
    pub content: String,
    pub webhook_url: Option<String>,
}

impl ValidateCommentCommand {
    pub const COMMAND_TYPE: &'static str = "comment:validate";
}

impl CommandMeta for ValidateCommentCommand {
    fn command_type(&self) -> &'static str {
        Self::COMMAND_TYPE
    }
}

/// Deliver a finished result to the caller's webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliverWebhookCommand {
    pub webhook_url: String,
    pub payload: serde_json::Value,
}

impl DeliverWebhookCommand {
    pub const COMMAND_TYPE: &'static str = "webhook:deliver";
}

impl CommandMeta for DeliverWebhookCommand {
    fn command_type(&self) -> &'static str {
        Self::COMMAND_TYPE
    }

    /// The dispatcher owns the retry policy; the job itself never re-runs.
    fn max_retries(&self) -> i32 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_commands_share_an_idempotency_key_per_post() {
        let a = ProcessPostCommand {
            creator_address: "0xabc".into(),
            interactor_address: None,
            post_id: "P1".into(),
            content: "hello".into(),
            image_b64: None,
            webhook_url: "https://example.com/hook".into(),
        };
        let b = ProcessPostCommand {
            content: "different".into(),
            ..a.clone()
        };
        assert_eq!(a.idempotency_key(), b.idempotency_key());
        assert_eq!(a.idempotency_key(), Some("post:P1".to_string()));
    }

    #[test]
    fn command_payloads_round_trip() {
        let cmd = ValidateCommentCommand {
            creator_address: "0xabc".into(),
            interactor_address: Some("0xdef".into()),
            content: "a comment".into(),
            webhook_url: None,
        };
        let value = serde_json::to_value(&cmd).unwrap();
        let back: ValidateCommentCommand = serde_json::from_value(value).unwrap();
        assert_eq!(back.creator_address, "0xabc");
        assert_eq!(back.interactor_address.as_deref(), Some("0xdef"));
    }
}
