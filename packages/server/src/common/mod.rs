pub mod content_hash;
pub mod types;

pub use content_hash::content_hash;
pub use types::{round4, ActionResult, ValidationResult, WebhookPayload};
