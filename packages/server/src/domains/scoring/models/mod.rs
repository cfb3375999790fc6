pub mod user_score;

pub use user_score::{InteractionOutcome, UserScore};
