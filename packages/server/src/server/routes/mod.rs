pub mod admin;
pub mod health;
pub mod interactions;

pub use admin::{daily_summary, rewards_category, run_daily_analysis, user_activity};
pub use health::health_handler;
pub use interactions::{delete_post, submit_action, submit_post};
