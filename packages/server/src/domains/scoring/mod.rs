//! Ledger, category configuration, and the scoring engine.

pub mod category;
pub mod config;
pub mod engine;
pub mod models;
pub mod store;

pub use category::Category;
pub use engine::{ApplyOutcome, OneTimeOutcome, PostScore, ScoringEngine};
pub use models::{InteractionOutcome, UserScore};
