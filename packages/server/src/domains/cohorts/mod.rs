//! Daily qualification analysis and published reward cohorts.

pub mod analyzer;
pub mod models;

pub use analyzer::{evaluate, DailyAnalyzer, UserDailyUpdate};
pub use models::{CategoryCohort, DailyCohorts};
