pub mod app;
pub mod routes;
pub mod types;

pub use app::{build_app, AppState};
