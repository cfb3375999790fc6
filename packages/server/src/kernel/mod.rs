//! Infrastructure: dependency container, external-service clients, the job
//! queue, and scheduled tasks. No scoring or validation rules live here.

pub mod classifier;
pub mod deps;
pub mod embedding;
pub mod jobs;
pub mod quality;
pub mod scheduled_tasks;
pub mod traits;
pub mod webhook;

pub use classifier::HttpGibberishClassifier;
pub use deps::ServerDeps;
pub use embedding::EmbeddingService;
pub use jobs::{PostgresJobQueue, ProcessPostCommand, ValidateCommentCommand};
pub use quality::QualityScorer;
pub use scheduled_tasks::start_scheduler;
pub use traits::{
    BaseEmbeddingService, BaseGibberishModel, BaseQualityModel, GibberishPrediction,
    QualityAssessment,
};
pub use webhook::WebhookDispatcher;
