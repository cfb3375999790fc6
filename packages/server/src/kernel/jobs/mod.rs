//! Durable background job processing.
//!
//! ```text
//! Intake ──enqueue──► jobs table ◄──claim (SKIP LOCKED)── JobWorker pool
//!                                         │
//!                                         ├─► handlers::execute
//!                                         │       ├─► validator / engine
//!                                         │       └─► enqueue webhook job
//!                                         └─► mark succeeded / failed
//! ```

pub mod commands;
pub mod handlers;
pub mod job;
pub mod queue;
pub mod worker;

pub use commands::{DeliverWebhookCommand, ProcessPostCommand, ValidateCommentCommand};
pub use job::{ErrorKind, Job, JobStatus};
pub use queue::{ClaimedJob, CommandMeta, EnqueueResult, PostgresJobQueue};
pub use worker::{spawn_workers, JobWorker, JobWorkerConfig};
