//! Command execution for the worker pool.
//!
//! Every handler ends by reporting its outcome through the webhook queue, so
//! a job "succeeds" whenever a result (approval or rejection) was produced
//! and handed to the dispatcher. Only infrastructure failures propagate as
//! job failures and retry.

use anyhow::{anyhow, Error, Result};
use base64::Engine;
use chrono::Utc;
use tracing::{error, info, warn};

use super::commands::{DeliverWebhookCommand, ProcessPostCommand, ValidateCommentCommand};
use super::job::ErrorKind;
use super::queue::{ClaimedJob, PostgresJobQueue};
use crate::common::{ActionResult, WebhookPayload};
use crate::domains::content::{NewPost, Validation};
use crate::domains::scoring::{ApplyOutcome, Category, PostScore};
use crate::kernel::ServerDeps;

/// A failed job, tagged with how the queue should handle it.
#[derive(Debug)]
pub struct JobFailure {
    pub kind: ErrorKind,
    pub error: Error,
}

impl JobFailure {
    fn retryable(error: Error) -> Self {
        Self {
            kind: ErrorKind::Retryable,
            error,
        }
    }

    fn non_retryable(error: Error) -> Self {
        Self {
            kind: ErrorKind::NonRetryable,
            error,
        }
    }
}

/// Dispatch one claimed job by command type.
pub async fn execute(
    deps: &ServerDeps,
    queue: &PostgresJobQueue,
    claimed: &ClaimedJob,
) -> Result<(), JobFailure> {
    match claimed.command_type() {
        ProcessPostCommand::COMMAND_TYPE => process_post(deps, queue, claimed).await,
        ValidateCommentCommand::COMMAND_TYPE => validate_comment(deps, queue, claimed).await,
        DeliverWebhookCommand::COMMAND_TYPE => deliver_webhook(deps, claimed).await,
        other => Err(JobFailure::non_retryable(anyhow!(
            "unknown command type: {}",
            other
        ))),
    }
}

/// Enqueue the result for webhook delivery.
async fn report(
    queue: &PostgresJobQueue,
    webhook_url: &str,
    payload: WebhookPayload,
) -> Result<(), JobFailure> {
    let payload = serde_json::to_value(&payload)
        .map_err(|e| JobFailure::non_retryable(anyhow!("failed to serialize payload: {}", e)))?;
    queue
        .enqueue(DeliverWebhookCommand {
            webhook_url: webhook_url.to_string(),
            payload,
        })
        .await
        .map_err(JobFailure::retryable)?;
    Ok(())
}

async fn process_post(
    deps: &ServerDeps,
    queue: &PostgresJobQueue,
    claimed: &ClaimedJob,
) -> Result<(), JobFailure> {
    let cmd: ProcessPostCommand = claimed.deserialize().map_err(JobFailure::non_retryable)?;
    let scoring_user = cmd
        .interactor_address
        .clone()
        .unwrap_or_else(|| cmd.creator_address.clone());

    info!(post_id = %cmd.post_id, user_id = %scoring_user, "processing post job");

    let engine = deps.scoring_engine();
    let validator = deps.content_validator();

    let respond = |result: ActionResult| {
        WebhookPayload::new(
            cmd.creator_address.clone(),
            cmd.interactor_address.clone(),
            Some(cmd.post_id.clone()),
            result,
        )
    };

    let image = match &cmd.image_b64 {
        Some(encoded) => match base64::engine::general_purpose::STANDARD.decode(encoded) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(post_id = %cmd.post_id, error = %e, "rejecting post with undecodable image");
                let result = ActionResult::rejected("invalid image encoding", 0.0);
                return report(queue, &cmd.webhook_url, respond(result)).await;
            }
        },
        None => None,
    };

    // Cheap read-only pre-check so a limited user's post never reaches the
    // index; the engine re-checks authoritatively under the row lock.
    if let Some(record) = engine
        .user_record(&scoring_user)
        .await
        .map_err(JobFailure::retryable)?
    {
        if record.recent_count(Category::Posts, Utc::now()) >= Category::Posts.daily_limit() {
            let result = ActionResult::rejected("daily limit", record.normalized_score());
            return report(queue, &cmd.webhook_url, respond(result)).await;
        }
    }

    let post = NewPost {
        post_id: cmd.post_id.clone(),
        user_id: scoring_user.clone(),
        content: cmd.content.clone(),
        image,
    };

    let validation = match validator.validate(&post).await {
        Ok(validation) => validation,
        Err(e) => {
            // Vector store / embedding infrastructure failure: retry the job;
            // on the last attempt report the outage and dead-letter.
            if !claimed.last_attempt() {
                return Err(JobFailure::retryable(e));
            }
            let final_score = engine.final_score(&scoring_user).await.unwrap_or(0.0);
            let result = ActionResult::rejected("validation unavailable", final_score);
            report(queue, &cmd.webhook_url, respond(result)).await?;
            return Err(JobFailure::non_retryable(e));
        }
    };

    let result = match validation {
        Validation::Rejected { reason } => {
            let final_score = engine
                .final_score(&scoring_user)
                .await
                .map_err(JobFailure::retryable)?;
            ActionResult::rejected(reason, final_score)
        }
        Validation::Accepted {
            quality,
            quality_degraded,
            originality,
        } => {
            let outcome = engine
                .apply(
                    &scoring_user,
                    Category::Posts,
                    Some(PostScore {
                        quality,
                        originality,
                    }),
                )
                .await
                .map_err(JobFailure::retryable)?;

            match outcome {
                ApplyOutcome::Accepted {
                    delta,
                    final_score,
                    awarded_at,
                } => {
                    // Persist the award on the post for an exact refund later;
                    // losing this write only degrades the refund to zero.
                    if let Err(e) = validator
                        .index()
                        .update_awarded(&cmd.post_id, &scoring_user, delta, awarded_at)
                        .await
                    {
                        warn!(post_id = %cmd.post_id, error = %e, "failed to record awarded points");
                    }
                    let reason = if quality_degraded {
                        "Content approved and scored (quality rating degraded)."
                    } else {
                        "Content approved and scored."
                    };
                    ActionResult::approved(delta, reason, final_score)
                }
                ApplyOutcome::DailyLimited { final_score } => {
                    // Lost a race with a concurrent submission; a rejected
                    // post leaves no trace in the index.
                    if let Err(e) = validator.index().delete(&cmd.post_id, &scoring_user).await {
                        warn!(post_id = %cmd.post_id, error = %e, "failed to remove limited post");
                    }
                    ActionResult::rejected("daily limit", final_score)
                }
                ApplyOutcome::MonthlyCapped { final_score } => {
                    ActionResult::approved(0.0, "capped", final_score)
                }
            }
        }
    };

    report(queue, &cmd.webhook_url, respond(result)).await
}

async fn validate_comment(
    deps: &ServerDeps,
    queue: &PostgresJobQueue,
    claimed: &ClaimedJob,
) -> Result<(), JobFailure> {
    let cmd: ValidateCommentCommand = claimed.deserialize().map_err(JobFailure::non_retryable)?;
    let scoring_user = cmd
        .interactor_address
        .clone()
        .unwrap_or_else(|| cmd.creator_address.clone());

    info!(user_id = %scoring_user, "processing comment job");

    let engine = deps.scoring_engine();
    let validator = deps.content_validator();

    let result = match validator.check_gibberish(&cmd.content).await {
        Some(reason) => {
            let final_score = engine
                .final_score(&scoring_user)
                .await
                .map_err(JobFailure::retryable)?;
            ActionResult::rejected(reason, final_score)
        }
        None => {
            let outcome = engine
                .apply(&scoring_user, Category::Comments, None)
                .await
                .map_err(JobFailure::retryable)?;
            match outcome {
                ApplyOutcome::Accepted {
                    delta, final_score, ..
                } => ActionResult::approved(delta, "Comment approved and scored.", final_score),
                ApplyOutcome::DailyLimited { final_score } => {
                    ActionResult::rejected("daily limit", final_score)
                }
                ApplyOutcome::MonthlyCapped { final_score } => {
                    ActionResult::approved(0.0, "capped", final_score)
                }
            }
        }
    };

    if let Some(url) = &cmd.webhook_url {
        let payload = WebhookPayload::new(
            cmd.creator_address.clone(),
            cmd.interactor_address.clone(),
            None,
            result,
        );
        report(queue, url, payload).await?;
    }

    Ok(())
}

async fn deliver_webhook(deps: &ServerDeps, claimed: &ClaimedJob) -> Result<(), JobFailure> {
    let cmd: DeliverWebhookCommand = claimed.deserialize().map_err(JobFailure::non_retryable)?;

    // The dispatcher retries internally; a final failure is logged and the
    // result dropped, never re-scored.
    if let Err(e) = deps
        .webhook_dispatcher
        .deliver(&cmd.webhook_url, &cmd.payload)
        .await
    {
        error!(url = %cmd.webhook_url, error = %e, "dropping undeliverable webhook");
    }

    Ok(())
}
