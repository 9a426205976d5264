//! Axum route handlers for the PR statement API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{AppError, AppJson};
use crate::pr_statement::workflow::{Outcome, OutcomeStatus, TerminationReason};
use crate::state::AppState;

/// Longest accepted topic, in characters.
pub const MAX_TOPIC_LEN: usize = 500;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PrStatementRequest {
    pub topic: String,
}

#[derive(Debug, Serialize)]
pub struct PrStatementResponse {
    pub pr_statement: String,
    /// "success" | "fallback"
    pub status: &'static str,
    pub message: String,
}

impl From<Outcome> for PrStatementResponse {
    fn from(outcome: Outcome) -> Self {
        let status = match outcome.status {
            OutcomeStatus::Success => "success",
            OutcomeStatus::FallbackUsed => "fallback",
        };

        let message = match (outcome.termination, outcome.status) {
            (TerminationReason::Accepted, _) => "PR statement generated successfully".to_string(),
            (TerminationReason::MaxIterationsReached, OutcomeStatus::Success) => format!(
                "PR statement generated after {} refinement rounds without final approval",
                outcome.iterations
            ),
            (TerminationReason::MaxIterationsReached, OutcomeStatus::FallbackUsed) => {
                "The language model produced no usable draft; returned a template statement"
                    .to_string()
            }
            (TerminationReason::AdapterUnavailable, _) => {
                "The language model is unavailable; returned a template statement".to_string()
            }
        };

        Self {
            pr_statement: outcome.statement,
            status,
            message,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/generate-pr-statement
///
/// Runs the generate → evaluate → refine workflow for one topic.
/// Never fails once the topic is valid and the service is configured: LLM outages
/// degrade to a template statement with `status = "fallback"`.
pub async fn handle_generate_pr_statement(
    State(state): State<AppState>,
    AppJson(request): AppJson<PrStatementRequest>,
) -> Result<Json<PrStatementResponse>, AppError> {
    let topic = validate_topic(&request.topic)?;

    let workflow = state.workflow.as_ref().ok_or_else(|| {
        AppError::ServiceUnavailable("PR Generator Service is not available".to_string())
    })?;

    info!("Received PR statement generation request for topic: {topic}");
    let outcome = workflow.generate_pr_statement(topic).await;
    info!(
        "PR statement ready: status={:?}, iterations={}, score={:?}",
        outcome.status, outcome.iterations, outcome.score
    );

    Ok(Json(outcome.into()))
}

/// Returns the trimmed topic, or a 422 when it is blank or too long.
fn validate_topic(topic: &str) -> Result<&str, AppError> {
    if topic.trim().is_empty() {
        return Err(AppError::UnprocessableEntity(
            "topic must not be empty".to_string(),
        ));
    }

    let len = topic.chars().count();
    if len > MAX_TOPIC_LEN {
        return Err(AppError::UnprocessableEntity(format!(
            "topic must be at most {MAX_TOPIC_LEN} characters (got {len})"
        )));
    }

    Ok(topic.trim())
}
