//! Workflow Engine — the generate → evaluate → refine state machine.
//!
//! Flow: GENERATING → EVALUATING → ACCEPTED
//!                              ↘ REFINING → GENERATING (until MAX_ITERATIONS) → EXHAUSTED
//!       any adapter failure → ADAPTER_DOWN (fallback template)
//!
//! Each invocation owns a fresh `WorkflowState`; nothing is shared between requests
//! except the read-only `PrWorkflow` (LLM handle + settings). Dropping the returned
//! future abandons any in-flight call without touching shared state.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::llm_client::{Completion, LlmError, Prompt};
use crate::pr_statement::evaluator::{evaluate, Evaluation, Verdict};
use crate::pr_statement::fallback::fallback_statement;
use crate::pr_statement::prompts::build_generation_prompt;

pub const DEFAULT_MAX_ITERATIONS: u32 = 3;
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

const EMPTY_DRAFT_FEEDBACK: &str =
    "The previous draft was empty. Write a complete PR statement about the topic.";
const GENERIC_FEEDBACK: &str =
    "The reviewer was not satisfied. Make the statement clearer, more specific and more engaging.";

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    /// Upper bound on generate/evaluate rounds. Values below 1 are raised to 1.
    pub max_iterations: u32,
    /// Applied to every single LLM call.
    pub call_timeout: Duration,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

/// One generated candidate. Superseded by later drafts, never edited.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub text: String,
    /// 0-based round that produced it.
    pub iteration: u32,
    pub prompt: Prompt,
}

impl Draft {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    Accepted,
    MaxIterationsReached,
    AdapterUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Success,
    FallbackUsed,
}

/// Terminal result handed back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub statement: String,
    pub status: OutcomeStatus,
    /// Generate/evaluate rounds started, including a round cut short by a failure.
    pub iterations: u32,
    pub termination: TerminationReason,
    /// Reviewer score of the returned draft, when one was given.
    pub score: Option<f32>,
}

/// Running context of one invocation.
#[derive(Debug)]
struct WorkflowState {
    topic: String,
    iteration: u32,
    drafts: Vec<Draft>,
    last_evaluation: Option<Evaluation>,
    /// Oldest first.
    feedback_history: Vec<String>,
    termination: Option<TerminationReason>,
}

impl WorkflowState {
    fn new(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            iteration: 0,
            drafts: Vec::new(),
            last_evaluation: None,
            feedback_history: Vec::new(),
            termination: None,
        }
    }

    fn rounds_started(&self) -> u32 {
        self.iteration + 1
    }
}

#[derive(Debug)]
enum Phase {
    Generating,
    Evaluating(Draft),
    Refining(Evaluation),
    Done(Terminal),
}

#[derive(Debug)]
enum Terminal {
    Accepted(Draft),
    Exhausted,
    AdapterDown(LlmError),
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

/// The PR statement workflow. Cheap to clone; one instance serves all requests.
#[derive(Clone)]
pub struct PrWorkflow {
    llm: Arc<dyn Completion>,
    settings: WorkflowSettings,
}

impl PrWorkflow {
    pub fn new(llm: Arc<dyn Completion>, settings: WorkflowSettings) -> Self {
        let settings = WorkflowSettings {
            max_iterations: settings.max_iterations.max(1),
            ..settings
        };
        Self { llm, settings }
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Produces a PR statement for `topic`. Always returns an `Outcome`;
    /// the worst case is the fallback template.
    pub async fn generate_pr_statement(&self, topic: &str) -> Outcome {
        let span = info_span!("pr_statement", run_id = %Uuid::new_v4());
        self.run(topic).instrument(span).await
    }

    async fn run(&self, topic: &str) -> Outcome {
        info!("Starting PR statement generation for topic: {topic}");
        let mut state = WorkflowState::new(topic);
        let mut phase = Phase::Generating;

        loop {
            phase = match phase {
                Phase::Generating => self.generate(&mut state).await,
                Phase::Evaluating(draft) => self.evaluate(&mut state, draft).await,
                Phase::Refining(evaluation) => self.refine(&mut state, evaluation),
                Phase::Done(terminal) => return self.finish(state, terminal),
            };
        }
    }

    async fn generate(&self, state: &mut WorkflowState) -> Phase {
        let prompt = build_generation_prompt(&state.topic, &state.feedback_history);
        debug!(
            "Round {}/{}: generating draft",
            state.rounds_started(),
            self.settings.max_iterations
        );

        match self.bounded(self.llm.complete(&prompt)).await {
            Ok(text) => {
                let draft = Draft {
                    text,
                    iteration: state.iteration,
                    prompt,
                };
                state.drafts.push(draft.clone());
                Phase::Evaluating(draft)
            }
            Err(e) => {
                warn!("Draft generation failed: {e}");
                Phase::Done(Terminal::AdapterDown(e))
            }
        }
    }

    async fn evaluate(&self, state: &mut WorkflowState, draft: Draft) -> Phase {
        // Blank output is never accepted, whatever a reviewer would say.
        if draft.is_blank() {
            warn!("Round {}: draft is empty, refining", state.rounds_started());
            return Phase::Refining(Evaluation::refine(EMPTY_DRAFT_FEEDBACK));
        }

        let evaluation = match self
            .bounded(evaluate(self.llm.as_ref(), &draft.text, &state.topic))
            .await
        {
            Ok(evaluation) => evaluation,
            Err(e) => {
                // A failed review cannot be trusted either way.
                warn!("Draft evaluation failed: {e}");
                return Phase::Done(Terminal::AdapterDown(e));
            }
        };

        info!(
            "Round {}: verdict={:?}, score={:?}",
            state.rounds_started(),
            evaluation.verdict,
            evaluation.score
        );
        state.last_evaluation = Some(evaluation.clone());

        match evaluation.verdict {
            Verdict::Accept => Phase::Done(Terminal::Accepted(draft)),
            Verdict::Refine => Phase::Refining(evaluation),
        }
    }

    fn refine(&self, state: &mut WorkflowState, evaluation: Evaluation) -> Phase {
        let feedback = if evaluation.feedback.trim().is_empty() {
            GENERIC_FEEDBACK.to_string()
        } else {
            evaluation.feedback
        };
        state.feedback_history.push(feedback);
        state.iteration += 1;

        if state.iteration >= self.settings.max_iterations {
            Phase::Done(Terminal::Exhausted)
        } else {
            Phase::Generating
        }
    }

    fn finish(&self, mut state: WorkflowState, terminal: Terminal) -> Outcome {
        let outcome = match terminal {
            Terminal::Accepted(draft) => Outcome {
                statement: draft.text,
                status: OutcomeStatus::Success,
                iterations: draft.iteration + 1,
                termination: TerminationReason::Accepted,
                score: state.last_evaluation.as_ref().and_then(|e| e.score),
            },
            Terminal::Exhausted => {
                let rounds = state.iteration;
                match state.drafts.iter().rev().find(|d| !d.is_blank()) {
                    Some(draft) => Outcome {
                        statement: draft.text.clone(),
                        status: OutcomeStatus::Success,
                        iterations: rounds,
                        termination: TerminationReason::MaxIterationsReached,
                        score: state
                            .last_evaluation
                            .as_ref()
                            .filter(|_| state.drafts.last() == Some(draft))
                            .and_then(|e| e.score),
                    },
                    None => {
                        warn!("Every draft was empty, using fallback statement");
                        Outcome {
                            statement: fallback_statement(&state.topic),
                            status: OutcomeStatus::FallbackUsed,
                            iterations: rounds,
                            termination: TerminationReason::MaxIterationsReached,
                            score: None,
                        }
                    }
                }
            }
            Terminal::AdapterDown(e) => {
                warn!(
                    "LLM adapter unavailable ({}), using fallback statement",
                    if e.is_configuration() {
                        "configuration"
                    } else if e.is_transient() {
                        "transient"
                    } else {
                        "malformed response"
                    }
                );
                Outcome {
                    statement: fallback_statement(&state.topic),
                    status: OutcomeStatus::FallbackUsed,
                    iterations: state.rounds_started(),
                    termination: TerminationReason::AdapterUnavailable,
                    score: None,
                }
            }
        };

        state.termination = Some(outcome.termination);
        info!(
            "PR statement generation finished: termination={:?}, status={:?}, iterations={}, feedback_rounds={}",
            state.termination,
            outcome.status,
            outcome.iterations,
            state.feedback_history.len()
        );
        outcome
    }

    /// Applies the per-call timeout. Elapsing counts as `Unavailable`.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, LlmError>>,
    ) -> Result<T, LlmError> {
        match tokio::time::timeout(self.settings.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Unavailable(format!(
                "LLM call timed out after {:?}",
                self.settings.call_timeout
            ))),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
