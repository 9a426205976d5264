use crate::config::Config;
use crate::pr_statement::workflow::PrWorkflow;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// `None` when no LLM credentials were configured at startup;
    /// the generation endpoint then answers 503.
    pub workflow: Option<PrWorkflow>,
    pub config: Config,
}
