mod config;
mod errors;
mod llm_client;
mod pr_statement;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::errors::panic_response;
use crate::llm_client::LlmClient;
use crate::pr_statement::workflow::PrWorkflow;
use crate::routes::{build_cors, build_router};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Pressroom API v{}", env!("CARGO_PKG_VERSION"));

    let workflow = build_workflow(&config);

    let state = AppState {
        workflow,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors(&config)?);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down Pressroom API");
    Ok(())
}

/// Wires the LLM client into the workflow. Returns `None` when credentials are
/// missing so the service can still answer health checks.
fn build_workflow(config: &Config) -> Option<PrWorkflow> {
    let Some(api_key) = config.groq_api_key.clone() else {
        warn!("GROQ_API_KEY is not set; PR statement generation is unavailable");
        return None;
    };

    match LlmClient::new(api_key, &config.groq_api_url, config.llm_timeout) {
        Ok(llm) => {
            let workflow = PrWorkflow::new(Arc::new(llm), config.workflow_settings());
            info!(
                "LLM client initialized (model: {}, max_iterations: {}, timeout: {:?})",
                llm_client::MODEL,
                workflow.settings().max_iterations,
                workflow.settings().call_timeout
            );
            Some(workflow)
        }
        Err(e) => {
            error!("Failed to initialize LLM client: {e}");
            None
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
