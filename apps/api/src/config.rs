use std::time::Duration;

use anyhow::{ensure, Context, Result};

use crate::llm_client::DEFAULT_API_URL;
use crate::pr_statement::workflow::{WorkflowSettings, DEFAULT_MAX_ITERATIONS};

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:8501,http://127.0.0.1:8501";

/// Application configuration loaded from environment variables.
/// Read once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// `None` leaves the service up but the generation endpoint unavailable.
    pub groq_api_key: Option<String>,
    pub groq_api_url: String,
    pub llm_timeout: Duration,
    pub max_iterations: u32,
    pub cors_allowed_origins: Vec<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let llm_timeout_secs = parse_or(get("LLM_TIMEOUT_SECS"), 30_u64)
            .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?;
        ensure!(llm_timeout_secs >= 1, "LLM_TIMEOUT_SECS must be at least 1");

        let max_iterations = parse_or(get("MAX_ITERATIONS"), DEFAULT_MAX_ITERATIONS)
            .context("MAX_ITERATIONS must be a positive integer")?;
        ensure!(max_iterations >= 1, "MAX_ITERATIONS must be at least 1");

        Ok(Config {
            groq_api_key: get("GROQ_API_KEY"),
            groq_api_url: get("GROQ_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            llm_timeout: Duration::from_secs(llm_timeout_secs),
            max_iterations,
            cors_allowed_origins: get("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect(),
            port: parse_or(get("PORT"), 8000_u16).context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            max_iterations: self.max_iterations,
            call_timeout: self.llm_timeout,
        }
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => Ok(v.trim().parse::<T>()?),
        None => Ok(default),
    }
}
