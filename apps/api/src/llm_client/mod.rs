/// LLM Client — the single point of entry for all completion calls in Pressroom.
///
/// ARCHITECTURAL RULE: No other module may call the Groq API directly.
/// All LLM interactions MUST go through this module, behind the `Completion` trait.
///
/// Model: llama-4-scout on Groq (hardcoded — do not make configurable to prevent drift)
///
/// This is a thin boundary: one outbound request per `complete()` call, no retries,
/// no caching. Retry and fallback policy belong to the workflow engine.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1";
/// The model used for all LLM calls in Pressroom.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";
const MAX_TOKENS: u32 = 1024;
const TEMPERATURE: f32 = 0.7;

/// Typed adapter failure. Every way a call can go wrong lands in exactly one class.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LlmError {
    /// Transient: network error, timeout, rate limit or 5xx.
    #[error("LLM service unavailable: {0}")]
    Unavailable(String),

    #[error("LLM credentials rejected (status {status})")]
    Unauthorized { status: u16 },

    /// Credentials missing, or the client could not be built.
    #[error("LLM client misconfigured: {0}")]
    Misconfigured(String),

    /// Malformed body, empty content, or an unexpected status.
    #[error("LLM returned an invalid response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    /// Network/timeout/5xx class — the next invocation may well succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, LlmError::Unavailable(_))
    }

    /// Missing or rejected credentials. Fatal until the operator fixes config.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            LlmError::Unauthorized { .. } | LlmError::Misconfigured(_)
        )
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            LlmError::InvalidResponse(e.to_string())
        } else if e.is_builder() {
            LlmError::Misconfigured(e.to_string())
        } else {
            // timeouts, refused connections, resets
            LlmError::Unavailable(e.to_string())
        }
    }
}

/// A system instruction plus the user message sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// The completion capability the workflow depends on.
///
/// `LlmClient` is the production implementation; tests swap in scripted fakes.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, prompt: &Prompt) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Extracts the text content of the first choice.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// The single LLM client used by all services in Pressroom.
/// Wraps the OpenAI-compatible chat completions endpoint exposed by Groq.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl LlmClient {
    pub fn new(api_key: String, base_url: &str, timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Misconfigured(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Makes a raw call to the chat completions API, returning the full response object.
    pub async fn call(&self, prompt: &Prompt) -> Result<ChatResponse, LlmError> {
        if self.api_key.trim().is_empty() {
            return Err(LlmError::Misconfigured("GROQ_API_KEY is empty".to_string()));
        }

        let request_body = ChatRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("LLM API returned {}: {}", status, body);
            return Err(classify_status(status, body));
        }

        let chat: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::InvalidResponse(format!("undecodable body: {e}")))?;

        if let Some(usage) = &chat.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(chat)
    }
}

#[async_trait]
impl Completion for LlmClient {
    async fn complete(&self, prompt: &Prompt) -> Result<String, LlmError> {
        let response = self.call(prompt).await?;

        match response.text() {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            _ => Err(LlmError::InvalidResponse(
                "LLM returned empty content".to_string(),
            )),
        }
    }
}

/// Maps a non-2xx status onto the adapter's failure classes.
fn classify_status(status: StatusCode, body: String) -> LlmError {
    let message = serde_json::from_str::<ApiError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::Unauthorized {
            status: status.as_u16(),
        },
        StatusCode::TOO_MANY_REQUESTS | StatusCode::REQUEST_TIMEOUT => {
            LlmError::Unavailable(format!("status {status}: {message}"))
        }
        s if s.is_server_error() => LlmError::Unavailable(format!("status {s}: {message}")),
        s => LlmError::InvalidResponse(format!("status {s}: {message}")),
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
