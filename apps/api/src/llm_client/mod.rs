//! LLM transport — the single point of entry for all provider calls in CopyGen.
//!
//! ARCHITECTURAL RULE: no other module may call the Groq API directly.
//! The orchestrator sees only the `LlmTransport` trait, which lets tests
//! substitute a stub without any network access.
//!
//! Groq speaks the OpenAI-compatible chat completions protocol.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Per-call HTTP timeout. The orchestrator applies its own end-to-end
/// deadline on top of this.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Model invocation parameters. Defaults match the generation contract:
/// temperature 0.8, max tokens 2048.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ModelConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_tokens: 2048,
            temperature: 0.8,
        }
    }
}

/// The literal text returned by the provider plus call metadata.
/// Consumed exactly once by the response parser.
#[derive(Debug, Clone)]
pub struct RawModelOutput {
    pub text: String,
    pub model_name: String,
    pub latency_ms: u64,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// Transport failures, split by whether a retry can succeed.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Timeout, 5xx, or provider rate limit — worth retrying.
    #[error("transient transport failure: {0}")]
    Transient(String),

    /// Auth or malformed request — retrying cannot help.
    #[error("permanent transport failure: {0}")]
    Permanent(String),
}

/// The seam between the orchestrator and the outside world.
/// Carried in `AppState` as `Arc<dyn LlmTransport>`; stubbed in tests.
#[async_trait]
pub trait LlmTransport: Send + Sync {
    async fn send(
        &self,
        system_instruction: &str,
        user_instruction: &str,
        config: &ModelConfig,
    ) -> Result<RawModelOutput, TransportError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Groq wire types (OpenAI-compatible)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    response_format: ResponseFormat<'a>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Groq client
// ────────────────────────────────────────────────────────────────────────────

/// Production transport against Groq's OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct GroqClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GroqClient {
    pub fn new(api_key: String, base_url: String) -> Result<Self, anyhow::Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key,
            base_url,
        })
    }
}

#[async_trait]
impl LlmTransport for GroqClient {
    async fn send(
        &self,
        system_instruction: &str,
        user_instruction: &str,
        config: &ModelConfig,
    ) -> Result<RawModelOutput, TransportError> {
        let request_body = ChatRequest {
            model: &config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_instruction,
                },
                ChatMessage {
                    role: "user",
                    content: user_instruction,
                },
            ],
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let start = Instant::now();

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                // Connect failures and timeouts are worth a retry.
                TransportError::Transient(format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            let detail = format!("provider returned {status}: {message}");
            return if status.as_u16() == 429 || status.is_server_error() {
                Err(TransportError::Transient(detail))
            } else {
                Err(TransportError::Permanent(detail))
            };
        }

        let latency_ms = start.elapsed().as_millis() as u64;

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| TransportError::Transient(format!("response body unreadable: {e}")))?;

        let text = chat
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();
        let (prompt_tokens, completion_tokens) = chat
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));

        debug!(
            "provider responded: tokens={prompt_tokens}+{completion_tokens} latency={latency_ms}ms"
        );

        Ok(RawModelOutput {
            text,
            model_name: chat.model,
            latency_ms,
            prompt_tokens,
            completion_tokens,
        })
    }
}
