//! Completion client — the single point of entry for calls to the external
//! text-generation service.
//!
//! ARCHITECTURAL RULE: no other module may talk to the service directly,
//! and no retry happens at this layer. A transport failure or a non-2xx
//! status is a hard failure after one attempt; retry policy belongs to
//! `analysis::orchestrator`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub mod stream;

use crate::completion::stream::drain_event_stream;
use crate::config::Config;

/// Chat-completions endpoint path on the completion host.
pub const COMPLETION_PATH: &str = "/v1/chat-completions";
/// The model requested for every call. Intentionally hardcoded so batch
/// runs stay comparable across a corpus.
pub const MODEL: &str = "hcx-003";
/// Wall-clock deadline for one request, including the stream drain.
pub const REQUEST_DEADLINE_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response stream exceeded the {0}s deadline")]
    Deadline(u64),

    #[error("service returned an empty transcript")]
    Empty,
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: &'static str,
    pub content: String,
}

/// Request body for the chat-completions endpoint (camelCase wire form).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub top_p: f64,
    pub top_k: u32,
    pub max_tokens: u32,
    pub temperature: f64,
    pub repeat_penalty: f64,
    pub stop_before: Vec<String>,
    pub include_ai_filters: bool,
}

impl ChatRequest {
    /// A system + user message pair with the sampling parameters every
    /// analysis call uses. Low temperature: the output must stay parseable.
    pub fn new(system: &str, user: &str, max_tokens: u32) -> Self {
        Self {
            messages: vec![
                Message {
                    role: "system",
                    content: system.to_string(),
                },
                Message {
                    role: "user",
                    content: user.to_string(),
                },
            ],
            top_p: 0.8,
            top_k: 0,
            max_tokens,
            temperature: 0.1,
            repeat_penalty: 5.0,
            stop_before: Vec::new(),
            include_ai_filters: true,
        }
    }
}

/// Backend seam so pipeline stages can run against a scripted fake in tests.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Sends one request and returns the assembled transcript.
    async fn complete(&self, request: &ChatRequest) -> Result<String, CompletionError>;
}

/// The production client. Speaks the service's server-sent-event protocol
/// and drains the stream into one transcript.
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    host: String,
    api_key: String,
    request_id: String,
}

impl CompletionClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_DEADLINE_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            host: config.completion_host.clone(),
            api_key: config.completion_api_key.clone(),
            request_id: config.request_id.clone(),
        }
    }
}

#[async_trait]
impl CompletionBackend for CompletionClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, CompletionError> {
        let url = format!("{}{}/{}", self.host, COMPLETION_PATH, MODEL);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("X-Request-Id", &self.request_id)
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let transcript = drain_event_stream(
            response,
            std::time::Duration::from_secs(REQUEST_DEADLINE_SECS),
        )
        .await?;

        debug!(chars = transcript.len(), "completion transcript assembled");

        if transcript.trim().is_empty() {
            return Err(CompletionError::Empty);
        }
        Ok(transcript)
    }
}
