//! Generation service client.
//!
//! The enrichment stage treats the text-generation service as a black box
//! behind the [`GenerationClient`] trait: one call per record, returning
//! either structured (JSON-parseable) or plain text. Failures surface as
//! [`GenerationError`] and are isolated per item by the caller; nothing in
//! this module retries.

use async_trait::async_trait;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 2000;

/// Errors raised by a generation call. Always caught by the enrichment
/// stage and recorded against the item that triggered them.
#[derive(Debug, Error, Diagnostic)]
pub enum GenerationError {
    /// Transport-level failure reaching the service.
    #[error("generation request failed: {0}")]
    #[diagnostic(code(rowloom::generation::transport))]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("generation service returned {status}: {body}")]
    #[diagnostic(code(rowloom::generation::status))]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The response body did not contain a completion.
    #[error("generation response carried no choices")]
    #[diagnostic(code(rowloom::generation::empty))]
    EmptyResponse,
}

/// A text-generation backend invoked once per record.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Produces a completion for the given model and prompt pair.
    async fn generate(
        &self,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, GenerationError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat completions client. Works against OpenAI itself
/// or any endpoint speaking the same protocol via [`with_base_url`].
///
/// [`with_base_url`]: OpenAiClient::with_base_url
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Points the client at a different OpenAI-compatible endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl GenerationClient for OpenAiClient {
    async fn generate(
        &self,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status { status, body });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(GenerationError::EmptyResponse)
    }
}
