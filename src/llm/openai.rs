//! OpenAI Chat Completions provider.
//!
//! Calls `POST {host}/v1/chat/completions` with bearer authentication
//! and normalizes the response into [`CompletionResponse`].
//!
//! Wire-format notes:
//! - The first entry of `choices[]` carries the completion; its
//!   `message.content` may be `null` for non-text responses, which we
//!   normalize to the empty string.
//! - Token usage: `prompt_tokens` / `completion_tokens` (may be absent).
//! - Non-2xx statuses are surfaced with the response body so API error
//!   payloads reach the log unmangled.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::LlmConfig;

use super::client::{CompletionClient, CompletionResponse, Message};

/// Default OpenAI API base URL.
const DEFAULT_OPENAI_HOST: &str = "https://api.openai.com";

// ── OpenAI API request types ─────────────────────────────

/// OpenAI `/v1/chat/completions` request body.
#[derive(Debug, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

// ── OpenAI API response types ────────────────────────────

/// OpenAI `/v1/chat/completions` response.
#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

// ── OpenAiClient ─────────────────────────────────────────

/// Client for the OpenAI Chat Completions API.
pub struct OpenAiClient {
    client: Client,
    config: LlmConfig,
    host: String,
}

impl OpenAiClient {
    /// Creates a new OpenAI client from configuration.
    ///
    /// If `config.host` is `None`, defaults to `https://api.openai.com`.
    pub fn new(config: LlmConfig) -> Self {
        let host = config
            .host
            .clone()
            .unwrap_or_else(|| DEFAULT_OPENAI_HOST.to_string());
        // Strip trailing slash for consistent URL construction
        let host = host.trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            config,
            host,
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, messages: &[Message]) -> Result<CompletionResponse> {
        let request = ChatCompletionsRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens_per_request,
            messages: messages.to_vec(),
        };

        debug!(
            "Calling OpenAI API ({}) with {} messages",
            self.config.model,
            messages.len()
        );

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.host))
            .header("authorization", format!("Bearer {}", self.config.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            anyhow::bail!("OpenAI API error ({status}): {body}");
        }

        let resp: ChatCompletionsResponse = response.json().await?;

        // First choice only; an empty choices array is treated as an
        // empty completion, not an error.
        let text = resp
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        let (input_tokens, output_tokens) = resp
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));

        info!("LLM response: {input_tokens} in / {output_tokens} out tokens");

        Ok(CompletionResponse {
            text,
            input_tokens,
            output_tokens,
        })
    }

    fn description(&self) -> String {
        format!("openai ({})", self.config.model)
    }
}
