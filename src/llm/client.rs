//! OpenAI-compatible chat-completion client.
//!
//! Sends one `POST {api_base}/chat/completions` per prompt, no streaming and
//! no retries, and returns the first choice's message content.

use super::CompletionClient;
use super::prompt::SYSTEM_MESSAGE;
use crate::config::CompletionSettings;
use crate::error::{AskError, AskResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Longest slice of an error body quoted back in messages.
const ERROR_BODY_LIMIT: usize = 300;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn into_content(self) -> AskResult<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                AskError::completion(
                    "The completion API returned no content",
                    "Try again or choose a different --model",
                )
            })
    }
}

/// Completion client for any OpenAI-compatible endpoint (Groq by default).
#[derive(Debug, Clone)]
pub struct ChatCompletionClient {
    http: reqwest::Client,
    endpoint: String,
    settings: CompletionSettings,
}

impl ChatCompletionClient {
    pub fn new(settings: CompletionSettings) -> AskResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| AskError::config(format!("Failed to build HTTP client: {e}")))?;

        let endpoint = format!(
            "{}/chat/completions",
            settings.api_base.as_str().trim_end_matches('/')
        );

        Ok(Self {
            http,
            endpoint,
            settings,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_MESSAGE,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        }
    }
}

#[async_trait]
impl CompletionClient for ChatCompletionClient {
    async fn complete(&self, prompt: &str) -> AskResult<String> {
        let start = Instant::now();
        debug!(endpoint = %self.endpoint, model = %self.settings.model, "Requesting completion");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.settings.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let content = response.json::<ChatResponse>().await?.into_content()?;
        info!(
            model = %self.settings.model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            chars = content.len(),
            "Completion received"
        );
        Ok(content)
    }
}

fn status_error(status: reqwest::StatusCode, body: &str) -> AskError {
    let snippet: String = body.trim().chars().take(ERROR_BODY_LIMIT).collect();
    let suggestion = match status.as_u16() {
        401 | 403 => "Check the GROQ_API_KEY value",
        404 => "Check --api-base and --model",
        429 => "Rate limited; wait and try again",
        _ => "Try again later",
    };
    AskError::completion(format!("HTTP {status}: {snippet}"), suggestion)
}
