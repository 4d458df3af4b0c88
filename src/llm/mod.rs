//! Completion API access.
//!
//! [`CompletionClient`] is the seam between the pipeline and the hosted model;
//! [`ChatCompletionClient`] is the HTTP implementation and tests substitute a
//! scripted one.

pub mod client;
pub mod prompt;

use crate::error::AskResult;
use async_trait::async_trait;

pub use client::ChatCompletionClient;
pub use prompt::build_prompt;

/// Turns a prompt into raw model text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> AskResult<String>;
}
