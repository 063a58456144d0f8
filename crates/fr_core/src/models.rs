use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::Result;

/// Token counts for a single inference call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    /// Usage reported by the endpoint, if any.
    pub usage: Option<TokenUsage>,
}

impl Completion {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), usage: None }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

#[async_trait]
pub trait InferenceModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Sends a single prompt and returns the raw completion text.
    async fn complete(&self, prompt: &str) -> Result<Completion>;
}
