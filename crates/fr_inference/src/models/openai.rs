use async_trait::async_trait;
use backoff::backoff::Backoff;
use fr_core::config::InferenceSettings;
use fr_core::retry::exponential_backoff;
use fr_core::{Completion, Error, InferenceModel, Result, TokenUsage};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

const BACKOFF_CAP: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model_name: String,
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl OpenAiConfig {
    pub fn from_settings(settings: &InferenceSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Config("INFERENCE_API_KEY is required for the openai provider".to_string()))?;
        Ok(Self {
            api_key,
            model_name: settings.model_name.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            timeout: settings.timeout,
            max_retries: settings.max_retries,
            backoff_base: Duration::from_secs(1),
        })
    }
}

/// Chat-completions client for OpenAI and compatible endpoints.
pub struct OpenAiModel {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiModel {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    async fn send_once(&self, prompt: &str) -> std::result::Result<Completion, Attempt> {
        let request = ChatRequest {
            model: &self.config.model_name,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Attempt::Retry(Error::Http(e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = Error::Inference(format!("{} returned HTTP {}: {}", self.config.base_url, status.as_u16(), body.trim()));
            return Err(if is_retryable(status) {
                Attempt::Retry(error)
            } else {
                Attempt::Fatal(error)
            });
        }

        let parsed = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| Attempt::Retry(Error::Http(e)))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Attempt::Fatal(Error::Inference("Response contained no choices".to_string())))?;

        let completion = Completion::new(text);
        Ok(match parsed.usage {
            Some(usage) => completion.with_usage(TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            }),
            None => completion,
        })
    }
}

enum Attempt {
    Retry(Error),
    Fatal(Error),
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

impl fmt::Debug for OpenAiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("model_name", &self.config.model_name)
            .field("base_url", &self.config.base_url)
            .finish()
    }
}

#[async_trait]
impl InferenceModel for OpenAiModel {
    fn name(&self) -> &str {
        &self.config.model_name
    }

    async fn complete(&self, prompt: &str) -> Result<Completion> {
        let mut backoff = exponential_backoff(self.config.backoff_base, BACKOFF_CAP);
        let mut attempt = 0;
        loop {
            let error = match self.send_once(prompt).await {
                Ok(completion) => {
                    debug!("🤖 {} answered on attempt {}", self.config.model_name, attempt + 1);
                    return Ok(completion);
                }
                Err(Attempt::Fatal(e)) => return Err(e),
                Err(Attempt::Retry(e)) => e,
            };

            if attempt >= self.config.max_retries {
                return Err(error);
            }
            let Some(delay) = backoff.next_backoff() else {
                return Err(error);
            };
            warn!("Inference attempt {} failed: {}. Retrying in {:?}", attempt + 1, error, delay);
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
