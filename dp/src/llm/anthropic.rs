//! Anthropic Messages API client
//!
//! Oracle and enhancer calls run under a caller-side deadline, so the client
//! retries at most once with a short pause and leaves timing to the caller.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, Message, StopReason, TokenUsage};
use crate::config::LlmConfig;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// First attempt plus one retry
const MAX_ATTEMPTS: u32 = 2;

/// Pause before the retry when the provider gave no `retry-after`
const RETRY_PAUSE: Duration = Duration::from_millis(250);

/// Longest `retry-after` honoured; anything longer fails fast
const MAX_RETRY_PAUSE: Duration = Duration::from_secs(2);

/// Anthropic Claude API client
pub struct AnthropicClient {
    model: String,
    api_key: String,
    endpoint: String,
    http: Client,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [Message],
}

#[derive(Debug, Deserialize)]
struct MessagesReply {
    content: Vec<ContentBlock>,
    stop_reason: String,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

impl AnthropicClient {
    /// Build a client; the API key comes from the variable named in config
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, base_url = %config.base_url, "AnthropicClient::from_config: called");
        let api_key = config.get_api_key().map_err(|_| LlmError::MissingApiKey {
            env: config.api_key_env.clone(),
        })?;

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            endpoint: format!("{}/v1/messages", config.base_url.trim_end_matches('/')),
            http,
            max_tokens: config.max_tokens,
        })
    }

    fn body<'a>(&'a self, request: &'a CompletionRequest) -> MessagesBody<'a> {
        MessagesBody {
            model: &self.model,
            max_tokens: request.max_tokens.min(self.max_tokens),
            system: &request.system_prompt,
            messages: &request.messages,
        }
    }

    async fn send_once(&self, body: &MessagesBody<'_>) -> Result<CompletionResponse, LlmError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status(status.as_u16(), &text, retry_after));
        }

        let bytes = response.bytes().await?;
        let reply: MessagesReply = serde_json::from_slice(&bytes)?;
        let completion = into_completion(reply);
        if completion.content.is_none() {
            return Err(LlmError::EmptyReply);
        }
        Ok(completion)
    }
}

fn into_completion(reply: MessagesReply) -> CompletionResponse {
    let text: String = reply
        .content
        .into_iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        })
        .collect();

    CompletionResponse {
        content: (!text.is_empty()).then_some(text),
        stop_reason: StopReason::from_anthropic(&reply.stop_reason),
        usage: TokenUsage {
            input_tokens: reply.usage.input_tokens,
            output_tokens: reply.usage.output_tokens,
        },
    }
}

/// Pause before the next attempt, or None when retrying is pointless
fn retry_pause(error: &LlmError) -> Option<Duration> {
    if !error.is_transient() {
        return None;
    }
    match error {
        LlmError::RateLimited {
            retry_after: Some(after),
        } if *after > MAX_RETRY_PAUSE => None,
        LlmError::RateLimited {
            retry_after: Some(after),
        } => Some(*after),
        _ => Some(RETRY_PAUSE),
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(model = %self.model, max_tokens = request.max_tokens, "AnthropicClient::complete: called");
        let body = self.body(&request);

        let mut attempt = 1;
        loop {
            let error = match self.send_once(&body).await {
                Ok(completion) => return Ok(completion),
                Err(e) => e,
            };

            let pause = retry_pause(&error).filter(|_| attempt < MAX_ATTEMPTS);
            let Some(pause) = pause else {
                return Err(if attempt > 1 {
                    LlmError::Exhausted {
                        attempts: attempt,
                        last: Box::new(error),
                    }
                } else {
                    error
                });
            };

            warn!(attempt, error = %error, pause_ms = pause.as_millis() as u64, "Anthropic call failed, retrying");
            tokio::time::sleep(pause).await;
            attempt += 1;
        }
    }
}
