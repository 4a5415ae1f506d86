//! Oracle classifier
//!
//! Adapter around a generative model used when deterministic matching is weak
//! or ambiguous. The wire protocol is a single `task_type|confidence` line;
//! every failure mode collapses into the fallback result so the cascade never
//! sees an error.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::OracleConfig;
use crate::domain::{TaskClassificationResult, TaskType};
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompts::PromptLoader;

/// Reasons an oracle call produced no usable answer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OracleError {
    #[error("Reply has no '|' separator: '{0}'")]
    MissingSeparator(String),

    #[error("Unknown task type in reply: '{0}'")]
    UnknownType(String),

    #[error("Confidence is not a number: '{0}'")]
    InvalidConfidence(String),

    #[error("Oracle call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Oracle call cancelled")]
    Cancelled,

    #[error("LLM call failed: {0}")]
    Llm(String),
}

/// Anything that can classify a query when the deterministic stages cannot
///
/// Implementations must not fail: problems are logged and the fallback
/// result returned instead.
#[async_trait]
pub trait OracleClassifier: Send + Sync {
    async fn classify(&self, query: &str, cancel: &CancellationToken) -> TaskClassificationResult;
}

/// Parse a `task_type|confidence` reply
///
/// The type is trimmed and lowercased before lookup; the confidence must be
/// a number and is clamped to [0, 1].
pub fn parse_oracle_reply(reply: &str) -> Result<TaskClassificationResult, OracleError> {
    let reply = reply.trim();
    let (raw_type, raw_confidence) = reply
        .split_once('|')
        .ok_or_else(|| OracleError::MissingSeparator(reply.to_string()))?;

    let type_name = raw_type.trim().to_lowercase();
    let task_type: TaskType = type_name
        .parse()
        .map_err(|_| OracleError::UnknownType(type_name.clone()))?;

    let confidence: f64 = raw_confidence
        .trim()
        .parse()
        .map_err(|_| OracleError::InvalidConfidence(raw_confidence.trim().to_string()))?;
    if confidence.is_nan() {
        return Err(OracleError::InvalidConfidence(raw_confidence.trim().to_string()));
    }

    Ok(TaskClassificationResult::for_type(task_type, confidence))
}

/// Oracle backed by an LLM completion call
pub struct LlmOracle {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
    timeout: Duration,
    max_tokens: u32,
    permits: Arc<Semaphore>,
}

impl LlmOracle {
    /// Render the catalog prompt once and size the concurrency window
    pub fn new(llm: Arc<dyn LlmClient>, config: &OracleConfig, prompts: &PromptLoader) -> eyre::Result<Self> {
        debug!(
            timeout_ms = config.timeout_ms,
            max_concurrent = config.max_concurrent,
            "LlmOracle::new: called"
        );
        Ok(Self {
            llm,
            system_prompt: prompts.classify_prompt()?,
            timeout: config.timeout(),
            max_tokens: config.max_tokens,
            permits: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    /// One oracle round trip, surfacing the failure reason
    pub async fn try_classify(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<TaskClassificationResult, OracleError> {
        debug!(%query, "LlmOracle::try_classify: called");
        let _permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(OracleError::Cancelled),
            permit = self.permits.acquire() => permit.map_err(|_| OracleError::Cancelled)?,
        };

        let request = CompletionRequest::single(self.system_prompt.clone(), query, self.max_tokens);
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(OracleError::Cancelled),
            result = tokio::time::timeout(self.timeout, self.llm.complete(request)) => match result {
                Err(_) => return Err(OracleError::Timeout(self.timeout)),
                Ok(Err(e)) => return Err(OracleError::Llm(e.to_string())),
                Ok(Ok(response)) => response,
            },
        };

        let reply = response.text_content();
        debug!(%reply, "LlmOracle::try_classify: reply received");
        parse_oracle_reply(reply)
    }
}

#[async_trait]
impl OracleClassifier for LlmOracle {
    async fn classify(&self, query: &str, cancel: &CancellationToken) -> TaskClassificationResult {
        match self.try_classify(query, cancel).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "oracle failed, using fallback classification");
                TaskClassificationResult::fallback()
            }
        }
    }
}

/// Oracle used when no LLM is configured; always answers with the fallback
#[derive(Debug, Clone, Copy, Default)]
pub struct NullOracle;

#[async_trait]
impl OracleClassifier for NullOracle {
    async fn classify(&self, query: &str, _cancel: &CancellationToken) -> TaskClassificationResult {
        debug!(%query, "NullOracle::classify: no LLM configured");
        TaskClassificationResult::fallback()
    }
}
