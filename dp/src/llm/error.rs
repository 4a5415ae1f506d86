//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Longest provider error body kept in an error message
const MAX_BODY_CHARS: usize = 300;

/// Errors from a completion call
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("No API key: set the {env} environment variable")]
    MissingApiKey { env: String },

    #[error("Unsupported LLM provider '{0}' (supported: anthropic)")]
    UnsupportedProvider(String),

    #[error("HTTP transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Rate limited by provider")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Malformed reply body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Reply contained no text")]
    EmptyReply,

    #[error("Gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<LlmError> },
}

impl LlmError {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, body: &str, retry_after: Option<Duration>) -> Self {
        if status == 429 {
            return Self::RateLimited { retry_after };
        }
        let body: String = body.trim().chars().take(MAX_BODY_CHARS).collect();
        Self::Status { status, body }
    }

    /// Worth another attempt, deadline permitting
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Transport(_) => true,
            Self::Status { status, .. } => matches!(status, 408 | 500 | 502 | 503 | 504 | 529),
            _ => false,
        }
    }
}
