//! LlmClient trait definition

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// Stateless LLM client - each call is independent (fresh context)
///
/// Both the oracle classifier and the plan enhancer are single-shot
/// text-in/text-out calls, so no conversation state is kept between calls.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

/// Scripted client for tests and offline runs
pub mod mock {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tracing::debug;

    /// Mock LLM client returning scripted replies in order
    ///
    /// Once the script is exhausted every call fails with `EmptyReply`,
    /// which is also how tests force an oracle failure.
    pub struct MockLlmClient {
        responses: Vec<Result<String, String>>,
        call_count: AtomicUsize,
        delay: Option<Duration>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl MockLlmClient {
        /// Replies returned in order
        pub fn new<S: Into<String>>(responses: Vec<S>) -> Self {
            let responses: Vec<Result<String, String>> = responses.into_iter().map(|s| Ok(s.into())).collect();
            debug!(response_count = %responses.len(), "MockLlmClient::new: called");
            Self {
                responses,
                call_count: AtomicUsize::new(0),
                delay: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Client whose every call fails
        pub fn failing() -> Self {
            Self::new(Vec::<String>::new())
        }

        /// Script that mixes replies and transport failures
        pub fn scripted(responses: Vec<Result<String, String>>) -> Self {
            Self {
                responses,
                call_count: AtomicUsize::new(0),
                delay: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Sleep before answering, to exercise timeouts and cancellation
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        /// Requests received so far
        pub fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().map(|r| r.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            debug!("MockLlmClient::complete: called");
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request);
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match self.responses.get(idx) {
                Some(Ok(text)) => Ok(CompletionResponse::text(text.clone())),
                Some(Err(message)) => Err(LlmError::from_status(503, message, None)),
                None => {
                    debug!(%idx, "MockLlmClient::complete: script exhausted");
                    Err(LlmError::EmptyReply)
                }
            }
        }
    }

}
