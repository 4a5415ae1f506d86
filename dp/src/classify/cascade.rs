//! Classification cascade
//!
//! An ordered list of named strategies applied to shared per-request state.
//! Each strategy either decides the result or hands over to the next one:
//!
//! 1. `phrase` - any phrase hit wins at 0.95
//! 2. `keyword+boost` - keyword score plus specialist boost; accepted at >= 0.7
//! 3. `oracle-primary` - below 0.3 the oracle answers, unless it falls back
//!    while the keyword stage had a real guess
//! 4. `oracle-tiebreak` - in between, the oracle wins only with a strictly
//!    higher confidence

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::booster::boost;
use super::keyword::{self, KeywordMatch};
use super::oracle::{NullOracle, OracleClassifier};
use super::phrase::match_phrases;
use super::synonyms::expand;
use crate::domain::{ContextHint, TaskClassificationResult};

/// Keyword confidence accepted without consulting the oracle
pub const ACCEPT_THRESHOLD: f64 = 0.7;

/// Below this keyword confidence the oracle becomes the primary source
pub const ORACLE_THRESHOLD: f64 = 0.3;

/// Cascade stage that produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    #[serde(rename = "phrase")]
    Phrase,
    #[serde(rename = "keyword+boost")]
    KeywordBoost,
    #[serde(rename = "oracle-primary")]
    OraclePrimary,
    #[serde(rename = "oracle-tiebreak")]
    OracleTiebreak,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Phrase => "phrase",
            Self::KeywordBoost => "keyword+boost",
            Self::OraclePrimary => "oracle-primary",
            Self::OracleTiebreak => "oracle-tiebreak",
        };
        write!(f, "{}", name)
    }
}

/// A classification plus the stage that decided it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub result: TaskClassificationResult,
    pub stage: Stage,
}

/// Working state for one request, local to that request
pub struct CascadeState<'a> {
    pub query: &'a str,
    pub hint: &'a ContextHint,
    /// Original query first, then synonym variants
    pub variants: Vec<String>,
    /// Keyword result after boosting, once that stage has run
    pub keyword: Option<KeywordMatch>,
    pub cancel: &'a CancellationToken,
}

impl<'a> CascadeState<'a> {
    pub fn new(query: &'a str, hint: &'a ContextHint, cancel: &'a CancellationToken) -> Self {
        Self {
            query,
            hint,
            variants: expand(query),
            keyword: None,
            cancel,
        }
    }

    fn keyword_result(&self) -> Option<TaskClassificationResult> {
        self.keyword
            .map(|kw| TaskClassificationResult::for_type(kw.task_type, kw.confidence))
    }
}

/// What a strategy did with the request
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Decided(TaskClassificationResult),
    Continue,
}

/// One named stage of the cascade
#[async_trait]
pub trait Strategy: Send + Sync {
    fn stage(&self) -> Stage;

    async fn apply(&self, state: &mut CascadeState<'_>) -> Step;
}

/// Regex phrase patterns over the query, then its variants
pub struct PhraseStrategy;

#[async_trait]
impl Strategy for PhraseStrategy {
    fn stage(&self) -> Stage {
        Stage::Phrase
    }

    async fn apply(&self, state: &mut CascadeState<'_>) -> Step {
        let hit = match_phrases(&state.variants);
        if hit.is_hit() {
            Step::Decided(TaskClassificationResult::for_type(hit.task_type, hit.confidence))
        } else {
            Step::Continue
        }
    }
}

/// Keyword scoring followed by the specialist boost
pub struct KeywordBoostStrategy;

#[async_trait]
impl Strategy for KeywordBoostStrategy {
    fn stage(&self) -> Stage {
        Stage::KeywordBoost
    }

    async fn apply(&self, state: &mut CascadeState<'_>) -> Step {
        let scored = keyword::score(state.query, &state.variants);
        let boosted = boost(scored.best, &scored.scores, state.hint.specialist_hint);
        state.keyword = Some(boosted);

        if boosted.confidence >= ACCEPT_THRESHOLD {
            Step::Decided(TaskClassificationResult::for_type(boosted.task_type, boosted.confidence))
        } else {
            Step::Continue
        }
    }
}

/// Oracle as the main source for weak keyword results
pub struct OraclePrimaryStrategy {
    oracle: Arc<dyn OracleClassifier>,
}

impl OraclePrimaryStrategy {
    pub fn new(oracle: Arc<dyn OracleClassifier>) -> Self {
        Self { oracle }
    }
}

#[async_trait]
impl Strategy for OraclePrimaryStrategy {
    fn stage(&self) -> Stage {
        Stage::OraclePrimary
    }

    async fn apply(&self, state: &mut CascadeState<'_>) -> Step {
        let keyword = state.keyword.unwrap_or_else(KeywordMatch::none);
        if keyword.confidence >= ORACLE_THRESHOLD {
            return Step::Continue;
        }

        let oracle = self.oracle.classify(state.query, state.cancel).await;
        if !oracle.task_type.is_custom() || keyword.task_type.is_custom() {
            Step::Decided(oracle)
        } else {
            Step::Decided(TaskClassificationResult::for_type(keyword.task_type, keyword.confidence))
        }
    }
}

/// Oracle as a tiebreaker for mid-confidence keyword results
pub struct OracleTiebreakStrategy {
    oracle: Arc<dyn OracleClassifier>,
}

impl OracleTiebreakStrategy {
    pub fn new(oracle: Arc<dyn OracleClassifier>) -> Self {
        Self { oracle }
    }
}

#[async_trait]
impl Strategy for OracleTiebreakStrategy {
    fn stage(&self) -> Stage {
        Stage::OracleTiebreak
    }

    async fn apply(&self, state: &mut CascadeState<'_>) -> Step {
        let keyword = state.keyword.unwrap_or_else(KeywordMatch::none);
        let oracle = self.oracle.classify(state.query, state.cancel).await;

        // The oracle's fields are adopted wholesale; nothing is merged from the keyword path
        if oracle.confidence > keyword.confidence {
            Step::Decided(oracle)
        } else {
            Step::Decided(TaskClassificationResult::for_type(keyword.task_type, keyword.confidence))
        }
    }
}

/// Cascade controller
pub struct TaskClassifier {
    strategies: Vec<Box<dyn Strategy>>,
}

impl TaskClassifier {
    /// The standard four-stage cascade over the given oracle
    pub fn new(oracle: Arc<dyn OracleClassifier>) -> Self {
        Self::with_strategies(vec![
            Box::new(PhraseStrategy),
            Box::new(KeywordBoostStrategy),
            Box::new(OraclePrimaryStrategy::new(oracle.clone())),
            Box::new(OracleTiebreakStrategy::new(oracle)),
        ])
    }

    /// Cascade without a model; oracle stages always get the fallback
    pub fn deterministic() -> Self {
        Self::new(Arc::new(NullOracle))
    }

    /// Custom strategy order
    pub fn with_strategies(strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self { strategies }
    }

    /// Classify a query
    pub async fn classify(&self, query: &str, hint: &ContextHint) -> TaskClassificationResult {
        self.classify_traced(query, hint).await.result
    }

    /// Classify and report which stage decided
    pub async fn classify_traced(&self, query: &str, hint: &ContextHint) -> Classification {
        self.classify_with_cancel(query, hint, &CancellationToken::new()).await
    }

    /// Classify under a caller-owned cancellation token
    ///
    /// Cancellation only affects oracle calls, which then fall back.
    pub async fn classify_with_cancel(
        &self,
        query: &str,
        hint: &ContextHint,
        cancel: &CancellationToken,
    ) -> Classification {
        debug!(%query, ?hint, "classify_with_cancel: called");
        let mut state = CascadeState::new(query, hint, cancel);

        for strategy in &self.strategies {
            if let Step::Decided(result) = strategy.apply(&mut state).await {
                let stage = strategy.stage();
                debug!(%stage, task_type = %result.task_type, confidence = result.confidence, "classify: decided");
                return Classification { result, stage };
            }
        }

        // Only reachable with a custom strategy list lacking a terminal stage
        Classification {
            result: state.keyword_result().unwrap_or_else(TaskClassificationResult::fallback),
            stage: Stage::KeywordBoost,
        }
    }

    /// Classify many queries concurrently, preserving input order
    ///
    /// Oracle concurrency is bounded by the oracle's own permit window.
    pub async fn classify_batch(&self, requests: &[(String, ContextHint)]) -> Vec<TaskClassificationResult> {
        debug!(count = requests.len(), "classify_batch: called");
        join_all(requests.iter().map(|(query, hint)| self.classify(query, hint))).await
    }
}
