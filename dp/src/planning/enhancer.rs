//! Plan enhancer
//!
//! Asks the model whether a plan's section list should change. The prompt
//! biases strongly toward `KEEP`; anything else is surfaced to the reviewer as
//! a note while the sections themselves stay as synthesized.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::PlannerConfig;
use crate::domain::{AggregatedContext, ExecutionPlan, OutputFormat};
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompts::{EnhancePromptContext, PromptLoader};

/// Reply meaning "leave the sections alone"
pub const KEEP: &str = "KEEP";

const ENHANCE_MAX_TOKENS: u32 = 256;

const ENHANCE_USER_MESSAGE: &str = "Review the section outline.";

/// Why an enhancement round trip produced nothing
#[derive(Debug, Error)]
pub enum EnhanceError {
    #[error("Prompt rendering failed: {0}")]
    Prompt(String),

    #[error("Enhancer call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Enhancer call cancelled")]
    Cancelled,

    #[error("LLM call failed: {0}")]
    Llm(String),
}

/// What the model said about the outline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suggestion {
    Keep,
    Adjust(String),
}

impl Suggestion {
    /// `KEEP` (case-insensitive, optional trailing period) or free text
    pub fn parse(reply: &str) -> Self {
        let trimmed = reply.trim().trim_matches('`').trim();
        let bare = trimmed.trim_end_matches('.');
        if trimmed.is_empty() || bare.eq_ignore_ascii_case(KEEP) {
            Self::Keep
        } else {
            Self::Adjust(trimmed.to_string())
        }
    }
}

/// Whether the enhancer runs for this output format
pub fn applies_to(format: OutputFormat) -> bool {
    matches!(format, OutputFormat::Slides | OutputFormat::Docs | OutputFormat::Sheet)
}

/// Model-assisted section review
pub struct PlanEnhancer {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    timeout: Duration,
}

impl PlanEnhancer {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>, config: &PlannerConfig) -> Self {
        debug!(timeout_ms = config.enhance_timeout_ms, "PlanEnhancer::new: called");
        Self {
            llm,
            prompts,
            timeout: config.enhance_timeout(),
        }
    }

    /// Review `plan` in place
    ///
    /// Never fails: errors and timeouts are logged and the plan left as is.
    /// Sections are never changed; a non-KEEP reply becomes a review note.
    pub async fn enhance(&self, plan: &mut ExecutionPlan, context: &AggregatedContext, cancel: &CancellationToken) {
        debug!(plan_id = %plan.plan_id, format = %plan.structure.output_format, "enhance: called");
        if !applies_to(plan.structure.output_format) {
            debug!("enhance: format not eligible, skipping");
            return;
        }

        match self.suggest(plan, context, cancel).await {
            Ok(Suggestion::Keep) => {
                debug!(plan_id = %plan.plan_id, "enhance: model kept sections");
            }
            Ok(Suggestion::Adjust(note)) => {
                info!(plan_id = %plan.plan_id, %note, "Enhancer suggested a section change");
                plan.review_notes.push(format!("Suggested section change: {}", note));
            }
            Err(e) => {
                warn!(plan_id = %plan.plan_id, error = %e, "enhancer failed, keeping sections");
            }
        }
    }

    /// One round trip to the model
    pub async fn suggest(
        &self,
        plan: &ExecutionPlan,
        context: &AggregatedContext,
        cancel: &CancellationToken,
    ) -> Result<Suggestion, EnhanceError> {
        let section_names = plan.structure.sections.iter().map(|s| s.name.clone()).collect();
        let prompt_context = EnhancePromptContext::new(plan.task_type, &plan.title, section_names, context.summary());
        let system = self
            .prompts
            .enhance_prompt(&prompt_context)
            .map_err(|e| EnhanceError::Prompt(e.to_string()))?;

        let request = CompletionRequest::single(system, ENHANCE_USER_MESSAGE, ENHANCE_MAX_TOKENS);
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(EnhanceError::Cancelled),
            result = tokio::time::timeout(self.timeout, self.llm.complete(request)) => match result {
                Err(_) => return Err(EnhanceError::Timeout(self.timeout)),
                Ok(Err(e)) => return Err(EnhanceError::Llm(e.to_string())),
                Ok(Ok(response)) => response,
            },
        };

        Ok(Suggestion::parse(response.text_content()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskType;
    use crate::llm::client::mock::MockLlmClient;
    use crate::planning::synthesize;

    fn enhancer(llm: MockLlmClient, timeout_ms: u64) -> (PlanEnhancer, Arc<MockLlmClient>) {
        let llm = Arc::new(llm);
        let config = PlannerConfig {
            enhance: true,
            enhance_timeout_ms: timeout_ms,
        };
        let enhancer = PlanEnhancer::new(llm.clone(), Arc::new(PromptLoader::embedded_only()), &config);
        (enhancer, llm)
    }

    fn plan(task_type: TaskType) -> ExecutionPlan {
        synthesize(task_type, &AggregatedContext::default(), None)
    }

    #[test]
    fn test_parse_suggestion() {
        assert_eq!(Suggestion::parse("KEEP"), Suggestion::Keep);
        assert_eq!(Suggestion::parse("  keep.\n"), Suggestion::Keep);
        assert_eq!(Suggestion::parse("`KEEP`"), Suggestion::Keep);
        assert_eq!(Suggestion::parse(""), Suggestion::Keep);
        assert_eq!(
            Suggestion::parse("Add a Competitive Landscape section."),
            Suggestion::Adjust("Add a Competitive Landscape section.".to_string())
        );
    }

    #[test]
    fn test_applies_to_formats() {
        assert!(applies_to(OutputFormat::Slides));
        assert!(applies_to(OutputFormat::Docs));
        assert!(applies_to(OutputFormat::Sheet));
        assert!(!applies_to(OutputFormat::Email));
        assert!(!applies_to(OutputFormat::Chat));
    }

    #[tokio::test]
    async fn test_keep_leaves_plan_untouched() {
        let (enhancer, llm) = enhancer(MockLlmClient::new(vec!["KEEP"]), 1_000);
        let mut p = plan(TaskType::QbrGeneration);
        let before = p.clone();

        enhancer.enhance(&mut p, &AggregatedContext::default(), &CancellationToken::new()).await;
        assert_eq!(p, before);

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].system_prompt.contains("- Executive Summary"));
        assert!(requests[0].system_prompt.contains("qbr_generation"));
    }

    #[tokio::test]
    async fn test_adjustment_becomes_review_note() {
        let (enhancer, _) = enhancer(MockLlmClient::new(vec!["Add a section on the budget freeze."]), 1_000);
        let mut p = plan(TaskType::RiskAssessment);
        let sections = p.structure.sections.clone();

        enhancer.enhance(&mut p, &AggregatedContext::default(), &CancellationToken::new()).await;
        assert_eq!(p.structure.sections, sections);
        assert_eq!(
            p.review_notes,
            vec!["Suggested section change: Add a section on the budget freeze."]
        );
    }

    #[tokio::test]
    async fn test_chat_and_email_are_skipped() {
        let (enhancer, llm) = enhancer(MockLlmClient::new(vec!["Add more"]), 1_000);
        let cancel = CancellationToken::new();

        let mut chat = plan(TaskType::HealthAnalysis);
        enhancer.enhance(&mut chat, &AggregatedContext::default(), &cancel).await;
        let mut email = plan(TaskType::EmailDrafting);
        enhancer.enhance(&mut email, &AggregatedContext::default(), &cancel).await;

        assert_eq!(llm.call_count(), 0);
        assert!(chat.review_notes.is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_sections() {
        let (enhancer, _) = enhancer(MockLlmClient::failing(), 1_000);
        let mut p = plan(TaskType::AccountPlan);
        let before = p.clone();

        enhancer.enhance(&mut p, &AggregatedContext::default(), &CancellationToken::new()).await;
        assert_eq!(p, before);
    }

    #[tokio::test]
    async fn test_timeout_keeps_sections() {
        let slow = MockLlmClient::new(vec!["Add more"]).with_delay(Duration::from_millis(500));
        let (enhancer, _) = enhancer(slow, 50);
        let mut p = plan(TaskType::AccountPlan);

        let err = enhancer
            .suggest(&p, &AggregatedContext::default(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EnhanceError::Timeout(_)));

        enhancer.enhance(&mut p, &AggregatedContext::default(), &CancellationToken::new()).await;
        assert!(p.review_notes.is_empty());
    }
}
