//! Orchestrator - sequences classification, planning, approval and execution
//!
//! The orchestrator owns no state of its own: plan records live in the
//! StateManager actor, context comes from a `ContextProvider`, and artifacts
//! are produced by an `ArtifactGenerator`.

mod providers;

use std::sync::Arc;

use async_trait::async_trait;
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::classify::TaskClassifier;
use crate::domain::{
    AggregatedContext, ContextHint, ExecutionPlan, GeneratedArtifact, Methodology, PlanRecord, PlanSection,
    PlanStatus, TaskType,
};
use crate::planning::{PlanEnhancer, build_actions, estimated_length, synthesize};
use crate::state::StateManager;

pub use providers::{FileContextProvider, OutlineArtifactGenerator, render_outline};

/// Source of business context for an entity
#[async_trait]
pub trait ContextProvider: Send + Sync {
    async fn aggregate(&self, task_type: TaskType, entity_id: Option<&str>, query: &str) -> Result<AggregatedContext>;
}

/// Backend that turns an approved plan into an artifact
#[async_trait]
pub trait ArtifactGenerator: Send + Sync {
    async fn generate(&self, plan: &ExecutionPlan, context: &AggregatedContext) -> Result<GeneratedArtifact>;
}

/// Reviewer edits applied at execution time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanModifications {
    /// Replacement section list; actions and size estimate are regenerated
    pub sections: Option<Vec<PlanSection>>,

    /// Override of the destination target
    #[serde(rename = "destination-target")]
    pub destination_target: Option<String>,
}

impl PlanModifications {
    pub fn is_empty(&self) -> bool {
        self.sections.is_none() && self.destination_target.is_none()
    }

    /// Reject edits that would produce an unusable plan
    pub fn validate(&self) -> Result<()> {
        if let Some(sections) = &self.sections {
            if sections.is_empty() {
                return Err(eyre!("Replacement section list is empty"));
            }
            if let Some(unnamed) = sections.iter().position(|s| s.name.trim().is_empty()) {
                return Err(eyre!("Replacement section {} has no name", unnamed + 1));
            }
        }
        if let Some(target) = &self.destination_target
            && target.trim().is_empty()
        {
            return Err(eyre!("Destination target override is empty"));
        }
        Ok(())
    }

    pub fn apply(&self, plan: &mut ExecutionPlan) {
        if let Some(sections) = &self.sections {
            plan.structure.sections = sections.clone();
            plan.structure.estimated_length = estimated_length(plan.task_type, sections.len());
            plan.actions = build_actions(sections, plan.structure.output_format);
        }
        if let Some(target) = &self.destination_target {
            plan.destination.target = target.clone();
        }
    }
}

/// Fails the plan as interrupted if dropped while still armed
struct ExecutionGuard {
    state: StateManager,
    plan_id: String,
    armed: bool,
}

impl ExecutionGuard {
    fn new(state: &StateManager, plan_id: &str) -> Self {
        Self {
            state: state.clone(),
            plan_id: plan_id.to_string(),
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ExecutionGuard {
    fn drop(&mut self) {
        if self.armed {
            warn!(plan_id = %self.plan_id, "execution dropped before finishing");
            self.state.interrupt_execution(&self.plan_id);
        }
    }
}

/// Classification-to-artifact workflow
pub struct Orchestrator {
    classifier: TaskClassifier,
    context: Arc<dyn ContextProvider>,
    generator: Arc<dyn ArtifactGenerator>,
    enhancer: Option<PlanEnhancer>,
    state: StateManager,
}

impl Orchestrator {
    pub fn new(
        classifier: TaskClassifier,
        context: Arc<dyn ContextProvider>,
        generator: Arc<dyn ArtifactGenerator>,
        state: StateManager,
    ) -> Self {
        debug!("Orchestrator::new: called");
        Self {
            classifier,
            context,
            generator,
            enhancer: None,
            state,
        }
    }

    /// Review section lists with the model before persisting
    pub fn with_enhancer(mut self, enhancer: PlanEnhancer) -> Self {
        self.enhancer = Some(enhancer);
        self
    }

    pub fn classifier(&self) -> &TaskClassifier {
        &self.classifier
    }

    /// Classify, aggregate context, synthesize and persist a pending plan
    pub async fn create_plan(
        &self,
        query: &str,
        entity_id: Option<&str>,
        methodology: Option<&Methodology>,
    ) -> Result<ExecutionPlan> {
        debug!(%query, ?entity_id, "create_plan: called");
        let hint = match entity_id {
            Some(entity) => ContextHint::default().with_entity(entity),
            None => ContextHint::default(),
        };

        let classification = self.classifier.classify_traced(query, &hint).await;
        let task_type = classification.result.task_type;
        info!(
            %task_type,
            confidence = classification.result.confidence,
            stage = %classification.stage,
            "Classified request"
        );

        let context = self
            .context
            .aggregate(task_type, entity_id, query)
            .await
            .context("Failed to aggregate context")?;

        let mut plan = synthesize(task_type, &context, methodology);
        if let Some(enhancer) = &self.enhancer {
            enhancer.enhance(&mut plan, &context, &CancellationToken::new()).await;
        }
        plan.validate().context("Synthesized plan is invalid")?;

        let record = PlanRecord::new(plan.clone(), query, entity_id.map(str::to_string));
        self.state.create_plan(record).await?;
        info!(plan_id = %plan.plan_id, %task_type, "Created plan");
        Ok(plan)
    }

    /// Mark a pending plan approved
    pub async fn approve(&self, plan_id: &str) -> Result<PlanRecord> {
        debug!(%plan_id, "approve: called");
        Ok(self.state.approve_plan(plan_id).await?)
    }

    /// Execute an approved plan
    ///
    /// The move into `executing` is a compare-and-set, so concurrent calls on
    /// one plan let exactly one through. Any failure after that point records
    /// the plan as `failed` with the error message. Dropping the future before
    /// the outcome is recorded marks the plan `failed` with `interrupted`.
    pub async fn execute(&self, plan_id: &str, modifications: Option<PlanModifications>) -> Result<GeneratedArtifact> {
        debug!(%plan_id, has_modifications = modifications.is_some(), "execute: called");
        if let Some(mods) = &modifications {
            mods.validate()?;
        }

        let record = self.state.start_execution(plan_id).await?;
        let guard = ExecutionGuard::new(&self.state, plan_id);

        let outcome = match self.run_execution(record, modifications).await {
            Ok((plan, artifact)) => {
                self.state.complete_execution(plan_id, plan, artifact.clone()).await?;
                info!(%plan_id, location = %artifact.location, "Plan executed");
                Ok(artifact)
            }
            Err(e) => {
                let message = e.chain().map(|cause| cause.to_string()).collect::<Vec<_>>().join(": ");
                warn!(%plan_id, error = %message, "plan execution failed");
                self.state.fail_execution(plan_id, message).await?;
                Err(e)
            }
        };
        guard.disarm();
        outcome
    }

    async fn run_execution(
        &self,
        record: PlanRecord,
        modifications: Option<PlanModifications>,
    ) -> Result<(ExecutionPlan, GeneratedArtifact)> {
        let mut plan = record.plan;
        let context = self
            .context
            .aggregate(plan.task_type, record.entity_id.as_deref(), &record.query)
            .await
            .context("Failed to re-resolve context")?;

        if let Some(mods) = modifications.filter(|m| !m.is_empty()) {
            mods.apply(&mut plan);
            plan.validate().context("Modified plan is invalid")?;
        }

        let artifact = self
            .generator
            .generate(&plan, &context)
            .await
            .context("Artifact generation failed")?;
        Ok((plan, artifact))
    }

    pub async fn get_plan(&self, plan_id: &str) -> Result<PlanRecord> {
        debug!(%plan_id, "get_plan: called");
        Ok(self.state.get_plan_required(plan_id).await?)
    }

    pub async fn list_plans(&self, status: Option<PlanStatus>) -> Result<Vec<PlanRecord>> {
        debug!(?status, "list_plans: called");
        Ok(self.state.list_plans(status).await?)
    }
}
