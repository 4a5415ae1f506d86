//! Execution plan domain type
//!
//! An ExecutionPlan is the structured, human-approvable description of what a
//! classified request will produce: sections, inputs, actions and destination.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::task_type::{OutputFormat, TaskType};

/// Description of the first action in every plan
pub const GATHER_ACTION: &str = "Gather and validate data sources";

/// One section of the produced artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSection {
    pub name: String,
    pub description: String,
    #[serde(rename = "dataSources")]
    pub data_sources: Vec<String>,
}

impl PlanSection {
    pub fn new(name: impl Into<String>, description: impl Into<String>, data_sources: &[&str]) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            data_sources: data_sources.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// One numbered step of plan execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanAction {
    /// 1-based, contiguous
    pub step: u32,
    pub action: String,
    pub requires_approval: bool,
}

/// Inputs the plan will draw on
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanInputs {
    pub knowledge_base: Vec<String>,
    pub platform_data: Vec<String>,
    pub external_sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStructure {
    pub sections: Vec<PlanSection>,
    pub output_format: OutputFormat,
    pub estimated_length: String,
}

/// Where the result lands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    /// e.g. "Google Slides: Acme Corp - Quarterly Business Review"
    pub target: String,
    pub output_format: OutputFormat,
    /// False for chat output, where nothing external is created
    pub preview_required: bool,
}

/// Structured plan awaiting approval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPlan {
    pub plan_id: String,
    pub task_type: TaskType,
    pub title: String,
    pub inputs: PlanInputs,
    pub structure: PlanStructure,
    pub actions: Vec<PlanAction>,
    pub destination: Destination,
    /// Reviewer-facing notes, e.g. section suggestions from the enhancer
    #[serde(default)]
    pub review_notes: Vec<String>,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
}

/// Plan invariant violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("Plan has no actions")]
    NoActions,

    #[error("Action steps must be contiguous from 1: expected {expected}, found {found}")]
    NonContiguousSteps { expected: u32, found: u32 },

    #[error("First action must be data gathering, found '{0}'")]
    MissingGatherStep(String),

    #[error("Artifact-producing plan must end with exactly one approval step")]
    MissingApprovalStep,

    #[error("Unexpected approval step {0}")]
    UnexpectedApprovalStep(u32),
}

impl ExecutionPlan {
    /// Check the structural invariants every plan must satisfy
    pub fn validate(&self) -> Result<(), PlanError> {
        let first = self.actions.first().ok_or(PlanError::NoActions)?;

        for (idx, action) in self.actions.iter().enumerate() {
            let expected = idx as u32 + 1;
            if action.step != expected {
                return Err(PlanError::NonContiguousSteps {
                    expected,
                    found: action.step,
                });
            }
        }

        if first.action != GATHER_ACTION || first.requires_approval {
            return Err(PlanError::MissingGatherStep(first.action.clone()));
        }
        if let Some(dup) = self.actions.iter().skip(1).find(|a| a.action == GATHER_ACTION) {
            return Err(PlanError::MissingGatherStep(format!("duplicate at step {}", dup.step)));
        }

        let last_idx = self.actions.len() - 1;
        let approvals: Vec<u32> = self
            .actions
            .iter()
            .filter(|a| a.requires_approval)
            .map(|a| a.step)
            .collect();

        if self.structure.output_format.creates_artifact() {
            if approvals.len() != 1 || !self.actions[last_idx].requires_approval {
                return Err(PlanError::MissingApprovalStep);
            }
        } else if let Some(step) = approvals.first() {
            return Err(PlanError::UnexpectedApprovalStep(*step));
        }

        Ok(())
    }

    /// Number of the trailing approval step, if any
    pub fn approval_step(&self) -> Option<u32> {
        self.actions.last().filter(|a| a.requires_approval).map(|a| a.step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(step: u32, text: &str, requires_approval: bool) -> PlanAction {
        PlanAction {
            step,
            action: text.to_string(),
            requires_approval,
        }
    }

    fn plan(format: OutputFormat, actions: Vec<PlanAction>) -> ExecutionPlan {
        ExecutionPlan {
            plan_id: "test-plan".to_string(),
            task_type: TaskType::Custom,
            title: "Test".to_string(),
            inputs: PlanInputs::default(),
            structure: PlanStructure {
                sections: vec![],
                output_format: format,
                estimated_length: "short".to_string(),
            },
            actions,
            destination: Destination {
                target: "Chat response".to_string(),
                output_format: format,
                preview_required: format.creates_artifact(),
            },
            review_notes: vec![],
            created_at: 0,
        }
    }

    #[test]
    fn test_valid_artifact_plan() {
        let p = plan(
            OutputFormat::Docs,
            vec![
                action(1, GATHER_ACTION, false),
                action(2, "Generate section: Overview", false),
                action(3, "Create document in Google Docs", true),
            ],
        );
        assert_eq!(p.validate(), Ok(()));
        assert_eq!(p.approval_step(), Some(3));
    }

    #[test]
    fn test_valid_chat_plan() {
        let p = plan(
            OutputFormat::Chat,
            vec![action(1, GATHER_ACTION, false), action(2, "Generate section: Answer", false)],
        );
        assert_eq!(p.validate(), Ok(()));
        assert_eq!(p.approval_step(), None);
    }

    #[test]
    fn test_rejects_gap_in_steps() {
        let p = plan(
            OutputFormat::Chat,
            vec![action(1, GATHER_ACTION, false), action(3, "Generate section: Answer", false)],
        );
        assert_eq!(
            p.validate(),
            Err(PlanError::NonContiguousSteps { expected: 2, found: 3 })
        );
    }

    #[test]
    fn test_rejects_missing_gather() {
        let p = plan(OutputFormat::Chat, vec![action(1, "Generate section: Answer", false)]);
        assert!(matches!(p.validate(), Err(PlanError::MissingGatherStep(_))));
        assert_eq!(plan(OutputFormat::Chat, vec![]).validate(), Err(PlanError::NoActions));
    }

    #[test]
    fn test_rejects_approval_rules() {
        let missing = plan(OutputFormat::Slides, vec![action(1, GATHER_ACTION, false)]);
        assert_eq!(missing.validate(), Err(PlanError::MissingApprovalStep));

        let unexpected = plan(
            OutputFormat::Chat,
            vec![action(1, GATHER_ACTION, false), action(2, "Send", true)],
        );
        assert_eq!(unexpected.validate(), Err(PlanError::UnexpectedApprovalStep(2)));
    }

    #[test]
    fn test_plan_json_shape() {
        let p = plan(OutputFormat::Chat, vec![action(1, GATHER_ACTION, false)]);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["planId"], "test-plan");
        assert_eq!(json["structure"]["outputFormat"], "chat");
        assert_eq!(json["actions"][0]["requiresApproval"], false);
    }
}
