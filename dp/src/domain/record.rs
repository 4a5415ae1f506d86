//! Persisted plan record
//!
//! Wraps an ExecutionPlan with the orchestrator-owned lifecycle state.

use serde::{Deserialize, Serialize};

use super::id::now_ms;
use super::plan::ExecutionPlan;
use super::task_type::OutputFormat;

/// Plan status in the orchestrator workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    /// Created, waiting for approval and execution
    #[default]
    Pending,
    /// Artifact generation in progress
    Executing,
    /// Artifact generated
    Completed,
    /// Execution failed; a human must re-trigger
    Failed,
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Executing => write!(f, "executing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for PlanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "executing" => Ok(Self::Executing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("Unknown plan status: '{}'", other)),
        }
    }
}

impl PlanStatus {
    /// Completed and failed plans never move again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether the state machine allows `self -> next`
    pub fn can_transition_to(&self, next: PlanStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Executing) | (Self::Executing, Self::Completed) | (Self::Executing, Self::Failed)
        )
    }
}

/// Artifact produced by the external generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedArtifact {
    pub id: String,
    pub plan_id: String,
    pub output_format: OutputFormat,
    /// URL or path of the created artifact
    pub location: String,
    pub created_at: i64,
}

/// A plan plus its lifecycle state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRecord {
    pub plan: ExecutionPlan,

    /// Query the plan was created from
    pub query: String,

    /// Entity the plan concerns
    pub entity_id: Option<String>,

    pub status: PlanStatus,

    /// Human approval gate for execution
    pub approved: bool,

    pub approved_at: Option<i64>,

    /// Captured error message when status is Failed
    pub error: Option<String>,

    /// Result of a completed execution
    pub artifact: Option<GeneratedArtifact>,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,

    /// Last update timestamp (Unix milliseconds)
    pub updated_at: i64,
}

impl PlanRecord {
    /// Wrap a freshly synthesized plan in pending state
    pub fn new(plan: ExecutionPlan, query: impl Into<String>, entity_id: Option<String>) -> Self {
        let now = now_ms();
        Self {
            plan,
            query: query.into(),
            entity_id,
            status: PlanStatus::Pending,
            approved: false,
            approved_at: None,
            error: None,
            artifact: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.plan.plan_id
    }

    /// Update the status
    pub fn set_status(&mut self, status: PlanStatus) {
        self.status = status;
        self.updated_at = now_ms();
    }

    /// Mark approved by a human reviewer
    pub fn approve(&mut self) {
        let now = now_ms();
        self.approved = true;
        self.approved_at = Some(now);
        self.updated_at = now;
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Pending and approved: ready to move into executing
    pub fn is_executable(&self) -> bool {
        self.status == PlanStatus::Pending && self.approved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        assert!(PlanStatus::Pending.can_transition_to(PlanStatus::Executing));
        assert!(PlanStatus::Executing.can_transition_to(PlanStatus::Completed));
        assert!(PlanStatus::Executing.can_transition_to(PlanStatus::Failed));

        assert!(!PlanStatus::Pending.can_transition_to(PlanStatus::Completed));
        assert!(!PlanStatus::Failed.can_transition_to(PlanStatus::Executing));
        assert!(!PlanStatus::Completed.can_transition_to(PlanStatus::Executing));
        assert!(!PlanStatus::Executing.can_transition_to(PlanStatus::Executing));
    }

    #[test]
    fn test_status_terminal() {
        assert!(!PlanStatus::Pending.is_terminal());
        assert!(!PlanStatus::Executing.is_terminal());
        assert!(PlanStatus::Completed.is_terminal());
        assert!(PlanStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_display_and_parse() {
        for status in [
            PlanStatus::Pending,
            PlanStatus::Executing,
            PlanStatus::Completed,
            PlanStatus::Failed,
        ] {
            assert_eq!(status.to_string().parse::<PlanStatus>(), Ok(status));
        }
        assert!("draft".parse::<PlanStatus>().is_err());
    }
}
