//! State manager messages
//!
//! Commands and responses for the actor pattern.

use thiserror::Error;
use tokio::sync::oneshot;

use crate::domain::{ExecutionPlan, GeneratedArtifact, PlanRecord, PlanStatus};

/// Errors from state operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("Plan not found: {0}")]
    NotFound(String),

    #[error("Plan {0} has not been approved")]
    NotApproved(String),

    #[error("Plan {id} cannot move from {from} to {to}")]
    InvalidTransition { id: String, from: PlanStatus, to: PlanStatus },

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Channel error")]
    ChannelError,
}

/// Response from state operations
pub type StateResponse<T> = Result<T, StateError>;

/// Fields written together with a status change
#[derive(Debug, Clone, Default)]
pub struct TransitionUpdate {
    /// Replacement plan, e.g. after modifications were applied
    pub plan: Option<ExecutionPlan>,
    pub error: Option<String>,
    pub artifact: Option<GeneratedArtifact>,
}

/// Commands sent to the StateManager actor
#[derive(Debug)]
pub enum StateCommand {
    CreatePlan {
        record: PlanRecord,
        reply: oneshot::Sender<StateResponse<String>>,
    },
    GetPlan {
        id: String,
        reply: oneshot::Sender<StateResponse<Option<PlanRecord>>>,
    },
    ListPlans {
        status_filter: Option<PlanStatus>,
        reply: oneshot::Sender<StateResponse<Vec<PlanRecord>>>,
    },
    Approve {
        id: String,
        reply: oneshot::Sender<StateResponse<PlanRecord>>,
    },

    /// Compare-and-set status change, checked and applied inside the actor
    Transition {
        id: String,
        to: PlanStatus,
        update: TransitionUpdate,
        reply: oneshot::Sender<StateResponse<PlanRecord>>,
    },

    Shutdown,
}
