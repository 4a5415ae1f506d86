//! Domain types for docplan
//!
//! The task type catalog, classification results, the aggregated context the
//! planner reads, execution plans, and the persisted plan record.

mod classification;
mod context;
mod id;
mod methodology;
mod plan;
mod record;
mod task_type;

pub use classification::{ContextHint, FALLBACK_CONFIDENCE, TaskClassificationResult, clamp_confidence};
pub use context::{
    AggregatedContext, ArtifactRef, CustomerSnapshot, HealthPoint, KnowledgeHit, KnowledgeKind, RenewalForecast,
    RiskSignal, Severity, ThreadRef, TrendDirection, percent, trend_direction,
};
pub use id::{generate_id, now_ms};
pub use methodology::{Methodology, MethodologyStep};
pub use plan::{
    Destination, ExecutionPlan, GATHER_ACTION, PlanAction, PlanError, PlanInputs, PlanSection, PlanStructure,
};
pub use record::{GeneratedArtifact, PlanRecord, PlanStatus};
pub use task_type::{OutputFormat, Specialist, TaskCategory, TaskType, UnknownTaskType};
