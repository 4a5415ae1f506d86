//! Execution planning
//!
//! Synthesizes a reviewable plan from a task type and aggregated context,
//! optionally reviewed by the model before it is persisted.

mod enhancer;
pub mod sections;
mod synthesizer;

pub use enhancer::{EnhanceError, KEEP, PlanEnhancer, Suggestion, applies_to};
pub use sections::{default_plan_sections, default_sections, estimated_length};
pub use synthesizer::{build_actions, build_destination, build_sections, synthesize};
