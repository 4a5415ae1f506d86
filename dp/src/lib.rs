//! docplan - Request Classification and Execution Planning
//!
//! docplan turns a free-text customer-success request ("prepare the QBR for
//! Acme") into a reviewable execution plan for the document that answers it.
//!
//! # Core Concepts
//!
//! - **Cascade Classification**: phrase table, keyword scoring with a
//!   specialist boost, then an optional LLM oracle for ambiguous requests
//! - **Plans Before Artifacts**: every plan is persisted as pending and must
//!   be approved before anything is generated
//! - **Serialized State**: a single actor owns the plan store, so status
//!   changes are compare-and-set
//!
//! # Modules
//!
//! - [`classify`] - Classification cascade and oracle
//! - [`planning`] - Plan synthesis and optional model review
//! - [`orchestrator`] - Classify, plan, approve and execute workflow
//! - [`state`] - Plan store and state actor
//! - [`llm`] - LLM client trait and Anthropic implementation
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod classify;
pub mod cli;
pub mod config;
pub mod domain;
pub mod llm;
pub mod orchestrator;
pub mod planning;
pub mod prompts;
pub mod state;

// Re-export commonly used types
pub use classify::{Classification, LlmOracle, NullOracle, OracleClassifier, Stage, TaskClassifier};
pub use config::{Config, LlmConfig};
pub use domain::{
    AggregatedContext, ContextHint, ExecutionPlan, GeneratedArtifact, Methodology, OutputFormat, PlanRecord,
    PlanStatus, Specialist, TaskClassificationResult, TaskType,
};
pub use llm::{AnthropicClient, CompletionRequest, CompletionResponse, LlmClient, LlmError, create_client};
pub use orchestrator::{
    ArtifactGenerator, ContextProvider, FileContextProvider, Orchestrator, OutlineArtifactGenerator, PlanModifications,
};
pub use planning::{PlanEnhancer, synthesize};
pub use prompts::PromptLoader;
pub use state::{StateError, StateManager};
