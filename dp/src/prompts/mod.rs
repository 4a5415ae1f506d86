//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files for the oracle classifier
//! and the plan enhancer.
//!
//! Template loading chain:
//! 1. `{override-dir}/{name}.pmt` (user override)
//! 2. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{CatalogEntry, CatalogGroup, ClassifyPromptContext, EnhancePromptContext, PromptLoader};
