//! Prompt Loader
//!
//! Loads prompt templates from an override directory or falls back to the
//! embedded defaults, then renders them with Handlebars.

use std::path::PathBuf;

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;
use crate::domain::{TaskCategory, TaskType};

/// One catalog entry as shown to the oracle
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub description: &'static str,
}

/// Catalog entries of one category
#[derive(Debug, Clone, Serialize)]
pub struct CatalogGroup {
    pub label: &'static str,
    pub types: Vec<CatalogEntry>,
}

/// Context for the `classify` template
#[derive(Debug, Clone, Serialize)]
pub struct ClassifyPromptContext {
    pub categories: Vec<CatalogGroup>,
}

impl ClassifyPromptContext {
    /// The full task-type catalog grouped by category, in declaration order
    pub fn catalog() -> Self {
        let categories = TaskCategory::ALL
            .iter()
            .map(|category| CatalogGroup {
                label: category.label(),
                types: category
                    .task_types()
                    .into_iter()
                    .map(|tt| CatalogEntry {
                        name: tt.as_str(),
                        description: tt.description(),
                    })
                    .collect(),
            })
            .collect();
        Self { categories }
    }
}

/// Context for the `enhance` template
#[derive(Debug, Clone, Serialize)]
pub struct EnhancePromptContext {
    pub task_type: String,
    pub output_format: String,
    pub title: String,
    pub sections: Vec<String>,
    pub context_summary: String,
}

impl EnhancePromptContext {
    pub fn new(task_type: TaskType, title: &str, sections: Vec<String>, context_summary: String) -> Self {
        Self {
            task_type: task_type.as_str().to_string(),
            output_format: task_type.output_format().artifact_kind().to_string(),
            title: title.to_string(),
            sections,
            context_summary,
        }
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory (e.g., `~/.config/docplan/prompts/`)
    user_dir: Option<PathBuf>,
}

impl Default for PromptLoader {
    fn default() -> Self {
        Self::embedded_only()
    }
}

impl PromptLoader {
    /// Create a loader that prefers `{dir}/{name}.pmt` when it exists
    pub fn new(user_dir: Option<PathBuf>) -> Self {
        let user_dir = user_dir.filter(|dir| dir.exists());
        debug!(?user_dir, "PromptLoader::new: called");
        Self {
            hbs: Self::engine(),
            user_dir,
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            user_dir: None,
        }
    }

    // Prompts are plain text, so HTML escaping would mangle quotes and ampersands
    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks the user override directory first, then the embedded prompts.
    pub fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(ref user_dir) = self.user_dir {
            let path = user_dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found in user override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read user prompt {}: {}", path.display(), e));
            }
        }

        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    /// Oracle system prompt listing the whole catalog
    pub fn classify_prompt(&self) -> Result<String> {
        self.render("classify", &ClassifyPromptContext::catalog())
    }

    /// Enhancer system prompt
    pub fn enhance_prompt(&self, context: &EnhancePromptContext) -> Result<String> {
        self.render("enhance", context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_classify_prompt_lists_every_type() {
        let prompt = PromptLoader::embedded_only().classify_prompt().unwrap();
        for tt in TaskType::ALL {
            assert!(prompt.contains(&format!("- {}: ", tt.as_str())), "missing {}", tt);
        }
        assert!(prompt.contains("## Renewal"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_enhance_prompt_renders_without_escaping() {
        let ctx = EnhancePromptContext::new(
            TaskType::QbrGeneration,
            "Quarterly Business Review: Smith & Sons",
            vec!["Executive Summary".to_string(), "Wins & Highlights".to_string()],
            "Customer: Smith & Sons".to_string(),
        );
        let prompt = PromptLoader::embedded_only().enhance_prompt(&ctx).unwrap();
        assert!(prompt.contains("Task type: qbr_generation"));
        assert!(prompt.contains("- Wins & Highlights"));
        assert!(prompt.contains("Customer: Smith & Sons"));
        assert!(prompt.contains("presentation"));
    }

    #[test]
    fn test_user_override_wins() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("classify.pmt"), "custom catalog: {{#each categories}}{{this.label}} {{/each}}")
            .unwrap();

        let loader = PromptLoader::new(Some(dir.path().to_path_buf()));
        let prompt = loader.classify_prompt().unwrap();
        assert!(prompt.starts_with("custom catalog: Onboarding"));

        // Templates not overridden still come from the embedded set
        assert!(loader.load_template("enhance").unwrap().contains("KEEP"));
    }

    #[test]
    fn test_unknown_template() {
        assert!(PromptLoader::embedded_only().load_template("nonexistent-template").is_err());
    }
}
