//! File-backed context provider and outline generator used by the CLI

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use eyre::{Context, Result, eyre};
use tracing::debug;

use super::{ArtifactGenerator, ContextProvider};
use crate::domain::{AggregatedContext, ExecutionPlan, GeneratedArtifact, TaskType, generate_id, now_ms};

const CONTEXT_EXTENSIONS: &[&str] = &["yml", "yaml", "json"];

/// Reads `<dir>/<entity>.yml|.yaml|.json`; a missing file is an empty context
#[derive(Debug, Clone)]
pub struct FileContextProvider {
    dir: PathBuf,
}

impl FileContextProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn find(&self, entity_id: &str) -> Option<PathBuf> {
        CONTEXT_EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{}.{}", entity_id, ext)))
            .find(|path| path.is_file())
    }
}

/// Entity ids become file names, so they must be a single path component
fn check_entity_id(entity_id: &str) -> Result<()> {
    let single = Path::new(entity_id).file_name().is_some_and(|name| name == entity_id);
    if entity_id.trim().is_empty() || !single {
        return Err(eyre!("Invalid entity id: '{}'", entity_id));
    }
    Ok(())
}

#[async_trait]
impl ContextProvider for FileContextProvider {
    async fn aggregate(&self, task_type: TaskType, entity_id: Option<&str>, _query: &str) -> Result<AggregatedContext> {
        debug!(%task_type, ?entity_id, dir = %self.dir.display(), "FileContextProvider::aggregate: called");
        let Some(entity_id) = entity_id else {
            return Ok(AggregatedContext::default());
        };
        check_entity_id(entity_id)?;

        let Some(path) = self.find(entity_id) else {
            debug!(%entity_id, "FileContextProvider::aggregate: no context file, using empty context");
            return Ok(AggregatedContext::default());
        };

        let content = tokio::fs::read_to_string(&path)
            .await
            .context(format!("Failed to read context file: {}", path.display()))?;
        let context = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).context(format!("Failed to parse context file: {}", path.display()))?
        } else {
            serde_yaml::from_str(&content).context(format!("Failed to parse context file: {}", path.display()))?
        };
        Ok(context)
    }
}

/// Writes a markdown outline of the plan to `<dir>/<plan-id>.md`
#[derive(Debug, Clone)]
pub struct OutlineArtifactGenerator {
    dir: PathBuf,
}

impl OutlineArtifactGenerator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ArtifactGenerator for OutlineArtifactGenerator {
    async fn generate(&self, plan: &ExecutionPlan, context: &AggregatedContext) -> Result<GeneratedArtifact> {
        debug!(plan_id = %plan.plan_id, dir = %self.dir.display(), "OutlineArtifactGenerator::generate: called");
        tokio::fs::create_dir_all(&self.dir)
            .await
            .context(format!("Failed to create artifact directory: {}", self.dir.display()))?;

        let path = self.dir.join(format!("{}.md", plan.plan_id));
        tokio::fs::write(&path, render_outline(plan, context))
            .await
            .context(format!("Failed to write artifact: {}", path.display()))?;

        Ok(GeneratedArtifact {
            id: generate_id("artifact", &plan.title),
            plan_id: plan.plan_id.clone(),
            output_format: plan.structure.output_format,
            location: path.display().to_string(),
            created_at: now_ms(),
        })
    }
}

fn push_list(out: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push_str(&format!("### {}\n\n", heading));
    for item in items {
        out.push_str(&format!("- {}\n", item));
    }
    out.push('\n');
}

/// Markdown outline of a plan
pub fn render_outline(plan: &ExecutionPlan, context: &AggregatedContext) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", plan.title));
    out.push_str(&format!("- Task type: {}\n", plan.task_type));
    out.push_str(&format!("- Destination: {}\n", plan.destination.target));
    out.push_str(&format!("- Estimated length: {}\n", plan.structure.estimated_length));
    out.push_str(&format!("- Context: {}\n\n", context.summary()));

    let inputs = &plan.inputs;
    if !(inputs.knowledge_base.is_empty() && inputs.platform_data.is_empty() && inputs.external_sources.is_empty()) {
        out.push_str("## Inputs\n\n");
        push_list(&mut out, "Knowledge base", &inputs.knowledge_base);
        push_list(&mut out, "Platform data", &inputs.platform_data);
        push_list(&mut out, "External sources", &inputs.external_sources);
    }

    out.push_str("## Sections\n\n");
    for (idx, section) in plan.structure.sections.iter().enumerate() {
        out.push_str(&format!("### {}. {}\n\n", idx + 1, section.name));
        if !section.description.is_empty() {
            out.push_str(&format!("{}\n\n", section.description));
        }
        if !section.data_sources.is_empty() {
            out.push_str(&format!("Data sources: {}\n\n", section.data_sources.join(", ")));
        }
    }

    if !plan.review_notes.is_empty() {
        out.push_str("## Review notes\n\n");
        for note in &plan.review_notes {
            out.push_str(&format!("- {}\n", note));
        }
    }

    out
}
