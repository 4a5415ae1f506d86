//! Plan synthesizer
//!
//! Turns a classified task type plus aggregated context into an
//! ExecutionPlan. Pure apart from the generated id and timestamp: absent
//! context fragments are skipped, never treated as errors.

use tracing::{debug, info};

use super::sections::{default_plan_sections, estimated_length};
use crate::domain::{
    AggregatedContext, Destination, ExecutionPlan, GATHER_ACTION, KnowledgeHit, KnowledgeKind, Methodology,
    OutputFormat, PlanAction, PlanInputs, PlanSection, PlanStructure, TaskType, generate_id, now_ms, percent,
    trend_direction,
};

const MAX_PLAYBOOKS: usize = 3;
const MAX_TEMPLATES: usize = 2;
const MAX_RISK_SIGNALS: usize = 3;
const MAX_PRIOR_ARTIFACTS: usize = 5;

/// Shortest task type word that counts as a title mention
const MIN_TITLE_WORD: usize = 3;

/// Build a plan for `task_type`
///
/// A methodology, when given, replaces the default section template step
/// for step.
pub fn synthesize(
    task_type: TaskType,
    context: &AggregatedContext,
    methodology: Option<&Methodology>,
) -> ExecutionPlan {
    debug!(%task_type, methodology = ?methodology.map(|m| m.name.as_str()), "synthesize: called");
    let format = task_type.output_format();
    let title = task_type.title();
    let sections = build_sections(task_type, methodology);

    let plan = ExecutionPlan {
        plan_id: generate_id("plan", &title),
        task_type,
        inputs: build_inputs(task_type, context),
        structure: PlanStructure {
            estimated_length: estimated_length(task_type, sections.len()),
            output_format: format,
            sections: sections.clone(),
        },
        actions: build_actions(&sections, format),
        destination: build_destination(format, &title, context.customer_name()),
        title,
        review_notes: Vec::new(),
        created_at: now_ms(),
    };

    info!(
        plan_id = %plan.plan_id,
        %task_type,
        sections = plan.structure.sections.len(),
        actions = plan.actions.len(),
        "Synthesized plan"
    );
    plan
}

/// Methodology steps 1:1, or the default template
pub fn build_sections(task_type: TaskType, methodology: Option<&Methodology>) -> Vec<PlanSection> {
    match methodology {
        Some(m) if !m.steps.is_empty() => m
            .steps
            .iter()
            .map(|step| PlanSection {
                name: step.name.clone(),
                description: step.description.clone(),
                data_sources: step.data_needed.clone(),
            })
            .collect(),
        _ => default_plan_sections(task_type),
    }
}

/// Gather step, one step per section, then the approval step for artifact formats
pub fn build_actions(sections: &[PlanSection], format: OutputFormat) -> Vec<PlanAction> {
    let mut actions = Vec::with_capacity(sections.len() + 2);
    actions.push(PlanAction {
        step: 1,
        action: GATHER_ACTION.to_string(),
        requires_approval: false,
    });

    for section in sections {
        actions.push(PlanAction {
            step: actions.len() as u32 + 1,
            action: format!("Generate section: {}", section.name),
            requires_approval: false,
        });
    }

    if let Some(final_action) = approval_action(format) {
        actions.push(PlanAction {
            step: actions.len() as u32 + 1,
            action: final_action.to_string(),
            requires_approval: true,
        });
    }

    actions
}

fn approval_action(format: OutputFormat) -> Option<&'static str> {
    match format {
        OutputFormat::Slides => Some("Create slide deck in Google Slides"),
        OutputFormat::Docs => Some("Create document in Google Docs"),
        OutputFormat::Sheet => Some("Create spreadsheet in Google Sheets"),
        OutputFormat::Email => Some("Draft email for review before sending"),
        OutputFormat::Chat => None,
    }
}

/// Where the output lands, named after the customer when known
pub fn build_destination(format: OutputFormat, title: &str, customer: Option<&str>) -> Destination {
    let label = match customer {
        Some(name) => format!("{} - {}", name, title),
        None => title.to_string(),
    };
    let target = match format {
        OutputFormat::Slides => format!("Google Slides: {}", label),
        OutputFormat::Docs => format!("Google Docs: {}", label),
        OutputFormat::Sheet => format!("Google Sheets: {}", label),
        OutputFormat::Email => format!("Email draft: {}", label),
        OutputFormat::Chat => "Chat response".to_string(),
    };

    Destination {
        target,
        output_format: format,
        preview_required: format.creates_artifact(),
    }
}

fn build_inputs(task_type: TaskType, context: &AggregatedContext) -> PlanInputs {
    PlanInputs {
        knowledge_base: knowledge_base_inputs(&context.knowledge),
        platform_data: platform_data_inputs(context),
        external_sources: external_source_inputs(task_type, context),
    }
}

fn top_by_relevance(hits: &[KnowledgeHit], kind: KnowledgeKind, limit: usize) -> Vec<&KnowledgeHit> {
    let mut matching: Vec<&KnowledgeHit> = hits.iter().filter(|h| h.kind == kind).collect();
    matching.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
    matching.truncate(limit);
    matching
}

fn knowledge_base_inputs(hits: &[KnowledgeHit]) -> Vec<String> {
    let playbooks = top_by_relevance(hits, KnowledgeKind::Playbook, MAX_PLAYBOOKS)
        .into_iter()
        .map(|h| format!("Playbook: {} ({}% relevant)", h.title, percent(h.relevance)));
    let templates = top_by_relevance(hits, KnowledgeKind::Template, MAX_TEMPLATES)
        .into_iter()
        .map(|h| format!("Template: {} ({}% relevant)", h.title, percent(h.relevance)));
    playbooks.chain(templates).collect()
}

fn platform_data_inputs(context: &AggregatedContext) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(customer) = &context.customer {
        let mut details = Vec::new();
        if let Some(score) = customer.health_score {
            details.push(format!("health {}/100", score));
        }
        if let Some(arr) = customer.arr {
            details.push(format!("ARR {}", format_currency(arr)));
        }
        if let Some(status) = &customer.status {
            details.push(format!("status {}", status));
        }
        if details.is_empty() {
            lines.push(format!("Customer: {}", customer.name));
        } else {
            lines.push(format!("Customer: {} ({})", customer.name, details.join(", ")));
        }
    }

    if let Some(direction) = trend_direction(&context.health_trend)
        && let (Some(first), Some(last)) = (context.health_trend.first(), context.health_trend.last())
    {
        lines.push(format!(
            "Health trend: {} ({} -> {} over {} data points)",
            direction,
            first.score.round(),
            last.score.round(),
            context.health_trend.len()
        ));
    }

    let mut risks: Vec<_> = context.risk_signals.iter().collect();
    risks.sort_by(|a, b| b.severity.cmp(&a.severity));
    for risk in risks.into_iter().take(MAX_RISK_SIGNALS) {
        lines.push(format!("[{}] {}", risk.severity, risk.description));
    }

    if let Some(forecast) = &context.renewal_forecast {
        let mut line = format!("Renewal forecast: {}% likely to renew", percent(forecast.probability));
        if let Some(outcome) = &forecast.predicted_outcome {
            line.push_str(&format!(", predicted {}", outcome));
        }
        if let Some(date) = &forecast.renewal_date {
            line.push_str(&format!(", renewal date {}", date));
        }
        lines.push(line);
    }

    lines
}

fn external_source_inputs(task_type: TaskType, context: &AggregatedContext) -> Vec<String> {
    let kind = task_type.output_format().artifact_kind();
    let type_words: Vec<&str> = task_type
        .as_str()
        .split('_')
        .filter(|w| w.len() >= MIN_TITLE_WORD)
        .collect();

    let mut sources: Vec<String> = context
        .prior_artifacts
        .iter()
        .filter(|artifact| {
            let title = artifact.title.to_lowercase();
            artifact.kind.eq_ignore_ascii_case(kind) || type_words.iter().any(|w| title.contains(w))
        })
        .take(MAX_PRIOR_ARTIFACTS)
        .map(|artifact| format!("Prior {}: {}", artifact.kind, artifact.title))
        .collect();

    if !context.communication_threads.is_empty() {
        sources.push(format!(
            "{} recent communication threads",
            context.communication_threads.len()
        ));
    }

    sources
}

/// Whole-dollar amount with thousands separators
fn format_currency(amount: f64) -> String {
    let whole = amount.round() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if whole < 0 { format!("-${}", grouped) } else { format!("${}", grouped) }
}
