//! docplan - Request Classification and Execution Planning
//!
//! CLI entry point for classifying requests and managing execution plans.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use colored::*;
use eyre::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use docplan::classify::{LlmOracle, NullOracle, OracleClassifier, TaskClassifier};
use docplan::cli::{Cli, Command, Format, generate_after_help};
use docplan::config::Config;
use docplan::domain::{ContextHint, ExecutionPlan, Methodology, PlanRecord, PlanStatus, Specialist, TaskCategory};
use docplan::llm::{LlmClient, create_client};
use docplan::orchestrator::{FileContextProvider, Orchestrator, OutlineArtifactGenerator, PlanModifications};
use docplan::planning::PlanEnhancer;
use docplan::prompts::PromptLoader;
use docplan::state::StateManager;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docplan")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("docplan.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(model = %config.llm.model, oracle = config.llm.has_api_key(), "docplan loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Classify {
            query,
            specialist,
            entity,
            format,
        }) => {
            debug!(%query, ?specialist, ?entity, "main: matched Classify command");
            cmd_classify(&config, &query, specialist, entity, format).await
        }
        Some(Command::Plan {
            query,
            entity,
            methodology,
            format,
        }) => {
            debug!(%query, ?entity, ?methodology, "main: matched Plan command");
            cmd_plan(&config, &query, entity.as_deref(), methodology.as_deref(), format).await
        }
        Some(Command::Approve { plan_id }) => {
            debug!(%plan_id, "main: matched Approve command");
            cmd_approve(&config, &plan_id).await
        }
        Some(Command::Execute { plan_id, modifications }) => {
            debug!(%plan_id, ?modifications, "main: matched Execute command");
            cmd_execute(&config, &plan_id, modifications.as_deref()).await
        }
        Some(Command::Show { plan_id, format }) => {
            debug!(%plan_id, "main: matched Show command");
            cmd_show(&config, &plan_id, format).await
        }
        Some(Command::List { status }) => {
            debug!(?status, "main: matched List command");
            cmd_list(&config, status).await
        }
        Some(Command::Catalog) => {
            debug!("main: matched Catalog command");
            cmd_catalog()
        }
        None => {
            debug!("main: no command, printing help");
            Cli::command().after_help(generate_after_help()).print_help()?;
            println!();
            Ok(())
        }
    }
}

/// LLM client when an API key is configured
fn llm_client(config: &Config) -> Option<Arc<dyn LlmClient>> {
    if !config.llm.has_api_key() {
        debug!(env = %config.llm.api_key_env, "llm_client: no API key, model features disabled");
        return None;
    }
    match create_client(&config.llm) {
        Ok(client) => Some(client),
        Err(e) => {
            warn!(error = %e, "Failed to create LLM client, model features disabled");
            None
        }
    }
}

fn build_classifier(config: &Config, llm: Option<Arc<dyn LlmClient>>, prompts: &PromptLoader) -> TaskClassifier {
    let oracle: Arc<dyn OracleClassifier> = match llm {
        Some(client) => match LlmOracle::new(client, &config.oracle, prompts) {
            Ok(oracle) => Arc::new(oracle),
            Err(e) => {
                warn!(error = %e, "Failed to build oracle, using deterministic classification");
                Arc::new(NullOracle)
            }
        },
        None => Arc::new(NullOracle),
    };
    TaskClassifier::new(oracle)
}

fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    debug!("build_orchestrator: called");
    let prompts = Arc::new(PromptLoader::new(Config::prompts_dir()));
    let llm = llm_client(config);
    let classifier = build_classifier(config, llm.clone(), &prompts);

    let state = StateManager::spawn(&config.storage.store_dir).context("Failed to open plan store")?;
    let context = Arc::new(FileContextProvider::new(&config.context.dir));
    let generator = Arc::new(OutlineArtifactGenerator::new(&config.artifacts.dir));

    let mut orchestrator = Orchestrator::new(classifier, context, generator, state);
    if let Some(client) = llm
        && config.planner.enhance
    {
        orchestrator = orchestrator.with_enhancer(PlanEnhancer::new(client, prompts, &config.planner));
    }
    Ok(orchestrator)
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
    serde_yaml::from_str(&content).context(format!("Failed to parse {}", path.display()))
}

async fn cmd_classify(
    config: &Config,
    query: &str,
    specialist: Option<Specialist>,
    entity: Option<String>,
    format: Format,
) -> Result<()> {
    let prompts = PromptLoader::new(Config::prompts_dir());
    let classifier = build_classifier(config, llm_client(config), &prompts);

    let mut hint = ContextHint::default();
    if let Some(specialist) = specialist {
        hint = hint.with_specialist(specialist);
    }
    if let Some(entity) = entity {
        hint = hint.with_entity(entity);
    }

    let classification = classifier.classify_traced(query, &hint).await;
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&classification)?),
        Format::Text => {
            let result = &classification.result;
            println!("Task type:   {}", result.task_type.as_str().cyan());
            println!("Confidence:  {:.2}", result.confidence);
            println!("Stage:       {}", classification.stage);
            if let Some(methodology) = &result.suggested_methodology {
                println!("Methodology: {}", methodology);
            }
            println!("Sources:     {}", result.required_sources.join(", "));
        }
    }
    Ok(())
}

async fn cmd_plan(
    config: &Config,
    query: &str,
    entity: Option<&str>,
    methodology: Option<&Path>,
    format: Format,
) -> Result<()> {
    let methodology: Option<Methodology> = methodology.map(read_yaml).transpose()?;
    let orchestrator = build_orchestrator(config)?;

    let plan = orchestrator.create_plan(query, entity, methodology.as_ref()).await?;
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
        Format::Text => {
            print_plan(&plan);
            println!();
            println!("{} Plan created: {}", "✓".green(), plan.plan_id.cyan());
            println!("Approve with: dp approve {}", plan.plan_id);
        }
    }
    Ok(())
}

async fn cmd_approve(config: &Config, plan_id: &str) -> Result<()> {
    let orchestrator = build_orchestrator(config)?;
    let record = orchestrator.approve(plan_id).await?;
    println!("{} Approved plan: {}", "✓".green(), record.id().cyan());
    Ok(())
}

async fn cmd_execute(config: &Config, plan_id: &str, modifications: Option<&Path>) -> Result<()> {
    let modifications: Option<PlanModifications> = modifications.map(read_yaml).transpose()?;
    let orchestrator = build_orchestrator(config)?;

    let artifact = orchestrator.execute(plan_id, modifications).await?;
    println!(
        "{} Generated {}: {}",
        "✓".green(),
        artifact.output_format.artifact_kind(),
        artifact.location.cyan()
    );
    Ok(())
}

async fn cmd_show(config: &Config, plan_id: &str, format: Format) -> Result<()> {
    let orchestrator = build_orchestrator(config)?;
    let record = orchestrator.get_plan(plan_id).await?;
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        Format::Text => {
            println!("Status: {}", colored_status(record.status));
            println!("Query:  {}", record.query);
            if let Some(entity) = &record.entity_id {
                println!("Entity: {}", entity);
            }
            if let Some(error) = &record.error {
                println!("Error:  {}", error.red());
            }
            if let Some(artifact) = &record.artifact {
                println!("Output: {}", artifact.location);
            }
            println!();
            print_plan(&record.plan);
        }
    }
    Ok(())
}

async fn cmd_list(config: &Config, status: Option<PlanStatus>) -> Result<()> {
    let orchestrator = build_orchestrator(config)?;
    let records = orchestrator.list_plans(status).await?;
    if records.is_empty() {
        println!("No plans found");
        return Ok(());
    }
    for record in &records {
        print_record_line(record);
    }
    Ok(())
}

fn cmd_catalog() -> Result<()> {
    for category in TaskCategory::ALL.iter() {
        println!("{}", category.label().bold());
        for task_type in category.task_types() {
            println!(
                "  {:<28} {:<7} {}",
                task_type.as_str().cyan(),
                task_type.output_format().to_string(),
                task_type.description().dimmed()
            );
        }
        println!();
    }
    Ok(())
}

fn colored_status(status: PlanStatus) -> ColoredString {
    let text = status.to_string();
    match status {
        PlanStatus::Pending => text.yellow(),
        PlanStatus::Executing => text.blue(),
        PlanStatus::Completed => text.green(),
        PlanStatus::Failed => text.red(),
    }
}

fn print_record_line(record: &PlanRecord) {
    let approved = if record.approved { "approved" } else { "" };
    println!(
        "{}  {:<10} {:<8} {}",
        record.id().cyan(),
        colored_status(record.status).to_string(),
        approved,
        record.plan.title
    );
}

fn print_plan(plan: &ExecutionPlan) {
    println!("{}", plan.title.bold());
    println!("Task type:   {}", plan.task_type);
    println!("Destination: {}", plan.destination.target);
    println!("Length:      {}", plan.structure.estimated_length);

    let inputs = plan
        .inputs
        .knowledge_base
        .iter()
        .chain(&plan.inputs.platform_data)
        .chain(&plan.inputs.external_sources);
    let mut first = true;
    for input in inputs {
        if first {
            println!();
            println!("{}", "Inputs".bold());
            first = false;
        }
        println!("  - {}", input);
    }

    println!();
    println!("{}", "Sections".bold());
    for (idx, section) in plan.structure.sections.iter().enumerate() {
        println!("  {}. {}", idx + 1, section.name);
    }

    println!();
    println!("{}", "Actions".bold());
    for action in &plan.actions {
        let marker = if action.requires_approval { " (requires approval)".yellow() } else { "".normal() };
        println!("  {}. {}{}", action.step, action.action, marker);
    }

    if !plan.review_notes.is_empty() {
        println!();
        println!("{}", "Review notes".bold());
        for note in &plan.review_notes {
            println!("  - {}", note);
        }
    }
}
