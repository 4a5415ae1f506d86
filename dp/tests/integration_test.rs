//! Integration tests for docplan
//!
//! These tests drive the public API end to end: classification through plan
//! synthesis, approval, execution and persistence.

use std::sync::Arc;

use docplan::classify::{LlmOracle, Stage, TaskClassifier};
use docplan::config::OracleConfig;
use docplan::domain::{
    AggregatedContext, ContextHint, Methodology, MethodologyStep, OutputFormat, PlanStatus, TaskClassificationResult,
    TaskType,
};
use docplan::llm::client::mock::MockLlmClient;
use docplan::orchestrator::{FileContextProvider, Orchestrator, OutlineArtifactGenerator, PlanModifications};
use docplan::planning::synthesize;
use docplan::prompts::PromptLoader;
use docplan::state::{StateError, StateManager};
use tempfile::TempDir;

const ACME_YAML: &str = r#"
customer:
  name: Acme Corp
  health-score: 62
  arr: 1250000
health-trend:
  - { date: "2026-01-01", score: 80 }
  - { date: "2026-04-01", score: 62 }
risk-signals:
  - severity: high
    description: Executive sponsor left
"#;

fn llm_classifier(replies: MockLlmClient) -> TaskClassifier {
    let oracle = LlmOracle::new(Arc::new(replies), &OracleConfig::default(), &PromptLoader::embedded_only())
        .expect("Failed to build oracle");
    TaskClassifier::new(Arc::new(oracle))
}

struct Fixture {
    temp: TempDir,
    orchestrator: Orchestrator,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let context_dir = temp.path().join("context");
        std::fs::create_dir_all(&context_dir).unwrap();
        std::fs::write(context_dir.join("acme.yml"), ACME_YAML).unwrap();

        let orchestrator = Self::orchestrator(&temp);
        Self { temp, orchestrator }
    }

    fn orchestrator(temp: &TempDir) -> Orchestrator {
        let state = StateManager::spawn(temp.path().join("plans")).expect("Failed to spawn state manager");
        Orchestrator::new(
            TaskClassifier::deterministic(),
            Arc::new(FileContextProvider::new(temp.path().join("context"))),
            Arc::new(OutlineArtifactGenerator::new(temp.path().join("artifacts"))),
            state,
        )
    }
}

// =============================================================================
// Classification Tests
// =============================================================================

#[tokio::test]
async fn test_renewal_forecast_is_accepted_with_methodology() {
    let classifier = TaskClassifier::deterministic();
    let traced = classifier
        .classify_traced("Prepare the renewal forecast for Acme", &ContextHint::default())
        .await;

    assert_eq!(traced.result.task_type, TaskType::RenewalForecast);
    assert!(traced.result.confidence >= 0.7);
    assert_eq!(
        traced.result.suggested_methodology.as_deref(),
        Some("renewal_forecast_methodology")
    );
    assert_eq!(
        traced.result.required_sources,
        TaskType::RenewalForecast
            .required_sources()
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_create_and_generate_qbr_agree() {
    let classifier = TaskClassifier::deterministic();
    let hint = ContextHint::default();

    let create = classifier.classify("create a QBR", &hint).await;
    let generate = classifier.classify("generate a QBR", &hint).await;
    assert_eq!(create.task_type, TaskType::QbrGeneration);
    assert_eq!(create.task_type, generate.task_type);
}

#[tokio::test]
async fn test_failing_oracle_yields_fallback() {
    let classifier = llm_classifier(MockLlmClient::failing());
    let result = classifier.classify("xyzzy plugh frobnicate", &ContextHint::default()).await;

    assert_eq!(result, TaskClassificationResult::fallback());
    assert_eq!(result.task_type, TaskType::Custom);
    assert_eq!(result.confidence, 0.3);
    assert!(result.suggested_methodology.is_none());
    assert_eq!(result.required_sources, vec!["knowledge_base", "customer_360"]);
}

#[tokio::test]
async fn test_oracle_reply_decides_unknown_request() {
    let classifier = llm_classifier(MockLlmClient::new(vec!["account_plan|0.85"]));
    let traced = classifier
        .classify_traced("xyzzy plugh frobnicate", &ContextHint::default())
        .await;

    assert_eq!(traced.stage, Stage::OraclePrimary);
    assert_eq!(traced.result.task_type, TaskType::AccountPlan);
    assert!((traced.result.confidence - 0.85).abs() < 1e-9);
}

// =============================================================================
// Planning Tests
// =============================================================================

#[test]
fn test_plan_for_every_task_type_is_valid() {
    let context: AggregatedContext = serde_yaml::from_str(ACME_YAML).unwrap();
    for task_type in TaskType::ALL.iter() {
        let plan = synthesize(*task_type, &context, None);
        assert!(plan.validate().is_ok(), "{} produced an invalid plan", task_type);
        assert_eq!(plan.structure.output_format, task_type.output_format());

        let steps: Vec<u32> = plan.actions.iter().map(|a| a.step).collect();
        let expected: Vec<u32> = (1..=plan.actions.len() as u32).collect();
        assert_eq!(steps, expected);

        let needs_approval = plan.actions.iter().any(|a| a.requires_approval);
        assert_eq!(needs_approval, task_type.output_format().creates_artifact());
    }
}

#[test]
fn test_plan_is_deterministic_apart_from_id() {
    let context: AggregatedContext = serde_yaml::from_str(ACME_YAML).unwrap();
    let a = synthesize(TaskType::QbrGeneration, &context, None);
    let b = synthesize(TaskType::QbrGeneration, &context, None);

    assert_ne!(a.plan_id, b.plan_id);
    assert_eq!(a.structure, b.structure);
    assert_eq!(a.actions, b.actions);
    assert_eq!(a.inputs, b.inputs);
    assert_eq!(a.destination, b.destination);
}

// =============================================================================
// Orchestrator Tests
// =============================================================================

#[tokio::test]
async fn test_plan_approve_execute_lifecycle() {
    let fixture = Fixture::new();
    let orchestrator = &fixture.orchestrator;

    let plan = orchestrator
        .create_plan("prepare the QBR for Acme", Some("acme"), None)
        .await
        .expect("Failed to create plan");
    assert_eq!(plan.task_type, TaskType::QbrGeneration);
    assert_eq!(plan.structure.output_format, OutputFormat::Slides);
    assert_eq!(
        plan.destination.target,
        "Google Slides: Acme Corp - Quarterly Business Review"
    );

    // Not approved yet
    let err = orchestrator.execute(&plan.plan_id, None).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<StateError>(),
        Some(&StateError::NotApproved(plan.plan_id.clone()))
    );
    let record = orchestrator.get_plan(&plan.plan_id).await.unwrap();
    assert_eq!(record.status, PlanStatus::Pending);

    orchestrator.approve(&plan.plan_id).await.unwrap();
    let artifact = orchestrator.execute(&plan.plan_id, None).await.unwrap();
    assert_eq!(artifact.plan_id, plan.plan_id);
    assert_eq!(artifact.output_format, OutputFormat::Slides);

    let outline = std::fs::read_to_string(&artifact.location).unwrap();
    assert!(outline.starts_with("# Quarterly Business Review\n"));
    assert!(outline.contains("Acme Corp"));

    let record = orchestrator.get_plan(&plan.plan_id).await.unwrap();
    assert_eq!(record.status, PlanStatus::Completed);
    assert_eq!(record.artifact, Some(artifact));

    // Completed plans are terminal
    assert!(orchestrator.execute(&plan.plan_id, None).await.is_err());
}

#[tokio::test]
async fn test_methodology_and_modifications() {
    let fixture = Fixture::new();
    let orchestrator = &fixture.orchestrator;

    let methodology = Methodology {
        name: "renewal_forecast_methodology".to_string(),
        steps: vec![
            MethodologyStep {
                name: "Contract review".to_string(),
                description: "Terms and dates".to_string(),
                data_needed: vec!["contract_terms".to_string()],
            },
            MethodologyStep {
                name: "Outlook".to_string(),
                description: String::new(),
                data_needed: Vec::new(),
            },
        ],
    };

    let plan = orchestrator
        .create_plan("renewal forecast for acme", Some("acme"), Some(&methodology))
        .await
        .unwrap();
    let names: Vec<&str> = plan.structure.sections.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Contract review", "Outlook"]);

    orchestrator.approve(&plan.plan_id).await.unwrap();
    let mods: PlanModifications = serde_yaml::from_str("destination-target: Shared drive: forecasts").unwrap();
    orchestrator.execute(&plan.plan_id, Some(mods)).await.unwrap();

    let record = orchestrator.get_plan(&plan.plan_id).await.unwrap();
    assert_eq!(record.plan.destination.target, "Shared drive: forecasts");
}

#[tokio::test]
async fn test_plans_survive_restart() {
    let fixture = Fixture::new();
    let plan = fixture
        .orchestrator
        .create_plan("create a QBR", Some("acme"), None)
        .await
        .unwrap();
    fixture.orchestrator.approve(&plan.plan_id).await.unwrap();

    let reopened = Fixture::orchestrator(&fixture.temp);
    let record = reopened.get_plan(&plan.plan_id).await.unwrap();
    assert_eq!(record.status, PlanStatus::Pending);
    assert!(record.approved);
    assert_eq!(record.plan, plan);

    let pending = reopened.list_plans(Some(PlanStatus::Pending)).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert!(reopened.list_plans(Some(PlanStatus::Completed)).await.unwrap().is_empty());
}
