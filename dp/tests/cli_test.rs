//! CLI smoke tests for the `dp` binary

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `dp` pointed at a throwaway config, store and log directory
fn dp(temp: &TempDir) -> Command {
    let config = temp.path().join("docplan.yml");
    if !config.exists() {
        write_config(temp.path(), &config);
    }

    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("dp").expect("dp test binary should build");
    cmd.env("XDG_DATA_HOME", temp.path().join("data"))
        .env("HOME", temp.path())
        .arg("--config")
        .arg(&config);
    cmd
}

fn write_config(root: &Path, config: &Path) {
    let yaml = format!(
        concat!(
            "llm:\n  api-key-env: DOCPLAN_CLI_TEST_KEY_NEVER_SET\n",
            "storage:\n  store-dir: {}\n",
            "context:\n  dir: {}\n",
            "artifacts:\n  dir: {}\n",
        ),
        root.join("plans").display(),
        root.join("context").display(),
        root.join("artifacts").display(),
    );
    std::fs::write(config, yaml).expect("Failed to write config");
}

#[test]
fn test_catalog_lists_every_category() {
    let temp = TempDir::new().unwrap();
    dp(&temp)
        .arg("catalog")
        .assert()
        .success()
        .stdout(predicate::str::contains("Renewal specialist"))
        .stdout(predicate::str::contains("qbr_generation"))
        .stdout(predicate::str::contains("custom"));
}

#[test]
fn test_classify_json() {
    let temp = TempDir::new().unwrap();
    let output = dp(&temp)
        .args(["classify", "create a QBR", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["result"]["taskType"], "qbr_generation");
    assert_eq!(json["stage"], "phrase");
}

#[test]
fn test_classify_rejects_unknown_format() {
    let temp = TempDir::new().unwrap();
    dp(&temp)
        .args(["classify", "create a QBR", "--format", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown format"));
}

#[test]
fn test_plan_approve_execute_flow() {
    let temp = TempDir::new().unwrap();

    let output = dp(&temp)
        .args(["plan", "draft a risk assessment", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let plan_id = plan["planId"].as_str().unwrap().to_string();

    dp(&temp)
        .args(["list", "--status", "pending"])
        .assert()
        .success()
        .stdout(predicate::str::contains(plan_id.as_str()));

    dp(&temp)
        .args(["execute", &plan_id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("has not been approved"));

    dp(&temp)
        .args(["approve", &plan_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Approved plan"));

    dp(&temp)
        .args(["execute", &plan_id])
        .assert()
        .success()
        .stdout(predicate::str::contains(".md"));

    dp(&temp)
        .args(["show", &plan_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("completed"));
}

#[test]
fn test_show_unknown_plan_fails() {
    let temp = TempDir::new().unwrap();
    dp(&temp)
        .args(["show", "plan-does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Plan not found"));
}
