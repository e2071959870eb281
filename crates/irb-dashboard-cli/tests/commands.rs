use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use std::fs;
use std::path::PathBuf;

fn metrics_file(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../metrics")
        .join(name)
}

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("irb-dashboard-cli").unwrap();
    cmd.env("NO_COLOR", "1")
        .env_remove("PORT")
        .env_remove("IRB_DASHBOARD__METRICS")
        .env_remove("IRB_DASHBOARD__LAYOUT__CHARTS_PER_ROW");
    cmd
}

#[test]
fn render_json_to_stdout() {
    let output = cli()
        .args(["render", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let page: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(page["kpis"][5]["value"], "5 Total");
    assert_eq!(page["kpis"][5]["badge"], "4 RED | 1 AMBER");
    assert_eq!(page["sections"][0]["title"], "PD Model Validation");
}

#[test]
fn render_html_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("dashboard.html");
    cli()
        .args(["render", "--output", target.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    let html = fs::read_to_string(&target).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("Validation Findings Log"));
    assert_eq!(html.matches("<svg").count(), 6);
}

#[test]
fn render_uses_metrics_and_config_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("dashboard.yaml");
    fs::write(&config, "layout:\n  charts_per_row: 1\n").unwrap();
    cli()
        .args([
            "--config",
            config.to_str().unwrap(),
            "--metrics",
            metrics_file("q4_2025.yaml").to_str().unwrap(),
            "render",
        ])
        .assert()
        .success()
        .stdout(contains("9,600 Accounts"))
        .stdout(contains("repeat(1, minmax(0, 1fr))"));
}

#[test]
fn validate_summarises_the_sample() {
    cli()
        .arg("validate")
        .assert()
        .success()
        .stdout(contains("built-in sample validated"))
        .stdout(contains("10,000 Accounts | 211 Defaults"))
        .stdout(contains("5 finding(s)"))
        .stdout(contains("[RED]"))
        .stdout(contains("4 RED | 1 AMBER"));
}

#[test]
fn validate_accepts_every_shipped_variant() {
    for name in ["feb2026.yaml", "q4_2025.yaml", "mar2026.yaml"] {
        cli()
            .args(["validate", "--metrics", metrics_file(name).to_str().unwrap()])
            .assert()
            .success()
            .stdout(contains("finding(s)"));
    }
}

#[test]
fn validate_json_lists_findings() {
    let output = cli().args(["validate", "--json"]).output().unwrap();
    assert!(output.status.success());
    let findings: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<&str> = findings
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["F001", "F002", "F003", "F004", "F005"]);
}

#[test]
fn validate_rejects_unknown_status() {
    let source = fs::read_to_string(metrics_file("feb2026.yaml")).unwrap();
    let broken = source.replacen("status: AMBER", "status: PURPLE", 1);
    assert_ne!(source, broken);
    let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    fs::write(file.path(), broken).unwrap();

    cli()
        .args(["validate", "--metrics", file.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("failed validation").or(contains("PURPLE")));
}

#[test]
fn render_and_validate_reject_infinite_values() {
    let source = fs::read_to_string(metrics_file("feb2026.yaml")).unwrap();
    let broken = source.replacen("stressed_lgd: 56.97", "stressed_lgd: .inf", 1);
    assert_ne!(source, broken);
    let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    fs::write(file.path(), broken).unwrap();

    for command in ["render", "validate"] {
        cli()
            .args([command, "--metrics", file.path().to_str().unwrap()])
            .assert()
            .failure()
            .stderr(contains("not a finite number"))
            .stderr(contains("panicked").not());
    }
}

#[test]
fn rejects_unsupported_metrics_extension() {
    let file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    fs::write(file.path(), "segment,auc\n").unwrap();
    cli()
        .args(["render", "--metrics", file.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("unsupported metrics document"));
}
