//! CLI integration tests

use std::io::Write;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

fn run_cli(args: &[&str]) -> Output {
    Command::new("cargo")
        .args(["run", "-q", "-p", "kce-cli", "--"])
        .args(args)
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to execute command")
}

fn batch_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(
        br#"[
            {"env": "prod", "cluster": "eks-a", "namespace": "orders", "pods": 3, "cpu_req": 100},
            {"env": "prod", "cluster": "eks-b", "namespace": "batch", "pods": 10, "cpu_req": 6400},
            {"env": "dev", "cluster": "eks-a", "namespace": "broken", "pods": "abc", "cpu_req": 100}
        ]"#,
    )
    .expect("Failed to write batch file");
    file
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = run_cli(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("Kubernetes Namespace Cost Estimator"),
        "Should show app name"
    );
    assert!(stdout.contains("tiers"), "Should show tiers command");
    assert!(stdout.contains("defaults"), "Should show defaults command");
    assert!(stdout.contains("estimate"), "Should show estimate command");
    assert!(stdout.contains("batch"), "Should show batch command");
    assert!(stdout.contains("finalize"), "Should show finalize command");
    assert!(stdout.contains("--format"), "Should show format option");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = run_cli(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("kce"), "Should show binary name");
}

/// Test estimate subcommand help
#[test]
fn test_estimate_help() {
    let output = run_cli(&["estimate", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Estimate help should succeed");
    assert!(stdout.contains("--namespace"), "Should show namespace option");
    assert!(stdout.contains("--cluster"), "Should show cluster option");
    assert!(stdout.contains("--cpu-req"), "Should show cpu-req option");
    assert!(stdout.contains("--istio"), "Should show istio option");
    assert!(stdout.contains("--size"), "Should show size option");
}

/// Test the pricing table listing
#[test]
fn test_tiers_json() {
    let output = run_cli(&["--format", "json", "tiers"]);
    assert!(output.status.success(), "Tiers should succeed");

    let tiers: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Tiers output should be JSON");
    let tiers = tiers.as_array().expect("Tiers should be an array");
    assert_eq!(tiers.len(), 4);
    assert_eq!(tiers[0]["value"], "S");
    assert_eq!(tiers[3]["value"], "XL");
    assert_eq!(tiers[3]["cpu_capacity"], 64.0);
}

/// Test a single namespace estimate
#[test]
fn test_estimate_json() {
    let output = run_cli(&[
        "--format",
        "json",
        "estimate",
        "--namespace",
        "orders",
        "--env",
        "prod",
        "--cluster",
        "eks-a",
        "--pods",
        "3",
        "--cpu-req",
        "100",
    ]);
    assert!(output.status.success(), "Estimate should succeed");

    let entry: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Estimate output should be JSON");
    assert_eq!(entry["id"], 1);
    assert_eq!(entry["namespace"], "orders");
    assert_eq!(entry["recommended_size"], "S");
    assert_eq!(entry["computed_size"], "S");
    assert_eq!(entry["buffered_cpu_cores"], 1.0);
    assert_eq!(entry["monthly_cost"], 413.46);
    assert_eq!(entry["annual_cost"], 4961.52);
}

/// Test that a non-numeric pod count is reported, not fatal
#[test]
fn test_estimate_invalid_pods_table() {
    let output = run_cli(&[
        "estimate",
        "--namespace",
        "orders",
        "--cluster",
        "eks-a",
        "--pods",
        "abc",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Invalid input should not fail the command");
    assert!(stdout.contains("Calculation error"), "Should show the error");
    assert!(stdout.contains("XL"), "Should show the fallback size");
}

/// Test batch estimation with an override
#[test]
fn test_batch_json_with_override() {
    let file = batch_file();
    let path = file.path().to_str().unwrap();
    let output = run_cli(&["--format", "json", "batch", path, "--override", "1=L"]);
    assert!(output.status.success(), "Batch should succeed");

    let batch: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Batch output should be JSON");
    let entries = batch["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["computed_size"], "S");
    assert_eq!(entries[0]["recommended_size"], "L");
    assert_eq!(entries[0]["effective_size"], "L");
    assert_eq!(entries[0]["monthly_cost"], 1102.56);
    assert_eq!(entries[1]["recommended_size"], "XL");
    assert!(entries[2]["calculation_error"].is_string());
    assert_eq!(entries[2]["monthly_cost"], 0.0);

    let environments = batch["environments"].as_array().unwrap();
    assert_eq!(environments[0]["environment"], "prod");
    assert_eq!(environments[1]["environment"], "dev");
    assert_eq!(batch["summary"]["totals"]["count"], 3);
    assert_eq!(batch["summary"]["totals"]["error_count"], 1);
}

/// Test that bad optional fields and refused entries do not fail a batch
#[test]
fn test_batch_tolerates_bad_records() {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(
        br#"[
            {"env": "prod", "cluster": "eks-a", "namespace": "orders", "pods": 3, "cpu_req": 100, "mem_req": "2000", "hpa_min": -1},
            {"env": "prod", "cluster": "eks-a", "namespace": "search", "pods": 3, "cpu_req": 100, "hpa_min": 5, "hpa_max": 2}
        ]"#,
    )
    .expect("Failed to write batch file");
    let path = file.path().to_str().unwrap();
    let output = run_cli(&["--format", "json", "batch", path]);
    assert!(output.status.success(), "Batch should succeed");

    let batch: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Batch output should be JSON");
    let entries = batch["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["namespace"], "orders");
    assert_eq!(entries[0]["memory_request_mb"], 2000);
    assert_eq!(entries[0]["autoscale_min"], 0);
}

/// Test the finalize cluster summary
#[test]
fn test_finalize_table() {
    let file = batch_file();
    let path = file.path().to_str().unwrap();
    let output = run_cli(&["finalize", path]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Finalize should succeed");
    assert!(stdout.contains("Cost Summary"), "Should show title");
    assert!(stdout.contains("eks-a"), "Should show first cluster");
    assert!(stdout.contains("eks-b"), "Should show second cluster");
    assert!(stdout.contains("$2,618.58"), "Should show total monthly cost");
    assert!(stdout.contains("v1.32"), "Should show EKS version");
    assert!(stdout.contains("Not specified"), "Should show blank tags");
}

/// Test an override for an unknown entry id
#[test]
fn test_batch_unknown_override_id() {
    let file = batch_file();
    let path = file.path().to_str().unwrap();
    let output = run_cli(&["batch", path, "--override", "9=M"]);

    assert!(!output.status.success(), "Unknown entry id should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("9"), "Should name the missing entry");
}

/// Test defaults for an unknown environment
#[test]
fn test_defaults_unknown_environment() {
    let output = run_cli(&["defaults", "lab"]);
    assert!(!output.status.success(), "Unknown environment should fail");
}

/// Test invalid command error handling
#[test]
fn test_invalid_command() {
    let output = run_cli(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error") || stderr.contains("invalid"),
        "Should show error message"
    );
}

/// Test missing required argument error handling
#[test]
fn test_missing_argument() {
    let output = run_cli(&["estimate"]);

    assert!(!output.status.success(), "Missing argument should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("required") || stderr.contains("error"),
        "Should show error about missing argument"
    );
}
