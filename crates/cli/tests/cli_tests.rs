//! CLI integration tests

use std::process::{Command, Output};

fn taar(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_taar"))
        .args(args)
        .env_remove("TAAR_API_URL")
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = taar(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("TAAR"), "Should show app name");
    assert!(stdout.contains("recommend"), "Should show recommend command");
    assert!(stdout.contains("status"), "Should show status command");
    assert!(stdout.contains("reload"), "Should show reload command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = taar(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("taar"), "Should show binary name");
}

/// Test recommend subcommand help
#[test]
fn test_recommend_help() {
    let output = taar(&["recommend", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Recommend help should succeed");
    assert!(stdout.contains("<CLIENT_ID>"), "Should show client id argument");
    assert!(stdout.contains("--limit"), "Should show limit option");
}

/// Test format and api-url options
#[test]
fn test_global_options() {
    let output = taar(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("--format"), "Should show format option");
    assert!(stdout.contains("table"), "Should show table format");
    assert!(stdout.contains("json"), "Should show json format");
    assert!(stdout.contains("--api-url"), "Should show api-url option");
    assert!(stdout.contains("TAAR_API_URL"), "Should show env var");
}

/// Test invalid command error handling
#[test]
fn test_invalid_command() {
    let output = taar(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error") || stderr.contains("invalid"),
        "Should show error message"
    );
}

/// Test missing required argument error handling
#[test]
fn test_missing_client_id() {
    let output = taar(&["recommend"]);

    assert!(!output.status.success(), "Missing argument should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("required") || stderr.contains("error"),
        "Should show error about missing argument"
    );
}

/// Test that a non-numeric limit is rejected before any request is made
#[test]
fn test_invalid_limit() {
    let output = taar(&["recommend", "client-1", "--limit", "many"]);

    assert!(!output.status.success(), "Invalid limit should fail");
}

/// Test that an unreachable service is reported as a failure
#[test]
fn test_unreachable_service() {
    let output = taar(&["--api-url", "http://127.0.0.1:1", "status"]);

    assert!(!output.status.success(), "Unreachable service should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Failed to send request"),
        "Should explain the failure"
    );
}
