//! CLI smoke tests: run the compiled binary and check exit codes and output.
//!
//! None of these contact a collector.

use std::path::Path;
use std::process::Command;

/// Helper: run claire with given args and return (exit_code, stdout, stderr).
fn run_cli(args: &[&str]) -> (i32, String, String) {
    let bin = env!("CARGO_BIN_EXE_claire");
    let output = Command::new(bin)
        .args(args)
        .env("RUST_LOG", "") // suppress tracing noise
        .output()
        .expect("failed to execute claire binary");
    let code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (code, stdout, stderr)
}

fn write_config(dir: &Path, json: &str) -> String {
    let path = dir.join("config.json");
    std::fs::write(&path, json).unwrap();
    path.to_string_lossy().into_owned()
}

// ============================================================================
// Help & Version
// ============================================================================

#[test]
fn cli_no_args_shows_help() {
    let (code, stdout, _stderr) = run_cli(&[]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("claire"));
}

#[test]
fn cli_help_flag() {
    let (code, stdout, _stderr) = run_cli(&["--help"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Commands:"));
    assert!(stdout.contains("run"));
    assert!(stdout.contains("status"));
}

#[test]
fn cli_version_flag() {
    let (code, stdout, _stderr) = run_cli(&["--version"]);
    assert_eq!(code, 0);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn cli_unknown_command_fails() {
    let (code, _stdout, stderr) = run_cli(&["gateway"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unrecognized subcommand"));
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn cli_config_prints_effective_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        r#"{"beacon": {"service": "search", "localPort": 9090}}"#,
    );
    let (code, stdout, _stderr) = run_cli(&["config", "--config", &path]);
    assert_eq!(code, 0);
    assert!(stdout.contains("\"service\": \"search\""));
    assert!(stdout.contains("\"local_port\": 9090"));
    assert!(stdout.contains("Configuration looks good!"));
}

#[test]
fn cli_config_reports_invalid_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), r#"{"beacon": {"service": ""}}"#);
    let (code, stdout, _stderr) = run_cli(&["config", "--config", &path]);
    assert_eq!(code, 0);
    assert!(stdout.contains("[ERROR]"));
}

#[test]
fn cli_config_rejects_malformed_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "{ not json");
    let (code, _stdout, stderr) = run_cli(&["config", "--config", &path]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Failed to load configuration"));
}

// ============================================================================
// Status
// ============================================================================

#[test]
fn cli_status_prints_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        r#"{"beacon": {"service": "search", "local_port": 9090, "build_info": {"v": "1"}}}"#,
    );
    let (code, stdout, _stderr) = run_cli(&["status", "--config", &path]);
    assert_eq!(code, 0);

    let doc: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(doc["service"], "search");
    assert_eq!(doc["local_port"], 9090);
    assert_eq!(doc["codename"].as_str().unwrap().len(), 6);
    assert_eq!(doc["last_keepalive_status"], "");
    assert_eq!(doc["build"]["v"], "1");
}

#[test]
fn cli_status_fails_without_service() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "{}");
    let (code, _stdout, stderr) = run_cli(&["status", "--config", &path]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Failed to create Claire client"));
}
