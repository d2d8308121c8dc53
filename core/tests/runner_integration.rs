//! End-to-end tests: data directory in, JSON payload and exit code out

use std::fs;
use std::path::Path;
use std::process::Command;

use safe_eval_core::{evaluate, Config, ExecutionResult, RunnerError};
use serde_json::json;
use tempfile::TempDir;

fn data_dir(scope: Option<&str>, script: Option<&str>) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create data dir");
    if let Some(scope) = scope {
        fs::write(dir.path().join("scope.json"), scope).expect("Failed to write scope");
    }
    if let Some(script) = script {
        fs::write(dir.path().join("user_code.py"), script).expect("Failed to write script");
    }
    dir
}

fn config_for(dir: &Path) -> Config {
    Config::builder()
        .data_dir(Some(dir.to_path_buf()))
        .build()
        .expect("Config should load")
}

/// Run the binary against `dir`, returning stdout and the exit code
fn run_binary(dir: &Path) -> (String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_safe-eval"))
        .arg("--data-dir")
        .arg(dir)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("SAFE_EVAL_CONFIG_PATH")
        .output()
        .expect("Failed to run safe-eval");
    (
        String::from_utf8(output.stdout).expect("stdout is UTF-8"),
        output.status.code().unwrap_or(-1),
    )
}

/* ===================== Library ===================== */

#[test]
fn test_evaluate_success() {
    let dir = data_dir(Some(r#"{"base": 40}"#), Some("x = base + 2\nprint('hi')\nreturn x"));
    let result = evaluate(&config_for(dir.path())).expect("Script should be readable");
    assert_eq!(result.to_payload(), json!({"logs": ["hi"], "output": 42}));
    assert_eq!(result.exit_code(), 0);
}

#[test]
fn test_evaluate_runtime_failure_keeps_logs() {
    let dir = data_dir(None, Some("print('about to fail')\nraise ValueError('boom')"));
    let result = evaluate(&config_for(dir.path())).unwrap();
    assert_eq!(
        result,
        ExecutionResult::RuntimeFailure {
            logs: vec!["about to fail".to_string()],
            error: "boom".to_string(),
        }
    );
}

#[test]
fn test_evaluate_definition_failure() {
    let dir = data_dir(None, Some("print((1)\nreturn 1"));
    let result = evaluate(&config_for(dir.path())).unwrap();
    let payload = result.to_payload();
    let error = payload["error"].as_str().expect("error message");
    assert!(error.starts_with("Error interpreting user code: "));
    assert!(payload.get("logs").is_none());
    assert_eq!(result.exit_code(), 1);
}

#[test]
fn test_evaluate_missing_script() {
    let dir = data_dir(Some("{}"), None);
    let err = evaluate(&config_for(dir.path())).unwrap_err();
    assert!(matches!(err, RunnerError::ScriptRead { .. }));
    assert!(err.to_string().starts_with("Error reading user_code.py: "));
}

#[test]
fn test_invalid_scope_still_runs() {
    let dir = data_dir(Some("{broken"), Some("return 'ran'"));
    let result = evaluate(&config_for(dir.path())).unwrap();
    assert_eq!(result.to_payload(), json!({"logs": [], "output": "ran"}));
}

#[test]
fn test_scope_names_must_be_bound_to_be_used() {
    let dir = data_dir(Some(r#"{"a": 1}"#), Some("return b"));
    let result = evaluate(&config_for(dir.path())).unwrap();
    assert_eq!(
        result.to_payload(),
        json!({"logs": [], "error": "name 'b' is not defined"})
    );
}

#[test]
fn test_configured_file_names() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("job.py"), "return [1, 2.5, None, {'k': True}]").unwrap();
    let config = Config::builder()
        .data_dir(Some(dir.path().to_path_buf()))
        .build()
        .map(|config| Config {
            script_file: "job.py".to_string(),
            ..config
        })
        .unwrap();
    let result = evaluate(&config).unwrap();
    assert_eq!(
        result.to_payload(),
        json!({"logs": [], "output": [1, 2.5, null, {"k": true}]})
    );
}

/* ===================== Binary ===================== */

#[test]
fn test_binary_prints_payload() {
    let dir = data_dir(None, Some("x = 1 + 1\nprint('hi')\nreturn x"));
    let (stdout, code) = run_binary(dir.path());
    assert_eq!(stdout, "{\"logs\": [\"hi\"], \"output\": 2}\n");
    assert_eq!(code, 0);
}

#[test]
fn test_binary_reports_errors_with_exit_code() {
    let dir = data_dir(None, Some("return 1 / 0"));
    let (stdout, code) = run_binary(dir.path());
    assert_eq!(stdout, "{\"logs\": [], \"error\": \"division by zero\"}\n");
    assert_eq!(code, 1);
}

#[test]
fn test_binary_missing_script() {
    let dir = data_dir(None, None);
    let (stdout, code) = run_binary(dir.path());
    let payload: serde_json::Value = serde_json::from_str(&stdout).expect("stdout is JSON");
    assert!(payload["error"]
        .as_str()
        .unwrap()
        .starts_with("Error reading user_code.py: "));
    assert_eq!(code, 1);
}

#[test]
fn test_binary_escapes_non_ascii_output() {
    let dir = data_dir(None, Some("print('café')\nreturn 'ok'"));
    let (stdout, _) = run_binary(dir.path());
    assert_eq!(stdout, "{\"logs\": [\"caf\\u00e9\"], \"output\": \"ok\"}\n");
}
