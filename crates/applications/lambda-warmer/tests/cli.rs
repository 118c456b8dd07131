//! Command-line behavior of the `lambda-warmer` binary

use serde_json::Value;
use std::process::{Command, Output};

const SINGLE_PING: &str = r#"{"warmer":true,"concurrency":1}"#;

fn lambda_warmer(envs: &[(&str, &str)], args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_lambda-warmer"));
    for key in [
        "RUST_LOG",
        "AWS_REGION",
        "WARMER_DELAY_MS",
        "WARMER_MAX_CONCURRENCY",
        "AWS_LAMBDA_FUNCTION_NAME",
        "AWS_LAMBDA_FUNCTION_VERSION",
    ] {
        command.env_remove(key);
    }
    command.envs(envs.iter().copied()).args(args);
    command.output().unwrap()
}

fn handle_args<'a>(extra: &[&'a str]) -> Vec<&'a str> {
    let mut args = vec![
        "--log-format",
        "json",
        "handle",
        "--function",
        "orders:7",
        "--dry-run",
        "--event",
        SINGLE_PING,
    ];
    args.extend_from_slice(extra);
    args
}

#[test]
fn stdout_carries_only_the_result() {
    let output = lambda_warmer(&[], &handle_args(&[]));
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1, "unexpected stdout: {stdout}");

    let result: Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(result["outcome"], "Handled");
    assert_eq!(result["warm"], true);

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Lambda warmer starting"));
}

#[test]
fn explicit_function_keeps_environment_settings() {
    let output = lambda_warmer(
        &[("WARMER_DELAY_MS", "2000"), ("WARMER_MAX_CONCURRENCY", "8")],
        &handle_args(&[]),
    );
    assert!(output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains(r#""settle_delay_ms":2000"#), "{stderr}");
    assert!(stderr.contains(r#""max_concurrency":8"#), "{stderr}");
}

#[test]
fn flag_overrides_environment() {
    let output = lambda_warmer(
        &[("WARMER_DELAY_MS", "2000")],
        &handle_args(&["--delay-ms", "40"]),
    );
    assert!(output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains(r#""settle_delay_ms":40"#), "{stderr}");
}

#[test]
fn zero_delay_is_rejected() {
    let from_env = lambda_warmer(&[("WARMER_DELAY_MS", "0")], &handle_args(&[]));
    assert!(!from_env.status.success());
    assert!(from_env.stdout.is_empty());

    let from_flag = lambda_warmer(&[], &handle_args(&["--delay-ms", "0"]));
    assert!(!from_flag.status.success());
    assert!(String::from_utf8(from_flag.stderr).unwrap().contains("nonzero"));
}
