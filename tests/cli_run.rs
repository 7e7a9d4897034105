// tests/cli_run.rs

mod common;
use crate::common::init_tracing;

use std::io::Write;

use clap::Parser;
use tempfile::NamedTempFile;

use calcdag::cli::{CliArgs, LogLevel};
use calcdag::logging::parse_level_str;

fn fast_config() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[timing]
addition_ms = 1
subtraction_ms = 1
multiplication_ms = 1
division_ms = 1

[scheduler]
lease_check_interval_ms = 5
lease_grace_ms = 500

[worker]
poll_interval_ms = 2
"#
    )
    .unwrap();
    file
}

fn args(extra: &[&str]) -> CliArgs {
    let mut argv = vec!["calcdag"];
    argv.extend_from_slice(extra);
    CliArgs::try_parse_from(argv).expect("arguments should parse")
}

#[test]
fn cli_parses_flags_and_expressions() {
    let parsed = args(&[
        "--workers",
        "3",
        "--log-level",
        "debug",
        "--timeout-secs",
        "5",
        "2+2",
        "(1+2)*3",
    ]);
    assert_eq!(parsed.workers, Some(3));
    assert!(matches!(parsed.log_level, Some(LogLevel::Debug)));
    assert_eq!(parsed.timeout_secs, 5);
    assert_eq!(parsed.expressions, vec!["2+2", "(1+2)*3"]);
    assert!(!parsed.dry_run);
}

#[test]
fn cli_requires_at_least_one_expression() {
    assert!(CliArgs::try_parse_from(["calcdag", "--dry-run"]).is_err());
}

#[test]
fn log_level_names() {
    assert_eq!(parse_level_str("DEBUG"), Some(tracing::Level::DEBUG));
    assert_eq!(parse_level_str(" warning "), Some(tracing::Level::WARN));
    assert_eq!(parse_level_str("loud"), None);
}

#[tokio::test]
async fn dry_run_schedules_nothing() {
    init_tracing();
    let cfg = fast_config();
    let path = cfg.path().to_str().unwrap();

    let ok = args(&["--dry-run", "--config", path, "(2+3)*4-5", "7"]);
    assert!(calcdag::run(ok).await.is_ok());

    let bad = args(&["--dry-run", "--config", path, "2+", "1+1"]);
    assert!(calcdag::run(bad).await.is_err());
}

#[tokio::test]
async fn run_evaluates_expressions_end_to_end() {
    init_tracing();
    let cfg = fast_config();
    let path = cfg.path().to_str().unwrap();

    let ok = args(&["--config", path, "--workers", "2", "(2+3)*4-5", "2*2"]);
    assert!(calcdag::run(ok).await.is_ok());
}

#[tokio::test]
async fn run_fails_when_any_expression_fails() {
    init_tracing();
    let cfg = fast_config();
    let path = cfg.path().to_str().unwrap();

    let err = calcdag::run(args(&["--config", path, "1/0", "1+1"]))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("1 of 2"), "{err}");

    let err = calcdag::run(args(&["--config", path, "1+", "1+1"]))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("1 of 2"), "{err}");
}

#[tokio::test]
async fn zero_workers_flag_is_rejected() {
    let cfg = fast_config();
    let path = cfg.path().to_str().unwrap();
    assert!(calcdag::run(args(&["--config", path, "--workers", "0", "1+1"]))
        .await
        .is_err());
}
