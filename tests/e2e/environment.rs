//! Environment variable and settings behavior end-to-end tests.

use clap::Parser;
use serde_json::Value;

use sb::cli::{Cli, Commands};

use crate::common::cli::CliRunner;
use crate::common::env::EnvGuard;
use crate::common::init_test_logging;

#[test]
fn sb_format_env_sets_json_output() {
    init_test_logging();
    let cli = CliRunner::new()
        .with_env("RUST_LOG", "off")
        .with_env("SB_FORMAT", "json");
    let result = cli.run(&["version"]);
    result.assert_success();

    let json: Value = serde_json::from_str(result.stdout.trim())
        .expect("Expected JSON output with SB_FORMAT=json");
    assert!(json.get("version").is_some());
}

#[test]
fn sb_format_env_sets_compact_json() {
    init_test_logging();
    let cli = CliRunner::new()
        .with_env("RUST_LOG", "off")
        .with_env("SB_FORMAT", "json-compact");
    let result = cli.run(&["categories", "list"]);
    result.assert_success();

    let stdout = result.stdout.trim_end();
    assert_eq!(stdout, "[]");
}

#[test]
fn cli_format_flag_overrides_env() {
    init_test_logging();
    let cli = CliRunner::new()
        .with_env("RUST_LOG", "off")
        .with_env("SB_FORMAT", "json");
    let result = cli.run(&["version", "--format=text"]);
    result.assert_success();

    assert!(
        serde_json::from_str::<Value>(result.stdout.trim()).is_err(),
        "--format=text should override SB_FORMAT=json"
    );
}

#[test]
fn sb_format_env_is_read_in_process() {
    let _format = EnvGuard::set("SB_FORMAT", "json-compact");

    let cli = Cli::parse_from(["sb", "backups"]);
    assert!(cli.use_json());
    assert!(cli.use_compact_json());
    assert!(matches!(cli.command, Some(Commands::Backups)));
}

#[test]
fn database_flag_overrides_settings() {
    init_test_logging();
    let cli = CliRunner::new().with_env("RUST_LOG", "off");
    let other = cli.home().join("elsewhere").join("other.db");
    let other_arg = other.to_string_lossy().into_owned();

    cli.run(&["--database", &other_arg, "categories", "add", "Effects"])
        .assert_success();
    assert!(other.is_file());
    assert!(!cli.database_path().exists());

    let result = cli.run_robot(&["--database", &other_arg, "categories", "list"]);
    result.assert_success().assert_json_array_len("", 1);
}

#[test]
fn config_reports_resolved_paths() {
    init_test_logging();
    let cli = CliRunner::new().with_env("RUST_LOG", "off");
    let result = cli.run_robot(&["config"]);
    result.assert_success();

    let json = result.json();
    let database = json["database"].as_str().expect("database path");
    assert!(database.ends_with("soundboard.db"));
    assert_eq!(json["backup"]["attempts"], Value::from(2));
    assert_eq!(json["backup"]["on_write"], Value::Bool(false));

    // `config` never touches the store.
    assert!(!cli.database_path().exists());
}

#[test]
fn malformed_settings_fail_with_hint() {
    init_test_logging();
    let cli = CliRunner::new().with_env("RUST_LOG", "off");
    cli.write_config("database = [oops");

    cli.run(&["categories", "list"])
        .assert_failure()
        .assert_stderr_contains("Configuration parse error")
        .assert_stderr_contains("sb config");
}

#[test]
fn settings_commands_leave_the_store_unopened() {
    let cli = CliRunner::new().with_env("RUST_LOG", "off");
    let _ = cli.run(&["version"]).assert_success();
    let _ = cli.run(&["config"]).assert_success();
    let _ = cli.run(&[]).assert_success();
    assert!(!cli.database_path().exists());

    let _ = cli.run(&["profiles"]).assert_success();
    assert!(cli.database_path().exists());
}
