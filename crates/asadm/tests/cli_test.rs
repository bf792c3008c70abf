//! Integration tests for the `asadm` CLI binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! and error handling without a live appliance.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command for the `asadm` binary with env isolation.
///
/// Clears all `ASADM_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn asadm_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("asadm");
    cmd.env("HOME", "/tmp/asadm-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/asadm-test-nonexistent")
        .env_remove("ASADM_PROFILE")
        .env_remove("ASADM_HOST")
        .env_remove("ASADM_PORT")
        .env_remove("ASADM_USERNAME")
        .env_remove("ASADM_PASSWORD")
        .env_remove("ASADM_OUTPUT")
        .env_remove("ASADM_INSECURE")
        .env_remove("ASADM_TIMEOUT")
        .env_remove("ASADM_NEW_PASSWORD");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = asadm_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    asadm_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("Access Server")
            .and(predicate::str::contains("users"))
            .and(predicate::str::contains("groups"))
            .and(predicate::str::contains("disconnect")),
    );
}

#[test]
fn test_version_flag() {
    asadm_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("asadm"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    asadm_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    asadm_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = asadm_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_users_list_without_appliance() {
    asadm_cmd()
        .args(["users", "list"])
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("No appliance configured")
                .or(predicate::str::contains("config init")),
        );
}

#[test]
fn test_unknown_profile_lists_none() {
    asadm_cmd()
        .args(["--profile", "prod", "groups", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("prod"));
}

#[test]
fn test_host_without_credentials_is_auth_error() {
    asadm_cmd()
        .args(["--host", "vpn.example.com", "status", "list"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("credentials"));
}

#[test]
fn test_config_show_no_config() {
    asadm_cmd().args(["config", "show"]).assert().success();
}

#[test]
fn test_config_path_prints_location() {
    asadm_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_invalid_output_format() {
    let output = asadm_cmd()
        .args(["--output", "invalid", "users", "list"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("possible values"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_invalid_auth_method_rejected_by_parser() {
    asadm_cmd()
        .args(["users", "create", "alice", "--auth", "kerberos"])
        .assert()
        .code(2);
}

#[test]
fn test_invalid_date_rejected_by_parser() {
    asadm_cmd()
        .args(["users", "list", "--expires-after", "31/12/2024"])
        .assert()
        .code(2);
}

#[test]
fn test_bulk_rejects_unknown_action() {
    asadm_cmd()
        .args(["bulk", "users", "explode", "alice"])
        .assert()
        .code(2);
}

#[test]
fn test_disconnect_requires_usernames() {
    asadm_cmd().arg("disconnect").assert().code(2);
}

// ── Subcommand help discovery ───────────────────────────────────────

#[test]
fn test_users_subcommands_exist() {
    asadm_cmd()
        .args(["users", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("list")
                .and(predicate::str::contains("create"))
                .and(predicate::str::contains("password"))
                .and(predicate::str::contains("totp"))
                .and(predicate::str::contains("expiring")),
        );
}

#[test]
fn test_groups_subcommands_exist() {
    asadm_cmd()
        .args(["groups", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("create")
                .and(predicate::str::contains("clear-access"))
                .and(predicate::str::contains("disable")),
        );
}

#[test]
fn test_server_subcommands_exist() {
    asadm_cmd()
        .args(["server", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("info")
                .and(predicate::str::contains("network"))
                .and(predicate::str::contains("restart")),
        );
}

#[test]
fn test_config_subcommands_exist() {
    asadm_cmd()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("init")
                .and(predicate::str::contains("show"))
                .and(predicate::str::contains("profiles")),
        );
}
