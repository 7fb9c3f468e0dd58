//! E2E tests for the `herald` binary.
//!
//! Spawns the binary with an isolated project root and checks the replies
//! printed on stdout.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use std::time::Duration;

/// Builds a command rooted in a fresh temp dir with no global config.
/// Keep the guard alive for the test's duration.
fn herald_cmd() -> (assert_cmd::Command, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("create temp dir for project root");
    let mut cmd: assert_cmd::Command = cargo_bin_cmd!("herald");
    cmd.timeout(Duration::from_secs(10));
    for var in ["HERALD_DEBUG", "HERALD_PREFIX", "HERALD_DEFAULT_AUTHORITY", "HERALD_SHOW_WARNING"] {
        cmd.env_remove(var);
    }
    cmd.args(["--isolated", "-C", tmp.path().to_str().expect("valid utf8")]);
    (cmd, tmp)
}

// ─── Command Mode ──────────────────────────────────────────────────

#[test]
fn echo_in_command_mode() {
    let (mut cmd, _guard) = herald_cmd();
    cmd.args(["echo", "hello", "there"])
        .assert()
        .success()
        .stdout(contains("[user:1] hello there"));
}

#[test]
fn unhandled_group_message_fails() {
    let (mut cmd, _guard) = herald_cmd();
    cmd.args(["-g", "100", "nothing", "here"])
        .assert()
        .failure()
        .stderr(contains("Nothing handled"));
}

// ─── Interactive Mode ──────────────────────────────────────────────

#[test]
fn empty_stdin_exits_gracefully() {
    let (mut cmd, _guard) = herald_cmd();
    cmd.write_stdin("").assert().success();
}

#[test]
fn group_header_and_prefix() {
    let (mut cmd, _guard) = herald_cmd();
    cmd.write_stdin("group:100@7 !whoami\ngroup:100@7 whoami\nq\n")
        .assert()
        .success()
        .stdout(contains("[group:100] user 7, authority 1"))
        .stdout(contains("[group:100]").count(1));
}

#[test]
fn custom_prefix_and_authority() {
    let (mut cmd, _guard) = herald_cmd();
    cmd.args(["-p", "/", "--authority", "5", "-g", "3"])
        .write_stdin("/whoami\n")
        .assert()
        .success()
        .stdout(contains("[group:3] user 1, authority 5"));
}

#[test]
fn private_fallback_and_help() {
    let (mut cmd, _guard) = herald_cmd();
    cmd.write_stdin("what is this\nhelp\n")
        .assert()
        .success()
        .stdout(contains("unknown command"))
        .stdout(contains("Available commands:").and(contains("echo")));
}

#[test]
fn no_help_flag_removes_help() {
    let (mut cmd, _guard) = herald_cmd();
    cmd.args(["--no-help", "help"])
        .assert()
        .success()
        .stdout(contains("unknown command"))
        .stdout(contains("Available commands:").not());
}
