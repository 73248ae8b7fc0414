use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("authway")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("logout"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("fetch"));
}

#[test]
fn test_fetch_help_shows_request_flags() {
    cargo_bin_cmd!("authway")
        .args(["fetch", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--method"))
        .stdout(predicate::str::contains("--data"))
        .stdout(predicate::str::contains("--header"));
}

#[test]
fn test_config_help_shows_subcommands() {
    cargo_bin_cmd!("authway")
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("path"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("set-base-url"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("authway")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1"));
}
