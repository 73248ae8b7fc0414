//! Integration tests for login, logout and status.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::{TempDir, tempdir};

/// Creates a temp AUTHWAY_HOME with a stored credential pair.
fn seeded_home(access: &str, refresh: &str) -> TempDir {
    let dir = tempdir().expect("create temp authway home");
    fs::write(
        dir.path().join("tokens.json"),
        serde_json::json!({ "access_token": access, "refresh_token": refresh }).to_string(),
    )
    .unwrap();
    dir
}

#[test]
fn test_login_with_callback_url_persists_tokens() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("authway")
        .env("AUTHWAY_HOME", dir.path())
        .env("AUTHWAY_NO_BROWSER", "1")
        .args([
            "login",
            "--url",
            "http://127.0.0.1:8000/callback?access_token=ACCESS_abcdefgh&refresh_token=REFRESH_ijklmnop&redirect=account",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in"))
        .stdout(predicate::str::contains("/account"));

    let tokens = fs::read_to_string(dir.path().join("tokens.json")).unwrap();
    assert!(tokens.contains("ACCESS_abcdefgh"));
    assert!(tokens.contains("REFRESH_ijklmnop"));
}

#[test]
fn test_login_with_error_callback_fails() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("authway")
        .env("AUTHWAY_HOME", dir.path())
        .env("AUTHWAY_NO_BROWSER", "1")
        .args([
            "login",
            "--url",
            "http://127.0.0.1:8000/callback?error=access_denied",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Login failed"));

    assert!(!dir.path().join("tokens.json").exists());
}

#[test]
fn test_status_masks_tokens() {
    let dir = seeded_home("ACCESS_abcdefghijklmnop", "REFRESH_qrstuvwxyz123456");

    cargo_bin_cmd!("authway")
        .env("AUTHWAY_HOME", dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("ACCESS_abcde..."))
        .stdout(predicate::str::contains("ACCESS_abcdefghijklmnop").not())
        .stdout(predicate::str::contains("REFRESH_qrstuvwxyz123456").not());
}

#[test]
fn test_status_when_not_logged_in() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("authway")
        .env("AUTHWAY_HOME", dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));
}

#[test]
fn test_logout_clears_tokens() {
    let dir = seeded_home("ACCESS_abcdefgh", "REFRESH_ijklmnop");

    cargo_bin_cmd!("authway")
        .env("AUTHWAY_HOME", dir.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out"));

    let tokens = fs::read_to_string(dir.path().join("tokens.json")).unwrap();
    assert_eq!(tokens.trim(), "{}");
}

#[test]
fn test_logout_when_not_logged_in() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("authway")
        .env("AUTHWAY_HOME", dir.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));
}
