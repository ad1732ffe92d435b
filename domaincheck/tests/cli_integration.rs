// domaincheck/tests/cli_integration.rs

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::{NamedTempFile, TempDir};

/// A command isolated from user config files and DC_* variables.
fn domaincheck(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("domaincheck").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .env_remove("DC_SERVER")
        .env_remove("DC_TIMEOUT")
        .env_remove("DC_CONCURRENCY")
        .env_remove("DC_BOOTSTRAP")
        .env_remove("RUST_LOG");
    cmd
}

fn create_test_domains_file(content: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("Failed to create temp file");
    fs::write(file.path(), content).expect("Failed to write to temp file");
    file
}

#[test]
fn test_help_lists_flags() {
    let home = TempDir::new().unwrap();
    domaincheck(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--server"))
        .stdout(predicate::str::contains("--json"))
        .stdout(predicate::str::contains("--available"))
        .stdout(predicate::str::contains("--quiet"))
        .stdout(predicate::str::contains("--local"));
}

#[test]
fn test_version() {
    let home = TempDir::new().unwrap();
    domaincheck(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_no_domains() {
    let home = TempDir::new().unwrap();
    domaincheck(&home)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: No domains specified"));
}

#[test]
fn test_file_with_only_comments_has_no_domains() {
    let home = TempDir::new().unwrap();
    let file = create_test_domains_file("# nothing here\n\n   \n");

    domaincheck(&home)
        .arg("-f")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: No domains specified"));
}

#[test]
fn test_invalid_domain_is_rejected_before_sending() {
    let home = TempDir::new().unwrap();
    domaincheck(&home)
        .args(["-s", "http://127.0.0.1:1", "good", "--", "-bad"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "Error: invalid domain format: -bad (invalid domain format: -bad)",
        ));
}

#[test]
fn test_server_url_scheme_required() {
    let home = TempDir::new().unwrap();
    domaincheck(&home)
        .args(["-s", "localhost:8765", "example"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Error: server URL must start with http:// or https://",
        ));
}

#[test]
fn test_server_from_environment() {
    let home = TempDir::new().unwrap();
    domaincheck(&home)
        .env("DC_SERVER", "http://127.0.0.1:1")
        .arg("example")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error connecting to server"));
}

#[test]
fn test_unreachable_server() {
    let home = TempDir::new().unwrap();
    domaincheck(&home)
        .args(["-s", "http://127.0.0.1:1", "example"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error connecting to server"));
}

#[test]
fn test_stdin_input() {
    let home = TempDir::new().unwrap();
    domaincheck(&home)
        .args(["-s", "http://127.0.0.1:1", "-"])
        .write_stdin("# list\n-oops\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid domain format: -oops"));
}

#[test]
fn test_missing_input_file() {
    let home = TempDir::new().unwrap();
    domaincheck(&home)
        .args(["-f", "/nonexistent/domains.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error opening file"));
}

#[test]
fn test_explicit_config_file_is_validated() {
    let home = TempDir::new().unwrap();
    let config = create_test_domains_file("[checker]\nconcurrency = 0\n");

    domaincheck(&home)
        .arg("--config")
        .arg(config.path())
        .arg("example")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Error: configuration error: Concurrency must be between 1 and 100",
        ));
}
