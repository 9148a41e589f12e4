//! Integration tests for configuration lookup and precedence via CLI.

mod common;

use common::TestEnv;
use predicates::prelude::*;

#[test]
fn test_local_config_selects_database() {
    let env = TestEnv::new();
    env.write_file("rdlc.kdl", "database \"from-config.db\"\n");

    env.rdlc()
        .env_remove("RDLC_DB")
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("from-config.db"));

    assert!(env.path().join("from-config.db").is_file());
    assert!(!env.db_path().exists());
}

#[test]
fn test_flag_overrides_config_database() {
    let env = TestEnv::new();
    env.write_file("rdlc.kdl", "database \"from-config.db\"\n");

    env.rdlc()
        .env_remove("RDLC_DB")
        .args(["--db", "from-flag.db", "init"])
        .assert()
        .success();

    assert!(env.path().join("from-flag.db").is_file());
    assert!(!env.path().join("from-config.db").exists());
}

#[test]
fn test_config_output_format_human() {
    let env = TestEnv::init();
    env.write_file("rdlc.kdl", "output-format \"human\"\n");

    env.rdlc()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Stages: 12"));
}

#[test]
fn test_explicit_config_must_exist() {
    let env = TestEnv::init();

    env.rdlc()
        .args(["--config", "missing.kdl", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn test_invalid_config_file() {
    let env = TestEnv::init();
    env.write_file("rdlc.kdl", "port 0\n");

    env.rdlc()
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("rdlc.kdl"));
}

#[test]
fn test_invalid_log_level_flag() {
    let env = TestEnv::init();

    env.rdlc()
        .args(["--log-level", "rdlc=loud", "status", "-H"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Configuration error"));
}

#[test]
fn test_invalid_log_level_env() {
    let env = TestEnv::init();

    env.rdlc()
        .env("RDLC_LOG", "rdlc=loud")
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid log level"));
}
