use assert_cmd::Command;
use predicates::prelude::*;
use std::{fs, path::Path};

const VALID_CONFIG: &str = r#"
endpoint: "https://example.openai.azure.com"
api_version: "2025-01-01-preview"
system_prompt: "You are a historian."
models: ["gpt-4o"]
prompts: ["Generate name of division of Italian army in WW2"]
output:
  dir: "./output"
  prefix: "division_name"
"#;

fn promptsweep_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin("promptsweep"));
    // Isolate from the developer's ~/.env and real Azure credentials.
    cmd.current_dir(home)
        .env("PROMPTSWEEP_HOME", home)
        .env_remove("AZURE_TENANT_ID")
        .env_remove("AZURE_CLIENT_ID")
        .env_remove("AZURE_CLIENT_SECRET");
    cmd
}

#[test]
fn run_fails_before_any_call_when_credentials_missing() {
    let temp = tempfile::TempDir::new().unwrap();
    let config_path = temp.path().join("config.yaml");
    fs::write(&config_path, VALID_CONFIG).unwrap();

    let assert = promptsweep_cmd(temp.path())
        .arg("run")
        .arg("--config")
        .arg(&config_path)
        .assert();

    assert
        .failure()
        .stderr(predicate::str::contains("AZURE_TENANT_ID"));

    // Credential acquisition failed before the sweep started, so no
    // artifacts and no manifest exist.
    assert!(
        !temp.path().join("output").exists(),
        "no output directory should be created"
    );
}

#[test]
fn run_rejects_invalid_configuration() {
    let temp = tempfile::TempDir::new().unwrap();
    let config_path = temp.path().join("config.yaml");
    fs::write(
        &config_path,
        r#"
endpoint: "https://example.openai.azure.com"
api_version: "2025-01-01-preview"
models: []
prompts: ["hello"]
"#,
    )
    .unwrap();

    promptsweep_cmd(temp.path())
        .arg("run")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least one model"));
}

#[test]
fn run_reports_missing_config_file() {
    let temp = tempfile::TempDir::new().unwrap();

    promptsweep_cmd(temp.path())
        .arg("run")
        .arg("--config")
        .arg(temp.path().join("nonexistent.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn env_file_supplies_partial_credentials() {
    let temp = tempfile::TempDir::new().unwrap();
    let config_path = temp.path().join("config.yaml");
    fs::write(&config_path, VALID_CONFIG).unwrap();
    // Tenant id comes from ~/.env; client id is still missing, so the
    // failure message should move past AZURE_TENANT_ID.
    fs::write(temp.path().join(".env"), "AZURE_TENANT_ID=tenant-from-env\n").unwrap();

    promptsweep_cmd(temp.path())
        .arg("run")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("AZURE_CLIENT_ID"));
}
