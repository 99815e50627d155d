//! CLI routing through the library entry point.

use clap::Parser;
use searchtrack_cli::{run, Cli};
use searchtrack_core::config::Config;
use searchtrack_secrets::store::PROVIDER_KEY;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn cli(args: &[&str]) -> Cli {
    let mut argv = vec!["searchtrack"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

/// Config file whose storage lives inside `dir`.
fn write_config(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("searchtrack.json5");
    let mut config = Config::default();
    config.storage.path = Some(dir.path().join("storage.json"));
    config.save(&path).unwrap();
    path
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[tokio::test]
async fn test_version() {
    run(cli(&["version"])).await.unwrap();
}

#[test]
fn test_unknown_command() {
    assert!(Cli::try_parse_from(["searchtrack", "nonexistent-command"]).is_err());
}

#[tokio::test]
async fn test_config_init_and_validate() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("searchtrack.json5");

    run(cli(&["--config", path_arg(&path), "config", "init"]))
        .await
        .unwrap();
    run(cli(&["--config", path_arg(&path), "config", "validate"]))
        .await
        .unwrap();
    run(cli(&["--config", path_arg(&path), "config", "get", "refine.model"]))
        .await
        .unwrap();
    assert!(run(cli(&["--config", path_arg(&path), "config", "get", "nope"]))
        .await
        .is_err());
}

#[tokio::test]
async fn test_key_save_status_unlock_clear() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);
    let config = path_arg(&config);

    // The only test in this binary that sets the password variable.
    std::env::set_var(searchtrack_cli::prompt::PASSWORD_ENV, "correct horse battery staple");

    run(cli(&[
        "--config",
        config,
        "key",
        "save",
        "--provider",
        "openai",
        "--api-key",
        "sk-test-123",
        "--skip-validation",
    ]))
    .await
    .unwrap();

    let raw = std::fs::read_to_string(dir.path().join("storage.json")).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored[PROVIDER_KEY], "openai");
    assert!(stored["encrypted_openai_key"].is_string());
    assert!(!raw.contains("sk-test-123"));

    run(cli(&["--config", config, "key", "status"])).await.unwrap();
    run(cli(&["--config", config, "key", "unlock"])).await.unwrap();

    std::env::set_var(searchtrack_cli::prompt::PASSWORD_ENV, "wrong password");
    let err = run(cli(&["--config", config, "key", "unlock"]))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Incorrect password. Please try again.");

    run(cli(&["--config", config, "key", "clear", "--yes"]))
        .await
        .unwrap();
    let err = run(cli(&["--config", config, "key", "unlock"]))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("No API key set"));

    std::env::remove_var(searchtrack_cli::prompt::PASSWORD_ENV);
}

#[tokio::test]
async fn test_key_save_rejects_empty_key() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    let err = run(cli(&[
        "--config",
        path_arg(&config),
        "key",
        "save",
        "--api-key",
        "   ",
        "--skip-validation",
    ]))
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Please enter an API key.");
}
