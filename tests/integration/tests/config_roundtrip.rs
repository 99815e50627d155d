//! Config save/load roundtrip integration tests.

use searchtrack_core::config::Config;
use searchtrack_core::ProviderKind;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_config_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("searchtrack.json5");

    let config = Config::default();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(
        loaded.session.inactivity_timeout_minutes,
        config.session.inactivity_timeout_minutes
    );
    assert_eq!(loaded.health_check.enabled, config.health_check.enabled);
    assert_eq!(loaded.refine.model, config.refine.model);
    assert_eq!(loaded.providers.default, ProviderKind::OpenAi);
}

#[test]
fn test_config_modify_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("searchtrack.json5");

    let mut config = Config::default();
    config.session.inactivity_timeout_minutes = 5;
    config.providers.default = ProviderKind::Anthropic;
    config.storage.path = Some(dir.path().join("storage.json"));
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.session.inactivity_timeout_minutes, 5);
    assert_eq!(loaded.providers.default, ProviderKind::Anthropic);
    assert_eq!(loaded.storage_path().unwrap(), dir.path().join("storage.json"));
    assert!(loaded.validate().is_ok());
}

#[test]
fn test_config_accepts_json5() {
    let config = Config::parse(
        r#"{
            // comments and trailing commas are fine
            session: { inactivity_timeout_minutes: 10 },
            providers: { default: "mistral", },
        }"#,
    )
    .unwrap();
    assert_eq!(config.session.inactivity_timeout_minutes, 10);
    assert_eq!(config.providers.default, ProviderKind::Mistral);
}

#[test]
fn test_config_load_nonexistent() {
    let result = Config::load(Path::new("/nonexistent/searchtrack.json5"));
    assert!(result.is_err());
    assert!(Config::load_or_default(Some(Path::new("/nonexistent/searchtrack.json5"))).is_ok());
}

#[test]
fn test_config_parse_invalid() {
    let result = Config::parse("not valid json");
    assert!(result.is_err());
}
