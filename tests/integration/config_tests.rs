use duplyzer::config::Config;
use duplyzer::duplicates::Strategy;
use figment::providers::{Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_defaults_extract() {
    // Figment without Env so parallel tests cannot interfere
    let figment = Figment::from(Serialized::defaults(Config::default()));
    let config: Config = figment.extract().unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_file_overrides_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "workers = 8\nstrategy = \"fixed-pool\"\n").unwrap();

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .extract()
        .unwrap();

    assert_eq!(config.workers, 8);
    assert_eq!(config.strategy, Strategy::FixedPool);
    assert!(!config.pretty_json);
}

#[test]
fn test_env_overrides_file_and_cli_overrides_env() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "workers = 8\npretty_json = true\n").unwrap();

    std::env::set_var("DUPLYZER_WORKERS", "16");
    std::env::set_var("DUPLYZER_STRATEGY", "sequential");
    let loaded = Config::load(Some(&path));
    std::env::remove_var("DUPLYZER_WORKERS");
    std::env::remove_var("DUPLYZER_STRATEGY");

    let config = loaded.unwrap();
    assert_eq!(config.workers, 16);
    assert_eq!(config.strategy, Strategy::Sequential);
    assert!(config.pretty_json);

    let config = config.with_overrides(Some(2), Some(Strategy::Limited), false);
    assert_eq!(config.effective_workers(), 2);
    assert_eq!(config.strategy, Strategy::Limited);
    assert!(config.pretty_json);
}

#[test]
fn test_invalid_value_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "strategy = \"round-robin\"\n").unwrap();

    let result: Result<Config, _> = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .extract();
    assert!(result.is_err());
}

#[test]
fn test_save_then_load_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested/config.toml");
    let config = Config {
        workers: 5,
        strategy: Strategy::FixedPool,
        pretty_json: true,
    };

    config.save_to(&path).unwrap();
    let saved = fs::read_to_string(&path).unwrap();
    assert!(saved.contains("workers = 5"));
    assert!(saved.contains("strategy = \"fixed-pool\""));

    let loaded: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .extract()
        .unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_missing_explicit_config_file() {
    let dir = tempdir().unwrap();
    let err = Config::load(Some(&dir.path().join("missing.toml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
}
