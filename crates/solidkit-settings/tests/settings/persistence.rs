use solidkit_settings::{Config, ConfigError, SettingsError};
use tempfile::TempDir;

fn customized() -> Config {
    let mut config = Config::default();
    config.logging.level = "solidkit=debug".to_string();
    config.history.max_depth = 25;
    config.event_bus.enable_history = true;
    config.interaction.default_mode = "transitory".to_string();
    config.interaction.gizmo_scale = 1.5;
    config
        .keymap
        .insert("d".to_string(), "gizmo:distance".to_string());
    config
}

#[test]
fn test_toml_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let config = customized();
    config.save_to_file(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("[interaction]"));

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_json_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let config = customized();
    config.save_to_file(&path).unwrap();
    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded.keymap.get("d").map(String::as_str), Some("gizmo:distance"));
    assert_eq!(loaded.history.max_depth, 25);
}

#[test]
fn test_load_rejects_invalid_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[interaction]\ndefault_mode = \"sticky\"\n").unwrap();

    let result = Config::load_from_file(&path);
    assert!(matches!(
        result,
        Err(SettingsError::Config(ConfigError::UnknownMode(_)))
    ));
}

#[test]
fn test_malformed_file_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[history\nmax_depth = ").unwrap();
    assert!(matches!(
        Config::load_from_file(&path),
        Err(SettingsError::TomlError(_))
    ));
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let config = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, Config::default());
}
