//! Integration tests for ConfigManager and configuration file handling
//!
//! These tests verify:
//! - Settings loading, saving and environment overrides
//! - Preset persistence, listing and deletion
//! - Invalid YAML handling
//! - Integration with StateManager

use camino::Utf8PathBuf;
use pattermer::config::{PRESETS_DIR, SETTINGS_FILE};
use pattermer::{ConfigManager, Preset, Settings, StateManager};
use std::fs;
use tempfile::TempDir;

fn create_test_config_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().join("Pattermer Data")).unwrap();
    (temp_dir, config_path)
}

fn env(pairs: &[(&str, &str)]) -> config::Map<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_config_directory_creation() {
    let (_temp_dir, config_path) = create_test_config_dir();
    assert!(!config_path.exists());

    let manager = ConfigManager::new(&config_path).unwrap();

    assert_eq!(manager.config_dir(), &config_path);
    assert!(config_path.join(PRESETS_DIR).is_dir());
}

#[test]
fn test_missing_settings_file_uses_defaults() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let settings = manager.load_settings_with_env(env(&[])).unwrap();

    assert_eq!(settings, Settings::default());
}

#[test]
fn test_environment_overrides_file() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();
    fs::write(
        config_path.join(SETTINGS_FILE),
        "debug_mode: false\nlast_template: '%year%'\n",
    )
    .unwrap();

    let settings = manager
        .load_settings_with_env(env(&[
            ("PATTERMER_DEBUG_MODE", "true"),
            ("PATTERMER_LOG_DIR", "/var/log/pattermer"),
        ]))
        .unwrap();

    assert!(settings.debug_mode);
    assert_eq!(settings.log_dir, "/var/log/pattermer");
    assert_eq!(settings.last_template.as_deref(), Some("%year%"));
}

#[test]
fn test_invalid_yaml_handling() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    fs::write(config_path.join(SETTINGS_FILE), "invalid: yaml: content: {{").unwrap();
    assert!(manager.load_settings_with_env(env(&[])).is_err());

    fs::write(manager.preset_path("broken").unwrap(), "variables: [unclosed").unwrap();
    assert!(manager.load_preset("broken").is_err());
}

#[test]
fn test_list_and_delete_presets() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    manager.save_preset("photos", &Preset::default()).unwrap();
    manager.save_preset("books", &Preset::default()).unwrap();
    fs::write(config_path.join(PRESETS_DIR).join("notes.txt"), "ignored").unwrap();

    assert_eq!(manager.list_presets().unwrap(), vec!["books", "photos"]);

    assert!(manager.delete_preset("books").unwrap());
    assert!(!manager.delete_preset("books").unwrap());
    assert_eq!(manager.list_presets().unwrap(), vec!["photos"]);
}

#[test]
fn test_preset_with_undefined_queue_entries_loads() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();
    fs::write(
        manager.preset_path("legacy").unwrap(),
        "variables:\n  year: ['\\d{4}']\nqueue: [year, ghost]\n",
    )
    .unwrap();

    let preset = manager.load_preset("legacy").unwrap();

    assert_eq!(preset.undefined_queue_entries(), vec!["ghost"]);
}

#[test]
fn test_config_integration_with_state() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();
    let state = StateManager::new();

    state.load_preset("books", &manager.load_preset("books").unwrap());
    state.define_variable("year", r"\d{4}").unwrap();
    state.enqueue("year");

    let preset = state.read(|s| s.store.to_preset());
    manager.save_preset("books", &preset).unwrap();

    let reloaded = StateManager::new();
    reloaded.load_preset("books", &manager.load_preset("books").unwrap());
    assert_eq!(reloaded.read(|s| s.store.clone()), state.read(|s| s.store.clone()));
}

#[test]
fn test_concurrent_config_access() {
    use std::sync::Arc;

    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = Arc::new(ConfigManager::new(&config_path).unwrap());
    manager.save_preset("shared", &Preset::default()).unwrap();

    let mut handles = vec![];
    for _ in 0..10 {
        let manager_clone = Arc::clone(&manager);
        handles.push(std::thread::spawn(move || {
            manager_clone.load_preset("shared").unwrap()
        }));
    }

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Preset::default());
    }
}
