//! Unit tests for config module

use std::path::PathBuf;
use std::time::Duration;

use pcdseq::{Config, RecordKind};
use tempfile::TempDir;

#[test]
fn default_config_has_expected_values() {
    let config = Config::default();
    assert_eq!(config.sequence.directory, ".");
    assert_eq!(config.sequence.pattern, r".*\.(pcd)");
    assert!(config.sequence.sort);
    assert!(!config.mode.loop_sequence);
    assert!(config.mode.auto_publish);
    assert!(config.mode.auto_next);
    assert!(!config.mode.auto_prev);
    assert_eq!(config.cloud.kinds(), vec![RecordKind::Xyz]);
    assert_eq!(config.playback.tick_interval_ms, 100);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn config_serialization_roundtrip() {
    let mut config = Config::default();
    config.mode.loop_sequence = true;
    config.cloud.xyzsift = true;
    let toml_str = toml::to_string(&config).unwrap();
    assert!(toml_str.contains("loop = true"));
    let parsed: Config = toml::from_str(&toml_str).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn partial_config_fills_in_defaults() {
    let toml_str = r#"
[mode]
loop = true

[cloud]
xyzrgb = true
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert!(config.mode.loop_sequence);
    assert!(config.mode.auto_next);
    assert_eq!(
        config.cloud.kinds(),
        vec![RecordKind::Xyz, RecordKind::XyzRgb]
    );
    assert_eq!(config.sequence.pattern, r".*\.(pcd)");
}

#[test]
fn playback_settings_follow_config() {
    let toml_str = r#"
[sequence]
directory = "/data/scans"
pattern = 'scan_\d+\.pcd'
sort = false

[mode]
loop = true
auto_publish = false
auto_next = false
auto_prev = true

[cloud]
xyz = false
xyzsift = true
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let settings = config.playback_settings();
    assert_eq!(settings.directory, PathBuf::from("/data/scans"));
    assert_eq!(settings.pattern, r"scan_\d+\.pcd");
    assert!(!settings.sort);
    assert!(settings.looping);
    assert!(!settings.auto_publish);
    assert!(!settings.auto_advance);
    assert!(settings.auto_retreat);
    assert_eq!(settings.kinds, vec![RecordKind::XyzSift]);
}

#[test]
fn tilde_directory_expands_to_home() {
    let mut config = Config::default();
    config.sequence.directory = "~/scans".to_string();
    let dir = config.sequence_directory();
    if let Some(home) = dirs::home_dir() {
        assert_eq!(dir, home.join("scans"));
    }
}

#[test]
fn viewer_settings_follow_toggles() {
    let mut config = Config::default();
    config.viewer.xyzrgb = false;
    config.viewer.coordinate_system = false;
    let settings = config.viewer_settings();
    assert_eq!(settings.display, [true, false, true]);
    assert!(!settings.coordinate_system);
    assert_eq!(settings.title, "pcdseq");
}

#[test]
fn tick_interval_and_log_level() {
    let mut config = Config::default();
    config.playback.tick_interval_ms = 40;
    config.logging.level = "debug".to_string();
    assert_eq!(config.tick_interval(), Duration::from_millis(40));
    assert_eq!(config.log_level(), tracing::Level::DEBUG);
}

#[test]
fn validate_rejects_bad_values() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.sequence.pattern = "(".to_string();
    assert!(config.validate().unwrap_err().contains("sequence.pattern"));

    let mut config = Config::default();
    config.playback.tick_interval_ms = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.logging.level = "loud".to_string();
    assert!(config.validate().unwrap_err().contains("loud"));
}

#[test]
fn save_and_load_from_explicit_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.sequence.directory = "/srv/frames".to_string();
    config.viewer.title = "bench".to_string();
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn load_from_missing_file_returns_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let loaded = Config::load_from(&temp_dir.path().join("none.toml")).unwrap();
    assert_eq!(loaded, Config::default());
}

#[test]
fn load_from_invalid_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[playback]\ntick_interval_ms = 0\n").unwrap();
    let err = Config::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("Invalid config"));

    std::fs::write(&path, "[mode\n").unwrap();
    assert!(Config::load_from(&path).is_err());
}
