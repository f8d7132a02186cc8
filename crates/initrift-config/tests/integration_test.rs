//! Integration tests for initrift-config
//!
//! These tests verify config file parsing and layering with real files.

use initrift_config::{Compression, Config, LogLevel};
use tempfile::tempdir;

/// Test config loading from a complete config file
#[test]
fn test_load_config_from_file() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("config.toml");

    let config_content = r#"
[archive]
preserve_mtime = false
preserve_owner = false

[output]
compression = "zstd"
level = 19

[logging]
level = "debug"
"#;
    std::fs::write(&path, config_content).unwrap();

    let config = Config::from_file(&path).unwrap();
    assert!(!config.archive.preserve_mtime);
    assert!(!config.archive.preserve_owner);
    assert_eq!(config.output.compression, Compression::Zstd);
    assert_eq!(config.output.level, 19);
    assert_eq!(config.logging.level, LogLevel::Debug);
}

/// Missing sections fall back to defaults
#[test]
fn test_partial_config_uses_defaults() {
    let config: Config = toml::from_str("[output]\ncompression = \"none\"\n").unwrap();
    assert_eq!(config.output.compression, Compression::None);
    assert_eq!(config.output.level, 6);
    assert!(config.archive.preserve_mtime);
    assert_eq!(config.logging.level, LogLevel::Warn);
}

/// Project config overrides only what it changes
#[test]
fn test_config_hierarchy_project_overrides_global() {
    let temp = tempdir().unwrap();

    let global_path = temp.path().join("global.toml");
    std::fs::write(
        &global_path,
        r#"
[archive]
preserve_owner = false

[output]
compression = "zstd"
level = 12
"#,
    )
    .unwrap();

    let project_path = temp.path().join("project.toml");
    std::fs::write(
        &project_path,
        r#"
[output]
compression = "none"
"#,
    )
    .unwrap();

    let mut config = Config::from_file(&global_path).unwrap();
    config.merge(Config::from_file(&project_path).unwrap());

    assert_eq!(config.output.compression, Compression::None);
    // not named by the project file
    assert_eq!(config.output.level, 12);
    assert!(!config.archive.preserve_owner);
    assert!(config.archive.preserve_mtime);
}

/// Environment beats both files
#[test]
fn test_env_overrides_after_merge() {
    let mut config: Config = toml::from_str("[output]\nlevel = 3\n").unwrap();
    config
        .apply_env_overrides(|key| match key {
            "INITRIFT_LEVEL" => Some("9".to_string()),
            "INITRIFT_PRESERVE_OWNER" => Some("false".to_string()),
            _ => None,
        })
        .unwrap();
    assert_eq!(config.output.level, 9);
    assert!(!config.archive.preserve_owner);
}

#[test]
fn test_invalid_compression_rejected() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(&path, "[output]\ncompression = \"lz4\"\n").unwrap();
    assert!(matches!(
        Config::from_file(&path).unwrap_err(),
        initrift_config::ConfigError::Toml(_)
    ));
}

#[test]
fn test_default_toml_parses_back() {
    let rendered = Config::default_toml().unwrap();
    let parsed: Config = toml::from_str(&rendered).unwrap();
    assert_eq!(parsed, Config::default());
}
