//! # initrift-config
//!
//! Configuration management for initrift.
//!
//! Loads configuration from:
//! 1. `~/.initrift/config.toml` (global)
//! 2. `.initrift/config.toml` (project-local, overrides global)
//! 3. Environment variables (highest priority)

pub mod logging;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use logging::LogLevel;

/// Project-local config location, relative to the working directory
pub const PROJECT_CONFIG_PATH: &str = ".initrift/config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML render error: {0}")]
    Render(#[from] toml::ser::Error),
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub archive: ArchiveConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config from standard locations
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // 1. Load global config (~/.initrift/config.toml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                debug!("Loading global config from {:?}", global_path);
                config = Self::from_file(&global_path)?;
            }
        }

        // 2. Load project config (.initrift/config.toml) - overrides global
        let project_path = Path::new(PROJECT_CONFIG_PATH);
        if project_path.exists() {
            debug!("Loading project config from {:?}", project_path);
            config.merge(Self::from_file(project_path)?);
        }

        // 3. Apply environment variable overrides
        config.apply_env_overrides(|key| std::env::var(key).ok())?;

        Ok(config)
    }

    /// Parse a single config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Global config path: ~/.initrift/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".initrift/config.toml"))
    }

    /// Merge a project config. Only values that differ from the defaults
    /// override, so a project file only needs to name what it changes.
    pub fn merge(&mut self, other: Config) {
        let defaults = Config::default();
        if other.archive.preserve_mtime != defaults.archive.preserve_mtime {
            self.archive.preserve_mtime = other.archive.preserve_mtime;
        }
        if other.archive.preserve_owner != defaults.archive.preserve_owner {
            self.archive.preserve_owner = other.archive.preserve_owner;
        }
        if other.output.compression != defaults.output.compression {
            self.output.compression = other.output.compression;
        }
        if other.output.level != defaults.output.level {
            self.output.level = other.output.level;
        }
        if other.logging.level != defaults.logging.level {
            self.logging.level = other.logging.level;
        }
    }

    /// Apply environment variable overrides, reading variables via `var`.
    pub fn apply_env_overrides(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = var("INITRIFT_COMPRESSION") {
            self.output.compression = value.parse()?;
        }
        if let Some(value) = var("INITRIFT_LEVEL") {
            self.output.level = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: "INITRIFT_LEVEL",
                value,
            })?;
        }
        if let Some(value) = var("INITRIFT_PRESERVE_MTIME") {
            self.archive.preserve_mtime = parse_bool("INITRIFT_PRESERVE_MTIME", value)?;
        }
        if let Some(value) = var("INITRIFT_PRESERVE_OWNER") {
            self.archive.preserve_owner = parse_bool("INITRIFT_PRESERVE_OWNER", value)?;
        }
        Ok(())
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Generate default config TOML string
    pub fn default_toml() -> Result<String, ConfigError> {
        Config::default().to_toml()
    }
}

fn parse_bool(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue { key, value }),
    }
}

/// Archive metadata policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Record host modification times (otherwise a fixed timestamp)
    pub preserve_mtime: bool,
    /// Record host uid/gid (otherwise root)
    pub preserve_owner: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            preserve_mtime: true,
            preserve_owner: true,
        }
    }
}

/// Compression applied around the archive stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    None,
    #[default]
    Gzip,
    Zstd,
}

impl Compression {
    /// Conventional file extension suffix
    pub fn extension(self) -> &'static str {
        match self {
            Compression::None => "cpio",
            Compression::Gzip => "cpio.gz",
            Compression::Zstd => "cpio.zst",
        }
    }
}

impl FromStr for Compression {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Compression::None),
            "gzip" | "gz" => Ok(Compression::Gzip),
            "zstd" | "zst" => Ok(Compression::Zstd),
            _ => Err(ConfigError::InvalidValue {
                key: "compression",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
            Compression::Zstd => "zstd",
        };
        f.write_str(name)
    }
}

/// Output stream configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub compression: Compression,
    /// Codec level; clamped to the codec's range
    pub level: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            compression: Compression::Gzip,
            level: 6,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}
