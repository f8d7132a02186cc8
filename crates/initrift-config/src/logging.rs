//! Structured logging utilities for initrift components.
//!
//! Provides consistent logging with component prefixes and structured fields.
//!
//! # Usage
//!
//! ```ignore
//! use initrift_config::log_cli_info;
//!
//! log_cli_info!("Archive written", records = 42);
//! ```

use serde::{Deserialize, Serialize};

/// Component identifiers for log filtering
pub struct Component;

impl Component {
    pub const CLI: &'static str = "CLI";
}

/// Environment variable consulted before `RUST_LOG`
pub const LOG_ENV: &str = "INITRIFT_LOG";

/// Log levels for runtime configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Raise the level by `steps` (one per `-v`), saturating at trace.
    pub fn raised(self, steps: u8) -> Self {
        const ORDER: [LogLevel; 5] = [
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ];
        let current = ORDER.iter().position(|l| *l == self).unwrap_or(1);
        ORDER[(current + steps as usize).min(ORDER.len() - 1)]
    }
}

// === CLI logging macros ===
// Fields follow the message and accept tracing's `%`/`?` sigils.

#[macro_export]
macro_rules! log_cli_warn {
    ($msg:literal $(,)?) => {
        tracing::warn!(component = $crate::logging::Component::CLI, $msg)
    };
    ($msg:literal, $($field:tt)+) => {
        tracing::warn!(component = $crate::logging::Component::CLI, $($field)+, $msg)
    };
}

#[macro_export]
macro_rules! log_cli_info {
    ($msg:literal $(,)?) => {
        tracing::info!(component = $crate::logging::Component::CLI, $msg)
    };
    ($msg:literal, $($field:tt)+) => {
        tracing::info!(component = $crate::logging::Component::CLI, $($field)+, $msg)
    };
}

#[macro_export]
macro_rules! log_cli_debug {
    ($msg:literal $(,)?) => {
        tracing::debug!(component = $crate::logging::Component::CLI, $msg)
    };
    ($msg:literal, $($field:tt)+) => {
        tracing::debug!(component = $crate::logging::Component::CLI, $($field)+, $msg)
    };
}

/// Initialize logging with the given level filter.
/// Call this once at application startup.
///
/// `INITRIFT_LOG` wins over `RUST_LOG`, which wins over `level`.
pub fn init_logging(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
