// src/config/mod.rs - Tool settings and configuration errors
//!
//! Two configuration sources feed a run: an optional TOML settings file for the
//! tool itself, and the acceleration table file written by the firmware (see
//! [`table_file`]). Both report failures through [`ConfigError`].
//!
//! ## Example: TOML settings
//!
//! ```toml
//! [table]
//! path = "/home/pi/printer_data/config/autoacc.cfg"
//!
//! [output]
//! suffix = "_parsed"
//!
//! [logging]
//! level = "debug"
//! ```

pub mod table_file;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use table_file::{load_table_config, parse_table_config, Row, TableConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {path}")]
    NotFound { path: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("acceleration table has no rows")]
    Empty,
    #[error("malformed configuration at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
    #[error("axis {axis} row at velocity {velocity} has no matching row for the other axis")]
    UnpairedAxis { axis: char, velocity: f64 },
    #[error("joint and per-axis acceleration sections cannot be mixed")]
    MixedModes,
    #[error("duplicate velocity {velocity} in acceleration table")]
    DuplicateVelocity { velocity: f64 },
    #[error("invalid log level '{0}'")]
    LogLevel(String),
}

/// Settings for one run of the rewriter.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub table: TableSettings,

    #[serde(default)]
    pub output: OutputSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Where the acceleration table lives
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TableSettings {
    #[serde(default = "default_table_path")]
    pub path: PathBuf,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            path: default_table_path(),
        }
    }
}

/// Naming of the rewritten file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputSettings {
    /// Appended to the input file stem, before the extension.
    #[serde(default = "default_output_suffix")]
    pub suffix: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            suffix: default_output_suffix(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingSettings {
    pub fn max_level(&self) -> Result<tracing::Level, ConfigError> {
        self.level
            .parse()
            .map_err(|_| ConfigError::LogLevel(self.level.clone()))
    }

    /// Level to run at. `verbose` forces DEBUG; an invalid configured level
    /// falls back to INFO and its error is handed back for reporting.
    pub fn effective_level(&self, verbose: bool) -> (tracing::Level, Option<ConfigError>) {
        match (verbose, self.max_level()) {
            (true, Ok(_)) => (tracing::Level::DEBUG, None),
            (true, Err(e)) => (tracing::Level::DEBUG, Some(e)),
            (false, Ok(level)) => (level, None),
            (false, Err(e)) => (tracing::Level::INFO, Some(e)),
        }
    }
}

// Default value functions
fn default_table_path() -> PathBuf { PathBuf::from("/home/pi/printer_data/config/autoacc.cfg") }
fn default_output_suffix() -> String { "_parsed".to_string() }
fn default_log_level() -> String { "info".to_string() }

/// Load settings from a TOML file at the given path.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                tracing::error!("Failed to parse settings TOML: {}", e);
                Err(ConfigError::Toml(e))
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::NotFound {
            path: path.display().to_string(),
        }),
        Err(e) => {
            tracing::error!("Failed to read settings file '{}': {}", path.display(), e);
            Err(ConfigError::Io(e))
        }
    }
}
