//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$MAILPEEL_CONFIG` (environment variable)
//! 2. `~/.config/mailpeel/config.toml` (Linux/macOS)
//!    `%APPDATA%\mailpeel\config.toml` (Windows)
//! 3. Built-in defaults
//!
//! Command-line flags take precedence over every value here.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extract::text::TextPolicy;
use crate::output::guard::DEFAULT_MAX_OUTPUT_SIZE;
use crate::output::writer::{OutputLimits, DEFAULT_BUFFER_SIZE};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Extraction defaults.
    pub extraction: ExtractionConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override the directory receiving `mailpeel.log`.
    pub log_dir: Option<PathBuf>,
}

/// Extraction defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Directory receiving the extracted `.eml` files.
    pub output_dir: PathBuf,
    /// Read/write buffer size in bytes (default: 8192).
    pub buffer_size: usize,
    /// Maximum size of one output file in bytes (default: 1 GiB).
    pub max_output_size: u64,
    /// Plain-text bodies that count as filler, e.g. forwarding placeholders.
    pub ignorable_text: Vec<String>,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_dir: None,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_output_size: DEFAULT_MAX_OUTPUT_SIZE,
            ignorable_text: Vec::new(),
        }
    }
}

impl ExtractionConfig {
    pub fn limits(&self) -> OutputLimits {
        OutputLimits {
            buffer_size: self.buffer_size,
            max_output_size: self.max_output_size,
        }
    }

    pub fn text_policy(&self) -> TextPolicy {
        TextPolicy::placeholders(self.ignorable_text.iter().cloned())
    }
}

// ── Load ────────────────────────────────────────────────────────

/// A config file that exists but could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Load configuration, searching standard locations.
///
/// A missing file yields the defaults. This runs before logging is set up,
/// so failures are returned for the caller to report.
pub fn load_config() -> Result<Config, ConfigError> {
    match config_file_path() {
        Some(path) if path.exists() => read_config(path),
        _ => Ok(Config::default()),
    }
}

/// Read and parse one config file.
pub fn read_config(path: PathBuf) -> Result<Config, ConfigError> {
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(source) => return Err(ConfigError::Read { path, source }),
    };
    toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("MAILPEEL_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("mailpeel").join("config.toml"))
}

/// Return the directory for log files.
pub fn log_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.log_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailpeel")
}
