//! Configuration for the mindmap agent workspace.
//!
//! All binaries share a single JSON configuration file at
//! `~/.mindmap/config.json`.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (`MINDMAP_*` prefix)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `MINDMAP_DB_PATH` → `store.db_path`
//! - `MINDMAP_OLLAMA_URL` → `llm.base_url`
//! - `MINDMAP_MODEL` → `llm.model`
//! - `MINDMAP_LOG_LEVEL` → `observability.log_level`
//! - `MINDMAP_LOG_FORMAT` → `observability.log_format`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".mindmap"),
        |dirs| dirs.home_dir().join(".mindmap"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Document store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_db_path() -> PathBuf {
    config_dir().join("mindmap.db")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Ollama base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "gpt-oss:20b".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Pipeline loop budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Max passes of the plan refinement loop.
    #[serde(default = "default_refinement_iterations")]
    pub refinement_iterations: usize,
    /// Max passes of the execution loop.
    #[serde(default = "default_execution_iterations")]
    pub execution_iterations: usize,
}

fn default_refinement_iterations() -> usize {
    3
}

fn default_execution_iterations() -> usize {
    10
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            refinement_iterations: default_refinement_iterations(),
            execution_iterations: default_execution_iterations(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Base log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log format: "json" or "pretty".
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default path, falling back to defaults
    /// when no file exists. Environment overrides are applied last.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let mut config = if path.exists() {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config at {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse config at {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Write the configuration to the default path, creating the directory.
    pub fn save(&self) -> Result<()> {
        let dir = config_dir();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config dir {}", dir.display()))?;

        let raw = serde_json::to_string_pretty(self)?;
        fs::write(config_path(), raw).context("Failed to write config file")?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("MINDMAP_DB_PATH") {
            self.store.db_path = PathBuf::from(path);
        }
        if let Ok(url) = std::env::var("MINDMAP_OLLAMA_URL") {
            self.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("MINDMAP_MODEL") {
            self.llm.model = model;
        }
        if let Ok(level) = std::env::var("MINDMAP_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Ok(format) = std::env::var("MINDMAP_LOG_FORMAT") {
            self.observability.log_format = format;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.llm.base_url, "http://localhost:11434");
        assert_eq!(config.llm.model, "gpt-oss:20b");
        assert_eq!(config.pipeline.refinement_iterations, 3);
        assert_eq!(config.pipeline.execution_iterations, 10);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config.observability.log_format, "pretty");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"llm": {"model": "llama3.2"}}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.llm.model, "llama3.2");
        // Untouched sections come from defaults
        assert_eq!(config.llm.base_url, "http://localhost:11434");
        assert_eq!(config.pipeline.execution_iterations, 10);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = Config::default();
        let raw = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.llm.model, config.llm.model);
        assert_eq!(back.store.db_path, config.store.db_path);
    }
}
