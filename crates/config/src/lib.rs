//! Configuration loading and validation for Ferrocode.
//!
//! Loads configuration from `~/.ferrocode/config.toml` with environment
//! variable overrides. Validates all settings at startup. Once a run has
//! started the configuration is never mutated.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// System prompt used when the config does not provide one.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a coding agent operating inside a sandboxed workspace directory.
You can read, write, and edit files, search the workspace, run shell
commands, and keep a todo list. All file paths are interpreted relative
to the workspace root; you cannot access anything outside it.

Work in small steps: inspect before you modify, verify after you change.
When a task is complete, reply with a short summary of what you did.";

/// The root configuration structure.
///
/// Maps directly to `~/.ferrocode/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Anthropic API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model identifier sent to the provider
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per model response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Directory all file tools are sandboxed to
    #[serde(default = "default_workspace_root")]
    pub workspace_root: PathBuf,

    /// Where the mutation audit log is written
    #[serde(default = "default_audit_log")]
    pub audit_log: PathBuf,

    /// Estimated-token budget for the conversation view sent to the model
    #[serde(default = "default_token_budget")]
    pub token_budget: usize,

    /// Maximum model round-trips per user turn
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Override the built-in system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_workspace_root() -> PathBuf {
    PathBuf::from("./workspace")
}
fn default_audit_log() -> PathBuf {
    PathBuf::from("./audit.jsonl")
}
fn default_token_budget() -> usize {
    50_000
}
fn default_max_iterations() -> usize {
    20
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("workspace_root", &self.workspace_root)
            .field("audit_log", &self.audit_log)
            .field("token_budget", &self.token_budget)
            .field("max_iterations", &self.max_iterations)
            .field("system_prompt", &self.system_prompt)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.ferrocode/config.toml).
    ///
    /// Also checks environment variables for the API key:
    /// - `FERROCODE_API_KEY` (highest priority)
    /// - `ANTHROPIC_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (highest priority).
    pub fn apply_env_overrides(&mut self) {
        if self.api_key.is_none() {
            self.api_key = std::env::var("FERROCODE_API_KEY")
                .ok()
                .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok());
        }

        // Allow env var to override the model
        if let Ok(model) = std::env::var("FERROCODE_MODEL") {
            self.model = model;
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".ferrocode")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "max_tokens must be greater than 0".into(),
            ));
        }

        if self.token_budget == 0 {
            return Err(ConfigError::ValidationError(
                "token_budget must be greater than 0".into(),
            ));
        }

        if self.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "max_iterations must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// The system prompt to seed the conversation with.
    pub fn effective_system_prompt(&self) -> &str {
        self.system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            workspace_root: default_workspace_root(),
            audit_log: default_audit_log(),
            token_budget: default_token_budget(),
            max_iterations: default_max_iterations(),
            system_prompt: None,
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.model, "claude-sonnet-4-20250514");
        assert_eq!(config.token_budget, 50_000);
        assert_eq!(config.max_iterations, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.token_budget, config.token_budget);
        assert_eq!(parsed.workspace_root, config.workspace_root);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_token_budget_rejected() {
        let config = AppConfig {
            token_budget: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_max_iterations_rejected() {
        let config = AppConfig {
            max_iterations: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        let config = result.unwrap();
        assert_eq!(config.max_iterations, 20);
    }

    #[test]
    fn load_from_reads_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
model = "claude-opus-4-20250514"
temperature = 0.2
workspace_root = "/srv/agent/workspace"
token_budget = 80000
max_iterations = 10
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.model, "claude-opus-4-20250514");
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.workspace_root, PathBuf::from("/srv/agent/workspace"));
        assert_eq!(config.token_budget, 80_000);
        assert_eq!(config.max_iterations, 10);
        // Unspecified fields keep their defaults
        assert_eq!(config.max_tokens, 4096);
    }

    #[test]
    fn malformed_config_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "model = [not valid").unwrap();

        let result = AppConfig::load_from(&path);
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn invalid_config_file_rejected_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_iterations = 0").unwrap();

        let result = AppConfig::load_from(&path);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-ant-secret".into()),
            ..AppConfig::default()
        };
        let debug_str = format!("{config:?}");
        assert!(!debug_str.contains("sk-ant-secret"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn system_prompt_override_takes_effect() {
        let config = AppConfig {
            system_prompt: Some("You are a test fixture.".into()),
            ..AppConfig::default()
        };
        assert_eq!(config.effective_system_prompt(), "You are a test fixture.");

        let config = AppConfig::default();
        assert!(config.effective_system_prompt().contains("workspace"));
    }
}
