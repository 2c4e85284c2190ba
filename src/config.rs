//! Configuration: model selection, generation settings and execution policy.
//!
//! Resolution order (later wins):
//! 1. Built-in defaults
//! 2. `~/.sqlask/config.json` (or `$SQLASK_HOME/config.json`, or an explicit path)
//! 3. Environment: `SQLASK_MODEL`, `SQLASK_PROVIDER`, `SQLASK_BASE_URL`
//!
//! API keys are never stored in the file; they are read from the environment
//! (`GROQ_API_KEY`, `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, or `api_key_env`).

use crate::llm::client::{GenerationOptions, ProviderKind};
use crate::llm::extract::ExtractionPolicy;
use crate::pipeline::PipelineOptions;
use crate::query::AccessMode;
use crate::types::{AskError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default model, served by Groq.
pub const DEFAULT_MODEL: &str = "llama3-70b-8192";

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

/// sqlask configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Model name (e.g. "llama3-70b-8192", "gpt-4o-mini", "claude-3-5-haiku-latest")
    #[serde(default = "default_model")]
    pub model: String,

    /// Provider override. Inferred from the model name when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderKind>,

    /// API base URL override (OpenAI-compatible servers, proxies).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Name of the environment variable holding the API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Sampling temperature for both model calls. 0.0 keeps SQL reproducible.
    #[serde(default)]
    pub temperature: f32,

    /// Output token cap per model call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Whether generated statements may modify the database.
    #[serde(default)]
    pub access_mode: AccessMode,

    /// How the SQL statement is cut out of the model response.
    #[serde(default)]
    pub extraction: ExtractionPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            provider: None,
            base_url: None,
            api_key_env: None,
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            access_mode: AccessMode::default(),
            extraction: ExtractionPolicy::default(),
        }
    }
}

impl Config {
    /// Get config directory (`$SQLASK_HOME` or `~/.sqlask/`).
    pub fn config_dir() -> Result<PathBuf> {
        if let Ok(home) = std::env::var("SQLASK_HOME") {
            return Ok(PathBuf::from(shellexpand::tilde(&home).to_string()));
        }
        let home = std::env::var("HOME")
            .map_err(|_| AskError::Config("HOME not set".to_string()))?;
        Ok(PathBuf::from(home).join(".sqlask"))
    }

    /// Get config file path (`<config_dir>/config.json`).
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load configuration from the default location.
    ///
    /// A missing file yields the defaults. Environment overrides are applied.
    pub fn load() -> Result<Self> {
        let path = Self::config_file()?;
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit file (no environment overrides).
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            AskError::Config(format!("Invalid config {}: {}", path.display(), e))
        })
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save configuration to an explicit file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Apply `SQLASK_*` overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup (process env in production).
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("SQLASK_MODEL").filter(|m| !m.is_empty()) {
            self.model = model;
        }
        if let Some(provider) = lookup("SQLASK_PROVIDER") {
            match provider.parse() {
                Ok(kind) => self.provider = Some(kind),
                Err(e) => tracing::warn!(error = %e, "Ignoring SQLASK_PROVIDER"),
            }
        }
        if let Some(url) = lookup("SQLASK_BASE_URL").filter(|u| !u.is_empty()) {
            self.base_url = Some(url);
        }
    }

    /// Validate field ranges.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(AskError::Config("model must not be empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AskError::Config(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(AskError::Config("max_tokens must be positive".to_string()));
        }
        Ok(())
    }

    /// Provider to talk to: explicit setting, else inferred from the model name.
    pub fn provider_kind(&self) -> ProviderKind {
        self.provider.unwrap_or_else(|| ProviderKind::infer(&self.model))
    }

    /// Environment variable the API key is read from.
    pub fn api_key_var(&self) -> Option<String> {
        self.api_key_env
            .clone()
            .or_else(|| self.provider_kind().default_key_var().map(str::to_string))
    }

    /// Read the API key from the environment.
    ///
    /// # Errors
    ///
    /// Returns `AskError::Config` if the provider needs a key and it is not set
    pub fn api_key(&self) -> Result<Option<String>> {
        let Some(var) = self.api_key_var() else {
            return Ok(None);
        };
        std::env::var(&var)
            .map(Some)
            .map_err(|_| AskError::Config(format!("{} environment variable not set", var)))
    }

    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
        }
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            generation: self.generation_options(),
            extraction: self.extraction,
            access_mode: self.access_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.provider_kind(), ProviderKind::Groq);
        assert_eq!(config.access_mode, AccessMode::ReadWrite);
        assert_eq!(config.extraction, ExtractionPolicy::FirstLine);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            model: "gpt-4o-mini".to_string(),
            access_mode: AccessMode::ReadOnly,
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.provider_kind(), ProviderKind::OpenAI);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"model": "claude-3-5-haiku-latest"}"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.max_tokens, 1024);
        assert_eq!(loaded.provider_kind(), ProviderKind::Anthropic);
        assert_eq!(loaded.api_key_var().as_deref(), Some("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, AskError::Config(_)));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SQLASK_MODEL", "gpt-4.1"),
            ("SQLASK_PROVIDER", "mock"),
            ("SQLASK_BASE_URL", "http://localhost:11434/v1"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env_from(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.model, "gpt-4.1");
        assert_eq!(config.provider_kind(), ProviderKind::Mock);
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:11434/v1"));
        assert_eq!(config.api_key_var(), None);
    }

    #[test]
    fn test_validate_rejects_bad_temperature() {
        let config = Config {
            temperature: 3.5,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
