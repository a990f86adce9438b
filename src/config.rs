//! Configuration management for gemchat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{GemchatError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for gemchat
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Gemini API settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Where conversations, presets and settings are persisted
    #[serde(default)]
    pub storage: StorageConfig,

    /// Transcript export settings
    #[serde(default)]
    pub export: ExportConfig,
}

/// Provider configuration
///
/// Points the client at the generative-language API and picks the model
/// used when nothing has been selected yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API base URL (overridable for tests and proxies)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model used when the persisted selection is empty
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Optional API key; the keyring entry is used when this is unset
    #[serde(default)]
    pub api_key: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_timeout() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            default_model: default_model(),
            api_key: None,
            timeout_seconds: default_timeout(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the key-value database.
    ///
    /// When unset, the platform data directory is used.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Default directory for exported transcripts
    #[serde(default = "default_export_dir")]
    pub directory: PathBuf,
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: default_export_dir(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::info!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| GemchatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| GemchatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(api_base) = std::env::var("GEMCHAT_API_BASE") {
            self.provider.api_base = api_base;
        }

        if let Ok(model) = std::env::var("GEMCHAT_MODEL") {
            self.provider.default_model = model;
        }

        if let Ok(api_key) = std::env::var("GEMCHAT_API_KEY") {
            if !api_key.trim().is_empty() {
                self.provider.api_key = Some(api_key);
            }
        }

        if let Ok(timeout) = std::env::var("GEMCHAT_TIMEOUT") {
            match timeout.parse::<u64>() {
                Ok(v) => self.provider.timeout_seconds = v,
                Err(_) => tracing::warn!("Ignoring invalid GEMCHAT_TIMEOUT value: {}", timeout),
            }
        }

        if let Ok(data_dir) = std::env::var("GEMCHAT_DATA_DIR") {
            self.storage.data_dir = Some(PathBuf::from(data_dir));
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(dir) = &cli.data_dir {
            tracing::debug!("Using data directory override from CLI: {}", dir.display());
            self.storage.data_dir = Some(dir.clone());
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.provider.api_base.trim().is_empty() {
            return Err(GemchatError::Config("provider.api_base cannot be empty".to_string()).into());
        }

        if !self.provider.api_base.starts_with("http://")
            && !self.provider.api_base.starts_with("https://")
        {
            return Err(GemchatError::Config(format!(
                "provider.api_base must be an http(s) URL: {}",
                self.provider.api_base
            ))
            .into());
        }

        if self.provider.default_model.trim().is_empty() {
            return Err(
                GemchatError::Config("provider.default_model cannot be empty".to_string()).into(),
            );
        }

        if self.provider.timeout_seconds == 0 {
            return Err(GemchatError::Config(
                "provider.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(
            config.provider.api_base,
            "https://generativelanguage.googleapis.com"
        );
        assert_eq!(config.provider.default_model, "gemini-2.0-flash");
        assert_eq!(config.provider.timeout_seconds, 120);
        assert!(config.provider.api_key.is_none());
        assert!(config.storage.data_dir.is_none());
        assert_eq!(config.export.directory, PathBuf::from("."));
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_empty_api_base() {
        let mut config = Config::default();
        config.provider.api_base = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_non_http_api_base() {
        let mut config = Config::default();
        config.provider.api_base = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_empty_model() {
        let mut config = Config::default();
        config.provider.default_model = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = Config::default();
        config.provider.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
provider:
  api_base: http://localhost:8080
  default_model: gemini-1.5-pro
  timeout_seconds: 30
storage:
  data_dir: /tmp/gemchat-data
export:
  directory: /tmp/exports
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.provider.api_base, "http://localhost:8080");
        assert_eq!(config.provider.default_model, "gemini-1.5-pro");
        assert_eq!(config.provider.timeout_seconds, 30);
        assert_eq!(
            config.storage.data_dir,
            Some(PathBuf::from("/tmp/gemchat-data"))
        );
        assert_eq!(config.export.directory, PathBuf::from("/tmp/exports"));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
provider:
  default_model: gemini-1.5-flash
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.provider.default_model, "gemini-1.5-flash");
        assert_eq!(
            config.provider.api_base,
            "https://generativelanguage.googleapis.com"
        );
        assert_eq!(config.provider.timeout_seconds, 120);
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_defaults() {
        let cli = crate::cli::Cli::default();
        let config = Config::load("nonexistent.yaml", &cli).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_env_vars_override_file_values() {
        std::env::set_var("GEMCHAT_MODEL", "gemini-env-model");
        std::env::set_var("GEMCHAT_TIMEOUT", "not-a-number");

        let cli = crate::cli::Cli::default();
        let config = Config::load("nonexistent.yaml", &cli).unwrap();

        std::env::remove_var("GEMCHAT_MODEL");
        std::env::remove_var("GEMCHAT_TIMEOUT");

        assert_eq!(config.provider.default_model, "gemini-env-model");
        // Invalid timeout is ignored
        assert_eq!(config.provider.timeout_seconds, 120);
    }

    #[test]
    #[serial]
    fn test_cli_data_dir_overrides_env() {
        std::env::set_var("GEMCHAT_DATA_DIR", "/tmp/from-env");

        let cli = crate::cli::Cli {
            data_dir: Some(PathBuf::from("/tmp/from-cli")),
            ..Default::default()
        };
        let config = Config::load("nonexistent.yaml", &cli).unwrap();

        std::env::remove_var("GEMCHAT_DATA_DIR");

        assert_eq!(config.storage.data_dir, Some(PathBuf::from("/tmp/from-cli")));
    }
}
