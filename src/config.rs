//! Configuration management for the `WeatherChat` application
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::WeatherChatError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `WeatherChat` application
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WeatherChatConfig {
    /// Gemini API configuration
    #[serde(default)]
    pub gemini: GeminiConfig,
    /// Weather data source configuration
    #[serde(default)]
    pub data: DataConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Gemini API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Gemini API key; may also be supplied via `--api-key` or the
    /// `WEATHERCHAT_GEMINI__API_KEY` environment variable
    pub api_key: Option<String>,
    /// Model identifier submitted to the API
    #[serde(default = "default_gemini_model")]
    pub model: String,
    /// Base URL for the Gemini REST API
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_gemini_timeout")]
    pub timeout_seconds: u32,
}

/// Locations of the historical archive and the persisted model artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the combined historical CSV table
    #[serde(default = "default_historical_path")]
    pub historical_path: PathBuf,
    /// Directory holding the per-city model artifacts
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_timeout() -> u32 {
    60
}

fn default_historical_path() -> PathBuf {
    PathBuf::from("data/combined_data.csv")
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            base_url: default_gemini_base_url(),
            timeout_seconds: default_gemini_timeout(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            historical_path: default_historical_path(),
            models_dir: default_models_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl WeatherChatConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment variable overrides with WEATHERCHAT_ prefix,
        // e.g. WEATHERCHAT_GEMINI__API_KEY
        builder = builder.add_source(
            Environment::with_prefix("WEATHERCHAT")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: WeatherChatConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("weatherchat").join("config.toml"))
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_key()?;

        if self.gemini.timeout_seconds == 0 || self.gemini.timeout_seconds > 300 {
            return Err(WeatherChatError::config(
                "Gemini API timeout must be between 1 and 300 seconds",
            )
            .into());
        }

        if !self.gemini.base_url.starts_with("http://")
            && !self.gemini.base_url.starts_with("https://")
        {
            return Err(
                WeatherChatError::config("Gemini base URL must be a valid HTTP or HTTPS URL")
                    .into(),
            );
        }

        if self.gemini.model.is_empty() {
            return Err(WeatherChatError::config("Gemini model cannot be empty").into());
        }

        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(WeatherChatError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        Ok(())
    }

    /// Validate the API key if one is present
    ///
    /// The key is optional at load time since the `infer` subcommand never
    /// talks to the API; the chat dispatcher requires it at construction.
    pub fn validate_api_key(&self) -> Result<()> {
        if let Some(api_key) = &self.gemini.api_key {
            if api_key.is_empty() {
                return Err(WeatherChatError::config(
                    "Gemini API key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }

            if api_key.len() < 8 {
                return Err(WeatherChatError::config(
                    "Gemini API key appears to be invalid (too short). Please check your API key.",
                )
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WeatherChatConfig::default();
        assert_eq!(
            config.gemini.base_url,
            "https://generativelanguage.googleapis.com/v1beta"
        );
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
        assert_eq!(config.gemini.timeout_seconds, 60);
        assert_eq!(config.data.models_dir, PathBuf::from("models"));
        assert_eq!(config.logging.level, "info");
        assert!(config.gemini.api_key.is_none());
    }

    #[test]
    fn test_config_validation_missing_api_key() {
        // API key is optional at load time
        let config = WeatherChatConfig::default();
        assert!(config.validate_api_key().is_ok());
    }

    #[test]
    fn test_config_validation_short_api_key() {
        let mut config = WeatherChatConfig::default();
        config.gemini.api_key = Some("short".to_string());
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("too short"));
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = WeatherChatConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_timeout_range() {
        let mut config = WeatherChatConfig::default();
        config.gemini.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("between 1 and 300"));
    }

    #[test]
    fn test_config_path_generation() {
        let path = WeatherChatConfig::get_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("weatherchat"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }
}
