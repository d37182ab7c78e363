//! Error types and handling for the `WeatherChat` application

use thiserror::Error;

/// Main error type for the `WeatherChat` application
#[derive(Error, Debug)]
pub enum WeatherChatError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Gemini API communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Historical archive or model artifact errors
    #[error("Data error: {message}")]
    Data { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl WeatherChatError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new data error
    pub fn data<S: Into<String>>(message: S) -> Self {
        Self::Data {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            WeatherChatError::Config { .. } => {
                "Configuration error. Please check your config file and API key.".to_string()
            }
            WeatherChatError::Api { .. } => {
                "Unable to reach the Gemini API. Please check your API key and internet connection."
                    .to_string()
            }
            WeatherChatError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            WeatherChatError::Data { .. } => {
                "Weather data could not be read. Please check the archive and model artifact paths."
                    .to_string()
            }
            WeatherChatError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            WeatherChatError::General { message } => message.clone(),
        }
    }
}
