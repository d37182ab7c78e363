//! `WeatherChat` - Conversational weather assistant backed by Gemini tool calling
//!
//! This library provides the core functionality for historical weather
//! lookup, model-based forecasting with prediction intervals, and the chat
//! dispatcher that exposes those operations to the Gemini API as tools.

pub mod city;
pub mod config;
pub mod dates;
pub mod dispatch;
pub mod error;
pub mod forecast;
pub mod gemini;
pub mod history;
pub mod model;

// Re-export core types for public API
pub use city::{City, CoverageRange};
pub use config::WeatherChatConfig;
pub use dispatch::ChatSession;
pub use error::WeatherChatError;
pub use forecast::{ForecastReport, ForecastService, HistoricalReport, Outcome};
pub use gemini::GeminiClient;
pub use history::{HistoricalArchive, HistoricalRecord};
pub use model::{ForecastModel, ModelStore, Prediction, Quantity};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
