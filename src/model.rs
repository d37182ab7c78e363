//! Persisted forecast model artifacts
//!
//! Each supported city carries two postcard-serialized artifacts, one per
//! forecast quantity. An artifact is a fitted additive model — level, linear
//! trend, yearly Fourier seasonality, residual sigma — trained externally;
//! this module only deserializes and evaluates it. Artifacts are loaded
//! fresh per invocation and never cached across calls, so parallel
//! invocations only ever share read-only files.

use crate::city::City;
use crate::WeatherChatError;
use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, instrument};

/// Days per tropical year, the seasonality period
const YEAR_DAYS: f64 = 365.25;

/// Two-sided z score for a 95% prediction interval
const Z_95: f64 = 1.959_964;

/// Which quantity a model predicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quantity {
    Temperature,
    Precipitation,
}

impl Quantity {
    /// File-name fragment used by the artifact naming convention
    #[must_use]
    pub fn file_tag(&self) -> &'static str {
        match self {
            Quantity::Temperature => "temp",
            Quantity::Precipitation => "precip",
        }
    }
}

/// One Fourier term of the yearly seasonality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Harmonic {
    /// Cycles per year
    pub order: u32,
    pub sin_coef: f64,
    pub cos_coef: f64,
}

/// A fitted additive forecast model, deserialized from a persisted artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastModel {
    /// Canonical city key this model was fitted for
    pub city: String,
    pub quantity: Quantity,
    /// Last date of the training data; step 1 predicts the day after
    pub train_end: NaiveDate,
    /// Fitted value at the training horizon
    pub level: f64,
    /// Linear trend per day past the horizon
    pub trend_per_day: f64,
    /// Yearly seasonality terms
    pub seasonal: Vec<Harmonic>,
    /// Residual standard deviation from fitting
    pub sigma: f64,
}

/// Point estimate with its 95% prediction interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ForecastModel {
    /// Evaluate the model `steps` days past the training horizon and return
    /// the prediction for the final step
    ///
    /// The interval widens with the horizon: uncertainty compounds at a
    /// random-walk rate on top of the residual sigma.
    pub fn predict(&self, steps: u32) -> Result<Prediction> {
        if steps == 0 {
            return Err(
                WeatherChatError::data("Forecast horizon must be at least one step").into(),
            );
        }

        let horizon = f64::from(steps);
        let target = self.train_end + Duration::days(i64::from(steps));
        let value = self.level + self.trend_per_day * horizon + self.seasonal_at(target);
        let margin = Z_95 * self.sigma * horizon.sqrt();

        Ok(Prediction {
            value,
            lower: value - margin,
            upper: value + margin,
        })
    }

    /// Yearly seasonality component at a calendar date
    fn seasonal_at(&self, date: NaiveDate) -> f64 {
        let day_of_year = f64::from(date.ordinal0());
        self.seasonal
            .iter()
            .map(|h| {
                let phase = 2.0 * std::f64::consts::PI * f64::from(h.order) * day_of_year
                    / YEAR_DAYS;
                h.sin_coef * phase.sin() + h.cos_coef * phase.cos()
            })
            .sum()
    }

    /// Serialize to the postcard artifact format
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        postcard::to_stdvec(self).with_context(|| "Failed to serialize model artifact")
    }

    /// Deserialize from the postcard artifact format
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        postcard::from_bytes(bytes).with_context(|| "Failed to deserialize model artifact")
    }
}

/// Locates and loads model artifacts by the city-keyed naming convention
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    #[must_use]
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Artifact path for a city and quantity, e.g. `models/kazan_temp_model.bin`
    #[must_use]
    pub fn artifact_path(&self, city: City, quantity: Quantity) -> PathBuf {
        self.dir
            .join(format!("{}_{}_model.bin", city.key(), quantity.file_tag()))
    }

    /// Load one artifact; a missing or corrupt file is a fatal error, not a
    /// conversational refusal
    #[instrument(skip(self), fields(city = %city, quantity = ?quantity))]
    pub fn load(&self, city: City, quantity: Quantity) -> Result<ForecastModel> {
        let path = self.artifact_path(city, quantity);
        let bytes = fs::read(&path)
            .with_context(|| format!("Failed to read model artifact '{}'", path.display()))?;
        let model = ForecastModel::from_bytes(&bytes)?;
        debug!("Loaded model artifact ({} bytes)", bytes.len());
        Ok(model)
    }

    /// Write an artifact to its conventional location
    pub fn save(&self, model: &ForecastModel) -> Result<PathBuf> {
        let city = City::parse(&model.city)
            .map_err(WeatherChatError::validation)?;
        let path = self.artifact_path(city, model.quantity);
        fs::write(&path, model.to_bytes()?)
            .with_context(|| format!("Failed to write model artifact '{}'", path.display()))?;
        Ok(path)
    }
}
