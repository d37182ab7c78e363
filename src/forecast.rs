//! The three tool operations behind the chat dispatcher
//!
//! Each operation returns a tagged [`Outcome`]: a structured report on
//! success, or a refusal message the LLM can relay conversationally
//! (unsupported city, unparseable date, missing record). Hard failures —
//! missing model artifacts, an unreadable archive — propagate as errors and
//! halt the invocation instead.
//!
//! Refusals are produced before any file access: an unsupported city or a
//! bad date never touches the archive or the artifacts.

use crate::city::City;
use crate::config::DataConfig;
use crate::dates;
use crate::history::HistoricalArchive;
use crate::model::{ModelStore, Quantity};
use crate::WeatherChatError;
use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, info, instrument};

/// Tagged result of a tool operation: a report, or a reason it was refused
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Report(T),
    Refused(String),
}

impl<T: Serialize> Outcome<T> {
    /// JSON shape handed back to the LLM: the report itself, or
    /// `{"error": reason}` for refusals
    pub fn to_json(&self) -> Result<Value> {
        match self {
            Outcome::Report(report) => Ok(serde_json::to_value(report)?),
            Outcome::Refused(reason) => Ok(serde_json::json!({ "error": reason })),
        }
    }
}

/// Six-field forecast report with 95% prediction intervals, one-decimal rounded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastReport {
    pub predicted_average_temperature: f64,
    pub predicted_average_temperature_lower_bound: f64,
    pub predicted_average_temperature_upper_bound: f64,
    pub predicted_precipitation: f64,
    pub predicted_precipitation_lower_bound: f64,
    pub predicted_precipitation_upper_bound: f64,
}

/// Archived observation report for a historical lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalReport {
    pub average_temperature: f64,
    pub precipitation_mm: f64,
}

/// Executes the three tool operations against the configured data sources
///
/// Holds only paths: the archive and the artifacts are opened fresh on every
/// call, so concurrent invocations never share mutable state.
#[derive(Debug, Clone)]
pub struct ForecastService {
    historical_path: PathBuf,
    models: ModelStore,
}

impl ForecastService {
    #[must_use]
    pub fn new(data: &DataConfig) -> Self {
        Self {
            historical_path: data.historical_path.clone(),
            models: ModelStore::new(data.models_dir.clone()),
        }
    }

    /// Weather forecast for the day after the models' training horizon
    ///
    /// "Next day" is absolute — one step past the last trained date — not
    /// relative to the wall clock.
    #[instrument(skip(self))]
    pub fn next_day_forecast(&self, city: &str) -> Result<Outcome<ForecastReport>> {
        let city = match City::parse(city) {
            Ok(city) => city,
            Err(reason) => return Ok(Outcome::Refused(reason)),
        };

        info!("Next-day forecast for {city}");
        Ok(Outcome::Report(self.forecast_at_horizon(city, 1)?))
    }

    /// Archived weather for a city on an exact date
    #[instrument(skip(self))]
    pub fn historical_lookup(&self, city: &str, date: &str) -> Result<Outcome<HistoricalReport>> {
        let city = match City::parse(city) {
            Ok(city) => city,
            Err(reason) => return Ok(Outcome::Refused(reason)),
        };
        let date = match dates::parse_date(date) {
            Ok(date) => date,
            Err(reason) => return Ok(Outcome::Refused(reason)),
        };

        self.lookup_archived(city, date)
    }

    fn lookup_archived(&self, city: City, date: NaiveDate) -> Result<Outcome<HistoricalReport>> {
        let archive = HistoricalArchive::load(&self.historical_path)?;

        match archive.lookup(city, date) {
            Some(record) => {
                debug!("Archive hit for {city} on {date}");
                Ok(Outcome::Report(HistoricalReport {
                    average_temperature: record.avg_temp_c,
                    precipitation_mm: record.precipitation_mm,
                }))
            }
            None => Ok(Outcome::Refused(format!(
                "Historical data for {city} on {date} is not available"
            ))),
        }
    }

    /// Weather forecast for a target date, offset from the city's latest
    /// archived date
    ///
    /// A target inside the archive range still produces a forecast; the
    /// horizon is clamped to a minimum of one step.
    #[instrument(skip(self))]
    pub fn future_date_forecast(&self, city: &str, date: &str) -> Result<Outcome<ForecastReport>> {
        let city = match City::parse(city) {
            Ok(city) => city,
            Err(reason) => return Ok(Outcome::Refused(reason)),
        };
        let target = match dates::parse_date(date) {
            Ok(date) => date,
            Err(reason) => return Ok(Outcome::Refused(reason)),
        };

        let archive = HistoricalArchive::load(&self.historical_path)?;
        let latest = archive.latest_date(city).ok_or_else(|| {
            WeatherChatError::data(format!("Archive holds no rows for {city}"))
        })?;

        let offset = (target - latest).num_days().max(1);
        let steps = u32::try_from(offset).map_err(|_| {
            WeatherChatError::validation(format!(
                "Requested date {target} is too far past the archive end {latest}"
            ))
        })?;

        info!("Future-date forecast for {city}: {steps} steps past {latest}");
        Ok(Outcome::Report(self.forecast_at_horizon(city, steps)?))
    }

    /// Load both per-city models and report the tail prediction at `steps`
    fn forecast_at_horizon(&self, city: City, steps: u32) -> Result<ForecastReport> {
        let temp_model = self.models.load(city, Quantity::Temperature)?;
        let precip_model = self.models.load(city, Quantity::Precipitation)?;

        let temp = temp_model.predict(steps)?;
        let precip = precip_model.predict(steps)?;

        Ok(ForecastReport {
            predicted_average_temperature: round1(temp.value),
            predicted_average_temperature_lower_bound: round1(temp.lower),
            predicted_average_temperature_upper_bound: round1(temp.upper),
            predicted_precipitation: round1(precip.value),
            predicted_precipitation_lower_bound: round1(precip.lower),
            predicted_precipitation_upper_bound: round1(precip.upper),
        })
    }
}

/// Round to one decimal place, the reporting precision of every forecast field
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ForecastModel, Harmonic};
    use rstest::rstest;
    use std::io::Write;
    use tempfile::TempDir;

    /// Service over a tempdir fixture: archive rows plus artifacts for abidjan
    fn fixture_service() -> (TempDir, ForecastService) {
        let dir = TempDir::new().unwrap();

        let archive_path = dir.path().join("combined_data.csv");
        let mut file = std::fs::File::create(&archive_path).unwrap();
        writeln!(file, "city_name,date,avg_temp_c,precipitation_mm").unwrap();
        writeln!(file, "abidjan,1973-06-01,26.6,0.0").unwrap();
        writeln!(file, "abidjan,2023-09-04,27.1,1.3").unwrap();
        writeln!(file, "abidjan,2023-09-05,26.9,0.8").unwrap();

        let store = ModelStore::new(dir.path());
        for (quantity, level, sigma) in [
            (Quantity::Temperature, 26.5, 1.1),
            (Quantity::Precipitation, 2.0, 0.7),
        ] {
            store
                .save(&ForecastModel {
                    city: "abidjan".to_string(),
                    quantity,
                    train_end: chrono::NaiveDate::from_ymd_opt(2023, 9, 5).unwrap(),
                    level,
                    trend_per_day: 0.002,
                    seasonal: vec![Harmonic {
                        order: 1,
                        sin_coef: 1.4,
                        cos_coef: -0.6,
                    }],
                    sigma,
                })
                .unwrap();
        }

        let data = DataConfig {
            historical_path: archive_path,
            models_dir: dir.path().to_path_buf(),
        };
        let service = ForecastService::new(&data);
        (dir, service)
    }

    /// Service whose paths point nowhere: any file access would error
    fn pathless_service() -> ForecastService {
        ForecastService::new(&DataConfig {
            historical_path: PathBuf::from("/nonexistent/archive.csv"),
            models_dir: PathBuf::from("/nonexistent/models"),
        })
    }

    #[rstest]
    #[case("paris")]
    #[case("LONDON")]
    #[case("kazanx")]
    fn test_unsupported_city_refused_without_file_access(#[case] city: &str) {
        let service = pathless_service();

        // All three operations refuse before touching any file
        let nd = service.next_day_forecast(city).unwrap();
        let rh = service.historical_lookup(city, "2020-01-01").unwrap();
        let ff = service.future_date_forecast(city, "2030-01-01").unwrap();

        assert!(matches!(nd, Outcome::Refused(msg) if msg.contains("not supported")));
        assert!(matches!(rh, Outcome::Refused(msg) if msg.contains("not supported")));
        assert!(matches!(ff, Outcome::Refused(msg) if msg.contains("not supported")));
    }

    #[rstest]
    #[case("gibberish")]
    #[case("2020-40-99")]
    fn test_invalid_date_refused_without_file_access(#[case] date: &str) {
        let service = pathless_service();

        let rh = service.historical_lookup("abidjan", date).unwrap();
        let ff = service.future_date_forecast("abidjan", date).unwrap();

        assert_eq!(rh, Outcome::Refused("Invalid Date Format".to_string()));
        assert!(matches!(ff, Outcome::Refused(msg) if msg == "Invalid Date Format"));
    }

    #[test]
    fn test_historical_lookup_boundary_date() {
        let (_dir, service) = fixture_service();

        let outcome = service.historical_lookup("abidjan", "1973-06-01").unwrap();
        let Outcome::Report(report) = outcome else {
            panic!("expected a report, got {outcome:?}");
        };
        assert_eq!(report.average_temperature, 26.6);
        assert_eq!(report.precipitation_mm, 0.0);
    }

    #[test]
    fn test_historical_lookup_before_coverage() {
        let (_dir, service) = fixture_service();

        // One day before abidjan's earliest archived date
        let outcome = service.historical_lookup("abidjan", "1973-05-31").unwrap();
        assert!(matches!(outcome, Outcome::Refused(msg) if msg.contains("is not available")));
    }

    #[test]
    fn test_next_day_forecast_report_shape() {
        let (_dir, service) = fixture_service();

        let outcome = service.next_day_forecast("Abidjan").unwrap();
        let Outcome::Report(report) = outcome else {
            panic!("expected a report, got {outcome:?}");
        };

        for value in [
            report.predicted_average_temperature,
            report.predicted_average_temperature_lower_bound,
            report.predicted_average_temperature_upper_bound,
            report.predicted_precipitation,
            report.predicted_precipitation_lower_bound,
            report.predicted_precipitation_upper_bound,
        ] {
            // One-decimal rounding leaves no residue at the second decimal
            assert_eq!(round1(value), value);
        }

        assert!(
            report.predicted_average_temperature_lower_bound
                <= report.predicted_average_temperature
        );
        assert!(
            report.predicted_average_temperature
                <= report.predicted_average_temperature_upper_bound
        );
        assert!(
            report.predicted_precipitation_lower_bound <= report.predicted_precipitation
        );
        assert!(
            report.predicted_precipitation <= report.predicted_precipitation_upper_bound
        );
    }

    #[test]
    fn test_future_forecast_one_step_matches_next_day() {
        let (_dir, service) = fixture_service();

        // 2023-09-06 is one day past the fixture archive's latest abidjan row
        let future = service
            .future_date_forecast("abidjan", "2023-09-06")
            .unwrap();
        let next_day = service.next_day_forecast("abidjan").unwrap();

        assert_eq!(future, next_day);
    }

    #[test]
    fn test_next_day_forecast_idempotent() {
        let (_dir, service) = fixture_service();

        let first = service.next_day_forecast("abidjan").unwrap();
        let second = service.next_day_forecast("abidjan").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_past_target_clamps_to_one_step() {
        let (_dir, service) = fixture_service();

        // Permissive behavior: a date inside the archive range still forecasts
        let inside = service
            .future_date_forecast("abidjan", "2023-09-01")
            .unwrap();
        let next_day = service.next_day_forecast("abidjan").unwrap();
        assert_eq!(inside, next_day);
    }

    #[test]
    fn test_refusal_json_shape() {
        let outcome: Outcome<ForecastReport> =
            Outcome::Refused("City: paris currently not supported".to_string());
        let json = outcome.to_json().unwrap();
        assert_eq!(
            json["error"],
            "City: paris currently not supported"
        );
    }

    #[test]
    fn test_missing_artifacts_are_fatal() {
        let dir = TempDir::new().unwrap();
        let archive_path = dir.path().join("combined_data.csv");
        let mut file = std::fs::File::create(&archive_path).unwrap();
        writeln!(file, "city_name,date,avg_temp_c,precipitation_mm").unwrap();
        writeln!(file, "berlin,2023-09-03,16.0,0.1").unwrap();

        let service = ForecastService::new(&DataConfig {
            historical_path: archive_path,
            models_dir: dir.path().to_path_buf(),
        });

        // Valid city, but no artifacts on disk
        assert!(service.next_day_forecast("berlin").is_err());
    }
}
