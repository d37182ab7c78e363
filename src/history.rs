//! Historical weather archive
//!
//! A flat CSV table with columns `city_name,date,avg_temp_c,precipitation_mm`,
//! read fresh on every call: the archive is owned by an external data
//! collaborator and nothing here caches it. Lookup is exact-date only — no
//! nearest-date fallback, no interpolation.

use crate::city::City;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::StringRecord;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use tracing::{debug, instrument, warn};

use crate::WeatherChatError;

/// One archived observation for a city on a date
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalRecord {
    pub city: City,
    pub date: NaiveDate,
    pub avg_temp_c: f64,
    pub precipitation_mm: f64,
}

/// In-memory view of the archive for the duration of one call
#[derive(Debug)]
pub struct HistoricalArchive {
    records: Vec<HistoricalRecord>,
}

const REQUIRED_COLUMNS: [&str; 4] = ["city_name", "date", "avg_temp_c", "precipitation_mm"];

impl HistoricalArchive {
    /// Load the archive from a CSV file
    ///
    /// Rows for unsupported cities are skipped silently (the table may hold
    /// more cities than the assistant covers). A malformed row for a
    /// supported city is a data error.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open historical archive '{}'", path.display()))?;

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(file);

        let headers = reader
            .headers()
            .with_context(|| "Failed to read archive headers")?
            .clone();
        let columns = Self::column_indices(&headers)?;

        let mut records = Vec::new();
        for (line, row) in reader.records().enumerate() {
            let row = row.with_context(|| format!("Failed to read archive row {}", line + 2))?;

            let city_name = row.get(columns["city_name"]).unwrap_or_default();
            let Ok(city) = City::parse(city_name) else {
                // Other cities in the shared table are not ours to validate
                continue;
            };

            records.push(Self::parse_row(&row, &columns, city, line + 2)?);
        }

        debug!("Loaded {} archive records", records.len());
        Ok(Self { records })
    }

    fn column_indices(headers: &StringRecord) -> Result<HashMap<&'static str, usize>> {
        let mut columns = HashMap::new();
        for name in REQUIRED_COLUMNS {
            let index = headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| {
                    WeatherChatError::data(format!("Archive is missing the '{name}' column"))
                })?;
            columns.insert(name, index);
        }
        Ok(columns)
    }

    fn parse_row(
        row: &StringRecord,
        columns: &HashMap<&'static str, usize>,
        city: City,
        line: usize,
    ) -> Result<HistoricalRecord> {
        let field = |name: &'static str| row.get(columns[name]).unwrap_or_default();

        let date = NaiveDate::parse_from_str(field("date"), "%Y-%m-%d").map_err(|e| {
            WeatherChatError::data(format!("Archive row {line}: bad date '{}': {e}", field("date")))
        })?;
        let avg_temp_c: f64 = field("avg_temp_c").parse().map_err(|e| {
            WeatherChatError::data(format!("Archive row {line}: bad avg_temp_c: {e}"))
        })?;
        let precipitation_mm: f64 = field("precipitation_mm").parse().map_err(|e| {
            WeatherChatError::data(format!("Archive row {line}: bad precipitation_mm: {e}"))
        })?;

        Ok(HistoricalRecord {
            city,
            date,
            avg_temp_c,
            precipitation_mm,
        })
    }

    /// Exact-match lookup for a city and date
    #[must_use]
    pub fn lookup(&self, city: City, date: NaiveDate) -> Option<&HistoricalRecord> {
        self.records
            .iter()
            .find(|r| r.city == city && r.date == date)
    }

    /// Latest archived date for a city, the anchor for future-date offsets
    #[must_use]
    pub fn latest_date(&self, city: City) -> Option<NaiveDate> {
        let latest = self
            .records
            .iter()
            .filter(|r| r.city == city)
            .map(|r| r.date)
            .max();
        if latest.is_none() {
            warn!("No archive rows found for {city}");
        }
        latest
    }

    /// Number of loaded records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the archive holds no records for any supported city
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_archive(rows: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "city_name,date,avg_temp_c,precipitation_mm").unwrap();
        write!(file, "{rows}").unwrap();
        file
    }

    #[test]
    fn test_lookup_exact_match() {
        let file = write_archive(
            "abidjan,1973-06-01,26.6,0.0\n\
             abidjan,1973-06-02,25.9,3.2\n\
             berlin,1973-06-01,18.1,1.4\n",
        );
        let archive = HistoricalArchive::load(file.path()).unwrap();

        let record = archive
            .lookup(City::Abidjan, NaiveDate::from_ymd_opt(1973, 6, 1).unwrap())
            .unwrap();
        assert_eq!(record.avg_temp_c, 26.6);
        assert_eq!(record.precipitation_mm, 0.0);

        // No nearest-date fallback
        assert!(archive
            .lookup(City::Abidjan, NaiveDate::from_ymd_opt(1973, 6, 3).unwrap())
            .is_none());
    }

    #[test]
    fn test_latest_date_per_city() {
        let file = write_archive(
            "toronto,2023-08-27,21.0,0.0\n\
             toronto,2023-08-28,22.5,1.1\n\
             kazan,2023-09-05,14.2,0.4\n",
        );
        let archive = HistoricalArchive::load(file.path()).unwrap();

        assert_eq!(
            archive.latest_date(City::Toronto),
            Some(NaiveDate::from_ymd_opt(2023, 8, 28).unwrap())
        );
        assert_eq!(
            archive.latest_date(City::Kazan),
            Some(NaiveDate::from_ymd_opt(2023, 9, 5).unwrap())
        );
        assert_eq!(archive.latest_date(City::Berlin), None);
    }

    #[test]
    fn test_unsupported_city_rows_skipped() {
        let file = write_archive(
            "paris,2020-01-01,not-a-number,0.0\n\
             berlin,2020-01-01,3.5,0.2\n",
        );
        let archive = HistoricalArchive::load(file.path()).unwrap();
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn test_malformed_supported_row_is_error() {
        let file = write_archive("berlin,2020-01-01,not-a-number,0.2\n");
        let result = HistoricalArchive::load(file.path());
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("bad avg_temp_c"));
    }

    #[test]
    fn test_missing_column_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "city_name,date,avg_temp_c").unwrap();
        writeln!(file, "berlin,2020-01-01,3.5").unwrap();
        let result = HistoricalArchive::load(file.path());
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("precipitation_mm"));
    }
}
