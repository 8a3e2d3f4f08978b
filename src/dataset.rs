//! Static airport reference dataset
//!
//! The dataset is a JSON file read once at startup. Two layouts are accepted:
//! an array of airport records (the full layout written by `build-airport-dataset`)
//! or an object mapping city name to airport code (the older flat layout).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Why a dataset could not be loaded
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read dataset file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dataset is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected dataset shape: {0}")]
    UnexpectedShape(String),

    #[error("Failed to read OpenFlights CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// One airport row of the reference dataset
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AirportRecord {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default, alias = "iata")]
    pub code: String,
    #[serde(default)]
    pub name: String,
}

impl AirportRecord {
    pub fn new(city: &str, country: &str, code: &str, name: &str) -> Self {
        Self {
            city: city.to_string(),
            country: country.to_string(),
            code: code.to_string(),
            name: name.to_string(),
        }
    }
}

/// On-disk layout the dataset was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetLayout {
    /// Array of `{city, country, code|iata, name}` objects
    Records,
    /// Object of `city -> code`, no country or airport name available
    CityCodeMap,
}

/// Parsed dataset, records kept in file order
#[derive(Debug, Clone)]
pub struct AirportDataset {
    pub layout: DatasetLayout,
    pub records: Vec<AirportRecord>,
}

/// Read and parse a dataset file
#[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<AirportDataset, DatasetError> {
    let text = std::fs::read_to_string(path.as_ref())?;
    debug!(bytes = text.len(), "Read dataset file");
    let dataset = parse_dataset(&text)?;
    info!(
        layout = ?dataset.layout,
        records = dataset.records.len(),
        "Dataset loaded"
    );
    Ok(dataset)
}

/// Parse dataset JSON text, detecting the layout from the top-level value
pub fn parse_dataset(text: &str) -> Result<AirportDataset, DatasetError> {
    let value: Value = serde_json::from_str(text)?;

    // Malformed rows are skipped one by one; only a wrong top-level value fails the load
    let mut malformed = 0usize;
    let (layout, records) = match value {
        Value::Array(items) => {
            let mut records = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                let kind = json_kind(&item);
                if !item.is_object() {
                    debug!(row = i, kind, "Skipping dataset row that is not an object");
                    malformed += 1;
                    continue;
                }
                match serde_json::from_value::<AirportRecord>(item) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        let cause = DatasetError::Json(e);
                        debug!(row = i, error = %cause, "Skipping malformed dataset row");
                        malformed += 1;
                    }
                }
            }
            (DatasetLayout::Records, records)
        }
        Value::Object(map) => {
            let mut records = Vec::with_capacity(map.len());
            for (city, code) in map {
                match code {
                    Value::String(code) => records.push(AirportRecord {
                        city,
                        code,
                        ..Default::default()
                    }),
                    other => {
                        debug!(
                            city = city.as_str(),
                            kind = json_kind(&other),
                            "Skipping city whose code is not a string"
                        );
                        malformed += 1;
                    }
                }
            }
            (DatasetLayout::CityCodeMap, records)
        }
        other => {
            return Err(DatasetError::UnexpectedShape(format!(
                "top-level value is {}, expected an array or an object",
                json_kind(&other)
            )))
        }
    };

    let total = records.len();
    let records: Vec<AirportRecord> = records
        .into_iter()
        .filter(|r| !r.code.trim().is_empty())
        .collect();
    if records.len() < total {
        debug!(dropped = total - records.len(), "Dropped records without an airport code");
    }
    if malformed > 0 {
        warn!(malformed, kept = records.len(), "Skipped malformed dataset rows");
    }

    Ok(AirportDataset { layout, records })
}

/// Convert an OpenFlights `airports.dat` CSV into airport records
///
/// Columns used: 1 name, 2 city, 3 country, 4 IATA. Rows without an IATA code
/// (empty or `\N`) are skipped.
pub fn records_from_openflights<R: Read>(reader: R) -> Result<Vec<AirportRecord>, DatasetError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for row in csv_reader.records() {
        let row = row?;
        let field = |i: usize| row.get(i).unwrap_or("").trim().to_string();

        let code = field(4);
        if code.is_empty() || code == "\\N" {
            skipped += 1;
            continue;
        }
        records.push(AirportRecord {
            city: field(2),
            country: field(3),
            code,
            name: field(1),
        });
    }

    info!(records = records.len(), skipped, "Converted OpenFlights airports");
    Ok(records)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
