//! Readers for analysis input files.
//!
//! JSON for positions, markets, odds, returns and correlations; CSV with a
//! `timestamp` column for time series.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::types::{MarketPosition, OutcomePair, TimeSeriesFrame};
use crate::error::InputError;

/// One correlation entry as stored on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct CorrelationEntry {
    /// First outcome.
    pub a: String,
    /// Second outcome.
    pub b: String,
    /// Correlation coefficient.
    pub correlation: f64,
}

/// Read any JSON document from a file.
pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, InputError> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Read a list of positions.
pub fn load_positions(path: impl AsRef<Path>) -> Result<Vec<MarketPosition>, InputError> {
    read_json(path)
}

/// Read positions grouped by market id.
pub fn load_markets(
    path: impl AsRef<Path>,
) -> Result<BTreeMap<String, Vec<MarketPosition>>, InputError> {
    read_json(path)
}

/// Read decimal odds by outcome.
pub fn load_odds(path: impl AsRef<Path>) -> Result<BTreeMap<String, f64>, InputError> {
    read_json(path)
}

/// Read a list of period returns.
pub fn load_returns(path: impl AsRef<Path>) -> Result<Vec<f64>, InputError> {
    read_json(path)
}

/// Read correlation entries keyed by unordered outcome pair.
pub fn load_correlations(
    path: impl AsRef<Path>,
) -> Result<HashMap<OutcomePair, f64>, InputError> {
    let entries: Vec<CorrelationEntry> = read_json(path)?;
    Ok(correlation_map(entries))
}

/// Key correlation entries by unordered pair; later entries win.
pub fn correlation_map(entries: Vec<CorrelationEntry>) -> HashMap<OutcomePair, f64> {
    entries
        .into_iter()
        .map(|e| (OutcomePair::new(e.a, e.b), e.correlation))
        .collect()
}

/// Read a time series CSV file.
pub fn load_series(path: impl AsRef<Path>) -> Result<TimeSeriesFrame, InputError> {
    read_series(File::open(path)?)
}

/// Parse a time series CSV with a `timestamp` column and numeric columns.
pub fn read_series<R: Read>(reader: R) -> Result<TimeSeriesFrame, InputError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();

    let ts_index = headers
        .iter()
        .position(|h| h == "timestamp")
        .ok_or_else(|| InputError::Parse {
            line: 1,
            reason: "missing timestamp column".to_string(),
        })?;

    let mut timestamps = Vec::new();
    let mut columns: BTreeMap<String, Vec<f64>> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != ts_index)
        .map(|(_, h)| (h.to_string(), Vec::new()))
        .collect();

    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let line = row + 2;

        for (i, field) in record.iter().enumerate() {
            let name = &headers[i];
            if i == ts_index {
                let ts = OffsetDateTime::parse(field.trim(), &Rfc3339).map_err(|e| {
                    InputError::Parse {
                        line,
                        reason: format!("bad timestamp {field:?}: {e}"),
                    }
                })?;
                timestamps.push(ts);
            } else {
                let value: f64 = field.trim().parse().map_err(|_| InputError::Parse {
                    line,
                    reason: format!("bad value {field:?} in column {name}"),
                })?;
                if let Some(column) = columns.get_mut(name) {
                    column.push(value);
                }
            }
        }
    }

    Ok(TimeSeriesFrame::new(timestamps, columns)?)
}
