//! Market-related value types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{AnalyticsError, Result};

/// Snapshot of one outcome in a prediction market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketPosition {
    /// Outcome identifier, unique within a market at a point in time.
    pub outcome: String,
    /// Implied probability. Conceptually in [0, 1] but not validated.
    pub probability: f64,
    /// Resting liquidity behind the outcome.
    pub liquidity: f64,
    /// Traded volume.
    pub volume: f64,
    /// When the snapshot was taken.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl MarketPosition {
    /// Create a new position.
    pub fn new(
        outcome: impl Into<String>,
        probability: f64,
        liquidity: f64,
        volume: f64,
        timestamp: OffsetDateTime,
    ) -> Self {
        Self {
            outcome: outcome.into(),
            probability,
            liquidity,
            volume,
            timestamp,
        }
    }

    /// Bernoulli variance `p(1-p)` of the outcome.
    pub fn variance(&self) -> f64 {
        self.probability * (1.0 - self.probability)
    }
}

/// Unordered pair of outcome names.
///
/// The names are stored sorted so `("b", "a")` and `("a", "b")` are the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutcomePair(String, String);

impl OutcomePair {
    /// Create a normalized pair.
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    /// Lexicographically smaller name.
    pub fn first(&self) -> &str {
        &self.0
    }

    /// Lexicographically larger name.
    pub fn second(&self) -> &str {
        &self.1
    }
}

/// Time-indexed numeric columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeSeriesFrame {
    /// Row timestamps, oldest first.
    pub timestamps: Vec<OffsetDateTime>,
    /// Named numeric columns, each with one value per timestamp.
    pub columns: BTreeMap<String, Vec<f64>>,
}

impl TimeSeriesFrame {
    /// Create a frame, checking every column matches the timestamp count.
    pub fn new(
        timestamps: Vec<OffsetDateTime>,
        columns: BTreeMap<String, Vec<f64>>,
    ) -> Result<Self> {
        let frame = Self {
            timestamps,
            columns,
        };
        frame.check_shape()?;
        Ok(frame)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether the frame has no rows.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub(crate) fn check_shape(&self) -> Result<()> {
        for (name, values) in &self.columns {
            if values.len() != self.timestamps.len() {
                return Err(AnalyticsError::InvalidInput(format!(
                    "column {name} has {} values for {} timestamps",
                    values.len(),
                    self.timestamps.len()
                )));
            }
        }
        Ok(())
    }
}
