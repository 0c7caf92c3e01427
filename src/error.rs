//! Unified error types for the analytics library.

use strum::Display;
use thiserror::Error;

/// Formula that hit a degenerate denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    /// Normalizing decimal odds into probabilities.
    ImpliedProbabilities,
    /// Two-outcome arbitrage check.
    DetectArbitrage,
    /// Kelly bet sizing.
    KellyCriterion,
    /// Edge-weighted Kelly score.
    ValueBetScore,
}

/// Unified error type for the analytics library.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    /// Input is malformed (negative odds, ragged series, too few samples).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A formula would divide by zero.
    #[error("degenerate arithmetic in {operation}: {reason}")]
    DegenerateArithmetic {
        /// Which formula failed.
        operation: Operation,
        /// What made it degenerate.
        reason: String,
    },
}

impl AnalyticsError {
    pub(crate) fn degenerate(operation: Operation, reason: impl Into<String>) -> Self {
        Self::DegenerateArithmetic {
            operation,
            reason: reason.into(),
        }
    }
}

/// Configuration loading or validation error.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment could not be deserialized.
    #[error("configuration error: {0}")]
    Env(#[from] envy::Error),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Failure reading analysis input files.
#[derive(Error, Debug)]
pub enum InputError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// A field could not be parsed.
    #[error("line {line}: {reason}")]
    Parse {
        /// 1-based line number in the source file.
        line: usize,
        /// What was wrong with the field.
        reason: String,
    },

    /// The parsed data was rejected by the analyzer.
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AnalyticsError>;
