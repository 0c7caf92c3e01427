//! Prediction market analytics.
//!
//! Pure formulas over market snapshots: implied probabilities, market
//! efficiency, two-outcome arbitrage, Kelly sizing, Sharpe ratio, portfolio
//! variance and minimum-risk allocation, sentiment, liquidity, depth,
//! manipulation flags and ARIMA forecasting.
//!
//! ```text
//! Outcome A implied: 0.30
//! Outcome B implied: 0.40
//! ─────────────────────────
//! Total:             0.70 < 1.00
//! Profit on 1000:    1000 · (1/0.30 + 1/0.40 - 2) = 3833.33
//! ```
//!
//! # Modules
//!
//! - [`analyzer`]: The [`MarketAnalyzer`] and its formulas
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`market`]: Position snapshots and time series
//! - [`metrics`]: Counters and latency histograms

pub mod analyzer;
pub mod config;
pub mod error;
pub mod market;
pub mod metrics;

pub use analyzer::{ArbitrageOpportunity, MarketAnalyzer, MarketSummary};
pub use config::Config;
pub use error::{AnalyticsError, Result};
pub use market::{MarketPosition, OutcomePair, TimeSeriesFrame};
