//! Market data types.
//!
//! This module handles:
//! - Position snapshots and correlation keys
//! - Time-indexed series for forecasting
//! - A builder for assembling market snapshots
//! - JSON and CSV input readers

pub mod builder;
pub mod input;
pub mod types;

pub use builder::MarketBuilder;
pub use types::{MarketPosition, OutcomePair, TimeSeriesFrame};
