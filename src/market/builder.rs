//! Builder for market snapshots.
//!
//! Handy for tests and for assembling positions from loosely structured
//! input without repeating the timestamp on every outcome.

use time::OffsetDateTime;

use super::types::MarketPosition;

/// Builder for the positions of a single market.
#[derive(Debug, Clone)]
pub struct MarketBuilder {
    timestamp: OffsetDateTime,
    positions: Vec<MarketPosition>,
}

impl MarketBuilder {
    /// Create a builder stamped with the current time.
    pub fn new() -> Self {
        Self::at(OffsetDateTime::now_utc())
    }

    /// Create a builder stamped with the given time.
    pub fn at(timestamp: OffsetDateTime) -> Self {
        Self {
            timestamp,
            positions: Vec::new(),
        }
    }

    /// Add an outcome with no liquidity or volume.
    pub fn outcome(self, outcome: impl Into<String>, probability: f64) -> Self {
        self.outcome_with(outcome, probability, 0.0, 0.0)
    }

    /// Add an outcome with liquidity and volume.
    pub fn outcome_with(
        mut self,
        outcome: impl Into<String>,
        probability: f64,
        liquidity: f64,
        volume: f64,
    ) -> Self {
        self.positions.push(MarketPosition::new(
            outcome,
            probability,
            liquidity,
            volume,
            self.timestamp,
        ));
        self
    }

    /// Spread probability evenly over `n` outcomes named `o0..o{n-1}`.
    pub fn uniform(mut self, n: usize, liquidity: f64, volume: f64) -> Self {
        if n == 0 {
            return self;
        }
        let p = 1.0 / n as f64;
        for i in 0..n {
            self = self.outcome_with(format!("o{i}"), p, liquidity, volume);
        }
        self
    }

    /// Build the positions in insertion order.
    pub fn build(self) -> Vec<MarketPosition> {
        self.positions
    }
}

impl Default for MarketBuilder {
    fn default() -> Self {
        Self::new()
    }
}
