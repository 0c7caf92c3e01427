//! Market analytics over prediction-market positions.
//!
//! Every operation is a pure function of its inputs. [`MarketAnalyzer`] only
//! carries immutable configuration (the risk-free rate and the notional
//! arbitrage stake), so one instance can be shared freely across threads.
//!
//! The formulas are grouped by concern:
//! - [`odds`]: implied probabilities, Kelly sizing, value-bet scoring
//! - [`arbitrage`]: two-outcome arbitrage detection
//! - [`microstructure`]: efficiency, sentiment, liquidity, depth, manipulation
//! - [`portfolio`]: Sharpe ratio, portfolio variance, minimum-risk weights
//! - [`forecast`]: ARIMA(1,1,1) projection of time-indexed columns

pub mod arbitrage;
pub mod forecast;
pub mod microstructure;
pub mod odds;
pub mod portfolio;

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::market::MarketPosition;
use crate::metrics::LatencyTimer;

pub use arbitrage::ArbitrageOpportunity;
pub use forecast::ArimaFit;

/// Trading periods per year used to annualize the Sharpe ratio.
pub const DEFAULT_PERIODS: u32 = 252;

/// Notional stake used to price arbitrage opportunities.
pub const DEFAULT_ARBITRAGE_STAKE: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Default deviation from the mean probability that flags an outcome.
pub const DEFAULT_MANIPULATION_THRESHOLD: f64 = 0.1;

/// Stateless analytics over market positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketAnalyzer {
    risk_free_rate: f64,
    arbitrage_stake: Decimal,
}

impl Default for MarketAnalyzer {
    fn default() -> Self {
        Self::new(0.02)
    }
}

impl MarketAnalyzer {
    /// Create an analyzer with the given per-period risk-free rate.
    pub fn new(risk_free_rate: f64) -> Self {
        Self {
            risk_free_rate,
            arbitrage_stake: DEFAULT_ARBITRAGE_STAKE,
        }
    }

    /// Use a different notional stake when pricing arbitrage.
    pub fn with_arbitrage_stake(mut self, stake: Decimal) -> Self {
        self.arbitrage_stake = stake;
        self
    }

    /// Configured risk-free rate.
    pub fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    /// Configured arbitrage stake.
    pub fn arbitrage_stake(&self) -> Decimal {
        self.arbitrage_stake
    }

    /// Compute every single-market statistic in one pass over the snapshot.
    pub fn summarize(&self, positions: &[MarketPosition], threshold: f64) -> MarketSummary {
        let _timer = LatencyTimer::new("summarize");

        MarketSummary {
            outcomes: positions.len(),
            efficiency: self.market_efficiency(positions),
            overround: self.overround(positions),
            liquidity_score: self.liquidity_score(positions),
            sentiment: self.analyze_market_sentiment(positions),
            depth: self.market_depth(positions),
            suspicious_outcomes: self.detect_market_manipulation(positions, threshold),
        }
    }
}

/// Snapshot statistics for a single market.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSummary {
    /// Number of positions analyzed.
    pub outcomes: usize,
    /// `1 - |Σp - 1|`, floored at zero.
    pub efficiency: f64,
    /// `Σp - 1`.
    pub overround: f64,
    /// Mean share of aggregate volume.
    pub liquidity_score: f64,
    /// Volume-weighted probability per outcome.
    pub sentiment: BTreeMap<String, f64>,
    /// Rank-discounted liquidity per outcome.
    pub depth: BTreeMap<String, f64>,
    /// Outcomes far from the mean probability.
    pub suspicious_outcomes: Vec<String>,
}
