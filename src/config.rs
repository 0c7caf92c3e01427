//! Application configuration loaded from environment variables.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::analyzer::{MarketAnalyzer, DEFAULT_PERIODS};
use crate::error::ConfigError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Analyzer ===
    /// Per-period risk-free rate subtracted from mean returns.
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,

    /// Periods per year used to annualize the Sharpe ratio.
    #[serde(default = "default_periods")]
    pub annualization_periods: u32,

    /// Notional stake used when pricing arbitrage opportunities.
    #[serde(default = "default_arbitrage_stake")]
    pub arbitrage_stake: Decimal,

    // === Defaults for CLI commands ===
    /// Fraction of full Kelly applied to value-bet scores.
    #[serde(default = "default_kelly_fraction")]
    pub kelly_fraction: f64,

    /// Deviation from the mean probability that flags an outcome.
    #[serde(default = "default_manipulation_threshold")]
    pub manipulation_threshold: f64,

    /// Number of steps projected by the forecaster.
    #[serde(default = "default_forecast_periods")]
    pub forecast_periods: usize,

    // === Logging ===
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_risk_free_rate() -> f64 {
    0.02
}

fn default_periods() -> u32 {
    DEFAULT_PERIODS
}

fn default_arbitrage_stake() -> Decimal {
    Decimal::new(1000, 0)
}

fn default_kelly_fraction() -> f64 {
    1.0
}

fn default_manipulation_threshold() -> f64 {
    0.1
}

fn default_forecast_periods() -> usize {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            risk_free_rate: default_risk_free_rate(),
            annualization_periods: default_periods(),
            arbitrage_stake: default_arbitrage_stake(),
            kelly_fraction: default_kelly_fraction(),
            manipulation_threshold: default_manipulation_threshold(),
            forecast_periods: default_forecast_periods(),
            rust_log: default_log_level(),
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Ok(envy::from_env()?)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.risk_free_rate.is_finite() {
            return Err(ConfigError::Invalid(
                "RISK_FREE_RATE must be a finite number".to_string(),
            ));
        }

        if self.annualization_periods == 0 {
            return Err(ConfigError::Invalid(
                "ANNUALIZATION_PERIODS must be at least 1".to_string(),
            ));
        }

        if self.arbitrage_stake <= Decimal::ZERO {
            return Err(ConfigError::Invalid(
                "ARBITRAGE_STAKE must be positive".to_string(),
            ));
        }

        if !(self.kelly_fraction > 0.0 && self.kelly_fraction <= 1.0) {
            return Err(ConfigError::Invalid(
                "KELLY_FRACTION must be in (0, 1]".to_string(),
            ));
        }

        if !(self.manipulation_threshold >= 0.0) {
            return Err(ConfigError::Invalid(
                "MANIPULATION_THRESHOLD must be non-negative".to_string(),
            ));
        }

        Ok(())
    }

    /// Tracing filter directive for the configured verbosity.
    ///
    /// Verbose mode (from `VERBOSE` or the CLI flag) turns on debug output for
    /// this crate; otherwise `RUST_LOG` is used as given.
    pub fn log_filter(&self, verbose: bool) -> String {
        if verbose || self.verbose {
            "market_analytics=debug,info".to_string()
        } else {
            self.rust_log.clone()
        }
    }

    /// Build an analyzer from the configured rate and stake.
    pub fn analyzer(&self) -> MarketAnalyzer {
        MarketAnalyzer::new(self.risk_free_rate).with_arbitrage_stake(self.arbitrage_stake)
    }
}
