//! Odds conversion and bet sizing.

use std::collections::BTreeMap;

use super::MarketAnalyzer;
use crate::error::{AnalyticsError, Operation, Result};

impl MarketAnalyzer {
    /// Convert decimal odds into probabilities that sum to one.
    ///
    /// Each outcome contributes `1/odd`, then the set is normalized to strip
    /// the bookmaker margin.
    pub fn implied_probabilities(
        &self,
        odds: &BTreeMap<String, f64>,
    ) -> Result<BTreeMap<String, f64>> {
        for (outcome, &odd) in odds {
            if odd == 0.0 {
                return Err(AnalyticsError::degenerate(
                    Operation::ImpliedProbabilities,
                    format!("odds for {outcome} are zero"),
                ));
            }
            if !odd.is_finite() || odd < 0.0 {
                return Err(AnalyticsError::InvalidInput(format!(
                    "odds for {outcome} must be positive and finite, got {odd}"
                )));
            }
        }

        let total_implied: f64 = odds.values().map(|odd| 1.0 / odd).sum();

        Ok(odds
            .iter()
            .map(|(outcome, odd)| (outcome.clone(), (1.0 / odd) / total_implied))
            .collect())
    }

    /// Full-Kelly stake fraction `(b·p - q) / b` with `b = odds - 1`.
    ///
    /// Negative results mean the bet has negative expectation.
    pub fn kelly_criterion(&self, probability: f64, odds: f64) -> Result<f64> {
        let b = odds - 1.0;
        if b == 0.0 {
            return Err(AnalyticsError::degenerate(
                Operation::KellyCriterion,
                "decimal odds of 1.0 have no payout",
            ));
        }
        let q = 1.0 - probability;
        Ok((b * probability - q) / b)
    }

    /// Edge scaled by the (fractional) Kelly stake, capped at one.
    ///
    /// Returns zero when `true_prob` does not beat `implied_prob`.
    pub fn value_bet_score(
        &self,
        implied_prob: f64,
        true_prob: f64,
        kelly_fraction: f64,
    ) -> Result<f64> {
        let edge = true_prob - implied_prob;
        if edge <= 0.0 {
            return Ok(0.0);
        }

        if implied_prob == 0.0 {
            return Err(AnalyticsError::degenerate(
                Operation::ValueBetScore,
                "implied probability of zero has no fair odds",
            ));
        }

        let kelly = self.kelly_criterion(true_prob, 1.0 / implied_prob)?;
        Ok(edge * (kelly * kelly_fraction).min(1.0))
    }
}
