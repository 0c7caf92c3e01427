//! Arbitrage opportunity detection.
//!
//! The check is a two-outcome heuristic: within a market it pairs the least
//! and most likely outcomes and asks whether backing both at their implied
//! odds returns more than the stake. Markets with three or more outcomes are
//! reduced to their extremes; the middle outcomes are ignored, so this is not
//! a general n-outcome arbitrage solver.

use std::collections::BTreeMap;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};

use super::MarketAnalyzer;
use crate::error::{AnalyticsError, Operation, Result};
use crate::market::MarketPosition;
use crate::metrics::{self, LatencyTimer};

/// Detected arbitrage opportunity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbitrageOpportunity {
    /// Market the opportunity was found in.
    pub market_id: String,
    /// Profit as a fraction of the stake.
    pub profit_percentage: f64,
    /// Notional stake the profit is priced against.
    pub required_stake: Decimal,
    /// Expected profit on the stake.
    pub expected_return: Decimal,
    /// Least likely outcome first, most likely second.
    pub outcomes: (String, String),
    /// When the opportunity was detected.
    #[serde(with = "time::serde::rfc3339")]
    pub detected_at: OffsetDateTime,
}

impl ArbitrageOpportunity {
    /// Profit as a percentage of the stake.
    pub fn roi(&self) -> f64 {
        self.profit_percentage * 100.0
    }
}

impl MarketAnalyzer {
    /// Scan every market for a two-outcome arbitrage.
    ///
    /// Markets with fewer than two positions are skipped, as are markets whose
    /// profit does not fit a `Decimal`. A selected leg with zero probability
    /// has unbounded odds and is reported as an error.
    #[instrument(skip(self, markets), fields(markets = markets.len()))]
    pub fn detect_arbitrage(
        &self,
        markets: &BTreeMap<String, Vec<MarketPosition>>,
    ) -> Result<Vec<ArbitrageOpportunity>> {
        let _timer = LatencyTimer::new("detect_arbitrage");
        let mut opportunities = Vec::new();

        for (market_id, positions) in markets {
            if positions.len() < 2 {
                debug!(market = %market_id, positions = positions.len(), "Skipping market");
                metrics::inc_markets_skipped();
                continue;
            }

            if let Some(opp) = self.price_market(market_id, positions)? {
                info!(
                    market = %market_id,
                    profit_percentage = opp.profit_percentage,
                    expected_return = %opp.expected_return,
                    "Arbitrage opportunity detected"
                );
                metrics::inc_opportunities_detected();
                opportunities.push(opp);
            }
        }

        Ok(opportunities)
    }

    /// Price the extreme-probability pair of one market.
    fn price_market(
        &self,
        market_id: &str,
        positions: &[MarketPosition],
    ) -> Result<Option<ArbitrageOpportunity>> {
        let mut sorted: Vec<&MarketPosition> = positions.iter().collect();
        sorted.sort_by(|a, b| a.probability.total_cmp(&b.probability));

        let (best_bid, best_ask) = match (sorted.first(), sorted.last()) {
            (Some(bid), Some(ask)) => (*bid, *ask),
            _ => return Ok(None),
        };

        if best_bid.probability + best_ask.probability >= 1.0 {
            return Ok(None);
        }

        if best_bid.probability == 0.0 || best_ask.probability == 0.0 {
            return Err(AnalyticsError::degenerate(
                Operation::DetectArbitrage,
                format!("market {market_id} has an outcome priced at zero probability"),
            ));
        }

        let stake = self.arbitrage_stake.to_f64().ok_or_else(|| {
            AnalyticsError::InvalidInput(format!(
                "stake {} is not representable",
                self.arbitrage_stake
            ))
        })?;
        let profit =
            stake * (1.0 / best_bid.probability + 1.0 / best_ask.probability - 2.0);

        if profit <= 0.0 {
            return Ok(None);
        }

        let expected_return = match Decimal::from_f64(profit) {
            Some(value) => value.round_dp(8),
            None => {
                warn!(market = %market_id, profit, "Profit exceeds decimal range, skipping market");
                metrics::inc_markets_skipped();
                return Ok(None);
            }
        };

        Ok(Some(ArbitrageOpportunity {
            market_id: market_id.to_string(),
            profit_percentage: profit / stake,
            required_stake: self.arbitrage_stake,
            expected_return,
            outcomes: (best_bid.outcome.clone(), best_ask.outcome.clone()),
            detected_at: OffsetDateTime::now_utc(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MarketBuilder;
    use rust_decimal_macros::dec;

    fn markets(entries: Vec<(&str, Vec<MarketPosition>)>) -> BTreeMap<String, Vec<MarketPosition>> {
        entries
            .into_iter()
            .map(|(id, positions)| (id.to_string(), positions))
            .collect()
    }

    #[test]
    fn detect_arbitrage_when_extremes_underpriced() {
        let input = markets(vec![(
            "M1",
            MarketBuilder::new().outcome("a", 0.3).outcome("b", 0.4).build(),
        )]);

        let opps = MarketAnalyzer::default().detect_arbitrage(&input).unwrap();

        assert_eq!(opps.len(), 1);
        let opp = &opps[0];
        assert_eq!(opp.market_id, "M1");
        assert!(opp.profit_percentage > 0.0);
        assert_eq!(opp.required_stake, dec!(1000));
        assert_eq!(opp.outcomes, ("a".to_string(), "b".to_string()));
        // 1000 * (1/0.3 + 1/0.4 - 2) = 3833.33...
        assert!((opp.profit_percentage - 3.833_333_333).abs() < 1e-6);
        assert_eq!(opp.expected_return.round_dp(2), dec!(3833.33));
    }

    #[test]
    fn no_arbitrage_when_overpriced() {
        let input = markets(vec![(
            "M1",
            MarketBuilder::new().outcome("a", 0.6).outcome("b", 0.5).build(),
        )]);

        let opps = MarketAnalyzer::default().detect_arbitrage(&input).unwrap();

        assert!(opps.is_empty());
    }

    #[test]
    fn single_outcome_markets_are_skipped() {
        let input = markets(vec![
            ("thin", MarketBuilder::new().outcome("a", 0.1).build()),
            ("empty", Vec::new()),
        ]);

        let opps = MarketAnalyzer::default().detect_arbitrage(&input).unwrap();

        assert!(opps.is_empty());
    }

    #[test]
    fn zero_probability_leg_is_an_error() {
        let input = markets(vec![(
            "M1",
            MarketBuilder::new().outcome("a", 0.0).outcome("b", 0.5).build(),
        )]);

        let result = MarketAnalyzer::default().detect_arbitrage(&input);

        assert!(matches!(
            result,
            Err(AnalyticsError::DegenerateArithmetic {
                operation: Operation::DetectArbitrage,
                ..
            })
        ));
    }

    #[test]
    fn stake_scales_expected_return() {
        let input = markets(vec![(
            "M1",
            MarketBuilder::new().outcome("a", 0.25).outcome("b", 0.5).build(),
        )]);

        let analyzer = MarketAnalyzer::default().with_arbitrage_stake(dec!(10));
        let opps = analyzer.detect_arbitrage(&input).unwrap();

        // 10 * (4 + 2 - 2) = 40
        assert_eq!(opps[0].expected_return, dec!(40));
        assert!((opps[0].roi() - 400.0).abs() < 1e-9);
    }

    #[test]
    fn middle_outcomes_are_ignored() {
        let input = markets(vec![(
            "M1",
            MarketBuilder::new()
                .outcome("low", 0.2)
                .outcome("mid", 0.9)
                .outcome("high", 0.7)
                .build(),
        )]);

        let opps = MarketAnalyzer::default().detect_arbitrage(&input).unwrap();

        // extremes are low=0.2 and mid=0.9, sum 1.1
        assert!(opps.is_empty());
    }

    #[test]
    fn out_of_range_profit_skips_only_that_market() {
        let input = markets(vec![
            (
                "M1",
                MarketBuilder::new().outcome("a", 1e-27).outcome("b", 0.5).build(),
            ),
            (
                "M2",
                MarketBuilder::new().outcome("a", 0.3).outcome("b", 0.4).build(),
            ),
        ]);

        let opps = MarketAnalyzer::default().detect_arbitrage(&input).unwrap();

        assert_eq!(opps.len(), 1);
        assert_eq!(opps[0].market_id, "M2");
    }
}
