//! Single-market statistics: coherence, sentiment, liquidity and depth.
//!
//! Empty snapshots yield neutral values (zero or empty collections) rather
//! than errors.

use std::collections::BTreeMap;

use super::MarketAnalyzer;
use crate::market::MarketPosition;

fn total_probability(positions: &[MarketPosition]) -> f64 {
    positions.iter().map(|p| p.probability).sum()
}

fn total_volume(positions: &[MarketPosition]) -> f64 {
    positions.iter().map(|p| p.volume).sum()
}

impl MarketAnalyzer {
    /// How close implied probabilities sum to one: `max(0, 1 - |Σp - 1|)`.
    pub fn market_efficiency(&self, positions: &[MarketPosition]) -> f64 {
        (1.0 - self.overround(positions).abs()).max(0.0)
    }

    /// Amount by which implied probabilities exceed one.
    pub fn overround(&self, positions: &[MarketPosition]) -> f64 {
        total_probability(positions) - 1.0
    }

    /// Volume-weighted probability per outcome.
    pub fn analyze_market_sentiment(&self, positions: &[MarketPosition]) -> BTreeMap<String, f64> {
        let total = total_volume(positions);

        positions
            .iter()
            .map(|pos| {
                let weight = if total > 0.0 { pos.volume / total } else { 0.0 };
                (pos.outcome.clone(), pos.probability * weight)
            })
            .collect()
    }

    /// Mean share of aggregate volume across positions.
    pub fn liquidity_score(&self, positions: &[MarketPosition]) -> f64 {
        if positions.is_empty() {
            return 0.0;
        }

        let total = total_volume(positions);
        let shares: f64 = positions
            .iter()
            .map(|pos| if total > 0.0 { pos.volume / total } else { 0.0 })
            .sum();

        shares / positions.len() as f64
    }

    /// Outcomes whose probability strays from the mean by more than `threshold`.
    pub fn detect_market_manipulation(
        &self,
        positions: &[MarketPosition],
        threshold: f64,
    ) -> Vec<String> {
        if positions.is_empty() {
            return Vec::new();
        }

        let avg = total_probability(positions) / positions.len() as f64;

        positions
            .iter()
            .filter(|pos| (pos.probability - avg).abs() > threshold)
            .map(|pos| pos.outcome.clone())
            .collect()
    }

    /// Liquidity discounted by probability rank: `liquidity / (rank + 1)`.
    ///
    /// Ranks are assigned in ascending probability order, so the least likely
    /// outcome keeps its full liquidity.
    pub fn market_depth(&self, positions: &[MarketPosition]) -> BTreeMap<String, f64> {
        let mut sorted: Vec<&MarketPosition> = positions.iter().collect();
        sorted.sort_by(|a, b| a.probability.total_cmp(&b.probability));

        sorted
            .into_iter()
            .enumerate()
            .map(|(rank, pos)| (pos.outcome.clone(), pos.liquidity / (rank + 1) as f64))
            .collect()
    }
}
