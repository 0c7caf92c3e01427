//! Return, variance and allocation across a set of positions.

use std::collections::{BTreeMap, HashMap};

use good_lp::solvers::highs::highs;
use good_lp::{constraint, variable, variables, Expression, Solution, SolverModel, Variable};
use ndarray::{Array1, Array2, ArrayView1};
use tracing::{debug, instrument, warn};

use super::MarketAnalyzer;
use crate::market::{MarketPosition, OutcomePair};
use crate::metrics::{self, LatencyTimer};

/// Minimum-risk allocation found by the portfolio solver.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    /// Weight per position, in input order.
    pub weights: Vec<f64>,
    /// `sqrt(Σ wᵢ(pᵢ - w·p)²)` at the optimum.
    pub risk: f64,
}

impl MarketAnalyzer {
    /// Annualized Sharpe ratio `(mean - rf) · sqrt(periods) / stdev`.
    ///
    /// Uses the population standard deviation. Returns zero for fewer than two
    /// samples or a flat return series. A stdev below rounding noise relative
    /// to the mean counts as flat; small but genuine dispersion does not.
    pub fn sharpe_ratio(&self, returns: &[f64], periods: u32) -> f64 {
        if returns.len() < 2 || returns.iter().all(|r| *r == returns[0]) {
            return 0.0;
        }

        let returns = ArrayView1::from(returns);
        let mean = match returns.mean() {
            Some(mean) => mean,
            None => return 0.0,
        };
        let std = returns.std(0.0);
        if std <= f64::EPSILON * mean.abs() {
            return 0.0;
        }

        (mean - self.risk_free_rate) * f64::from(periods).sqrt() / std
    }

    /// Variance `wᵀ Σ w` of a probability-weighted portfolio.
    ///
    /// The covariance matrix uses Bernoulli variances on the diagonal and
    /// `ρ·sqrt(varᵢ·varⱼ)` elsewhere. Pairs missing from `correlations` are
    /// treated as uncorrelated.
    pub fn portfolio_variance(
        &self,
        positions: &[MarketPosition],
        correlations: &HashMap<OutcomePair, f64>,
    ) -> f64 {
        let n = positions.len();
        let weights: Array1<f64> = positions.iter().map(|p| p.probability).collect();
        let variances: Vec<f64> = positions.iter().map(MarketPosition::variance).collect();

        let cov = Array2::from_shape_fn((n, n), |(i, j)| {
            if i == j {
                variances[i]
            } else {
                let key = OutcomePair::new(&positions[i].outcome, &positions[j].outcome);
                let corr = correlations.get(&key).copied().unwrap_or(0.0);
                corr * (variances[i] * variances[j]).sqrt()
            }
        });

        weights.dot(&cov.dot(&weights))
    }

    /// Minimum-risk weights that sum to one and hit `target_return`.
    ///
    /// Returns an empty map when no non-negative allocation reaches the
    /// target, e.g. when it lies outside the range of position probabilities.
    #[instrument(skip(self, positions), fields(positions = positions.len()))]
    pub fn optimize_portfolio(
        &self,
        positions: &[MarketPosition],
        target_return: f64,
    ) -> BTreeMap<String, f64> {
        let _timer = LatencyTimer::new("optimize_portfolio");
        let probabilities: Vec<f64> = positions.iter().map(|p| p.probability).collect();

        match min_risk_allocation(&probabilities, target_return) {
            Some(allocation) => {
                debug!(risk = allocation.risk, "Portfolio optimized");
                positions
                    .iter()
                    .zip(allocation.weights)
                    .map(|(pos, w)| (pos.outcome.clone(), w))
                    .collect()
            }
            None => {
                warn!(target_return, "No feasible portfolio for target return");
                metrics::inc_optimizer_failures();
                BTreeMap::new()
            }
        }
    }
}

/// Solve `min sqrt(Σ wᵢ(pᵢ - w·p)²)` s.t. `Σw = 1`, `0 ≤ w ≤ 1`, `w·p = target`.
///
/// On the feasible set `w·p` is pinned to `target`, so the objective is the
/// square root of the linear cost `Σ wᵢ(pᵢ - target)²` and the problem is a
/// linear program. It is handed to HiGHS through `good_lp`; an infeasible
/// target yields `None`.
pub fn min_risk_allocation(probabilities: &[f64], target: f64) -> Option<Allocation> {
    let n = probabilities.len();
    if n == 0 || !target.is_finite() || probabilities.iter().any(|p| !p.is_finite()) {
        return None;
    }

    let cost: Vec<f64> = probabilities.iter().map(|p| (p - target).powi(2)).collect();

    let mut vars = variables!();
    let weights: Vec<Variable> = (0..n)
        .map(|_| vars.add(variable().min(0.0).max(1.0)))
        .collect();

    let objective: Expression = weights.iter().zip(&cost).map(|(w, c)| *c * *w).sum();
    let total: Expression = weights.iter().map(|w| Expression::from(*w)).sum();
    let achieved: Expression = weights
        .iter()
        .zip(probabilities)
        .map(|(w, p)| *p * *w)
        .sum();

    let solution = vars
        .minimise(objective)
        .using(highs)
        .with(constraint!(total == 1.0))
        .with(constraint!(achieved == target))
        .solve();

    match solution {
        Ok(solution) => {
            let weights: Vec<f64> = weights
                .iter()
                .map(|w| solution.value(*w).clamp(0.0, 1.0))
                .collect();
            let cost: f64 = weights.iter().zip(&cost).map(|(w, c)| w * c).sum();
            Some(Allocation {
                weights,
                risk: cost.max(0.0).sqrt(),
            })
        }
        Err(e) => {
            debug!(error = %e, target, "Solver found no allocation");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MarketBuilder;

    fn analyzer() -> MarketAnalyzer {
        MarketAnalyzer::new(0.0)
    }

    #[test]
    fn sharpe_zero_for_short_series() {
        assert_eq!(analyzer().sharpe_ratio(&[], 252), 0.0);
        assert_eq!(analyzer().sharpe_ratio(&[0.05], 252), 0.0);
    }

    #[test]
    fn sharpe_zero_for_flat_series() {
        assert_eq!(analyzer().sharpe_ratio(&[0.01, 0.01, 0.01], 252), 0.0);
    }

    #[test]
    fn sharpe_keeps_tiny_but_real_dispersion() {
        let analyzer = MarketAnalyzer::new(0.0);
        // mean 2e-17, population stdev 1e-17
        let sharpe = analyzer.sharpe_ratio(&[1e-17, 3e-17], 1);
        assert!((sharpe - 2.0).abs() < 1e-9);
    }

    #[test]
    fn sharpe_uses_population_stdev() {
        // mean 0.02, population stdev 0.01
        let sharpe = analyzer().sharpe_ratio(&[0.01, 0.03], 4);
        assert!((sharpe - 4.0).abs() < 1e-9);
    }

    #[test]
    fn sharpe_subtracts_risk_free_rate() {
        let analyzer = MarketAnalyzer::new(0.01);
        let sharpe = analyzer.sharpe_ratio(&[0.01, 0.03], 1);
        assert!((sharpe - 1.0).abs() < 1e-9);
    }

    #[test]
    fn variance_without_correlation_is_weighted_sum() {
        let positions = MarketBuilder::new().outcome("a", 0.2).outcome("b", 0.5).build();

        let variance = analyzer().portfolio_variance(&positions, &HashMap::new());

        // 0.2² · 0.16 + 0.5² · 0.25
        let expected = 0.04 * 0.16 + 0.25 * 0.25;
        assert!((variance - expected).abs() < 1e-12);
    }

    #[test]
    fn variance_adds_correlated_terms() {
        let positions = MarketBuilder::new().outcome("a", 0.2).outcome("b", 0.5).build();
        let mut correlations = HashMap::new();
        correlations.insert(OutcomePair::new("b", "a"), 0.5);

        let variance = analyzer().portfolio_variance(&positions, &correlations);

        let cross = 0.5 * (0.16f64 * 0.25).sqrt();
        let expected = 0.04 * 0.16 + 0.25 * 0.25 + 2.0 * 0.2 * 0.5 * cross;
        assert!((variance - expected).abs() < 1e-12);
    }

    #[test]
    fn variance_of_empty_portfolio_is_zero() {
        assert_eq!(analyzer().portfolio_variance(&[], &HashMap::new()), 0.0);
    }

    #[test]
    fn optimizer_picks_exact_match() {
        let positions = MarketBuilder::new()
            .outcome("a", 0.2)
            .outcome("b", 0.5)
            .outcome("c", 0.8)
            .build();

        let weights = analyzer().optimize_portfolio(&positions, 0.5);

        assert_eq!(weights.len(), 3);
        assert!((weights["b"] - 1.0).abs() < 1e-6);
        assert!(weights["a"].abs() < 1e-6);
        assert!(weights["c"].abs() < 1e-6);
    }

    #[test]
    fn optimizer_blends_nearest_bracket() {
        let positions = MarketBuilder::new()
            .outcome("a", 0.2)
            .outcome("b", 0.5)
            .outcome("c", 0.8)
            .build();

        let weights = analyzer().optimize_portfolio(&positions, 0.35);

        assert!((weights["a"] - 0.5).abs() < 1e-6);
        assert!((weights["b"] - 0.5).abs() < 1e-6);
        assert!(weights["c"].abs() < 1e-6);

        let total: f64 = weights.values().sum();
        let achieved = 0.2 * weights["a"] + 0.5 * weights["b"] + 0.8 * weights["c"];
        assert!((total - 1.0).abs() < 1e-6);
        assert!((achieved - 0.35).abs() < 1e-6);
    }

    #[test]
    fn optimizer_returns_empty_when_infeasible() {
        let positions = MarketBuilder::new().outcome("a", 0.2).outcome("b", 0.8).build();

        assert!(analyzer().optimize_portfolio(&positions, 1.5).is_empty());
        assert!(analyzer().optimize_portfolio(&positions, -0.1).is_empty());
        assert!(analyzer().optimize_portfolio(&positions, 0.9).is_empty());
        assert!(analyzer().optimize_portfolio(&[], 0.5).is_empty());
    }

    #[test]
    fn allocation_risk_is_root_cost() {
        let allocation = min_risk_allocation(&[0.2, 0.8], 0.5).unwrap();
        assert!((allocation.weights[0] - 0.5).abs() < 1e-6);
        assert!((allocation.weights[1] - 0.5).abs() < 1e-6);
        assert!((allocation.risk - 0.3).abs() < 1e-6);
    }
}
