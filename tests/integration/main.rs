//! Integration tests for the analytics library.
//!
//! Run with: cargo test --test integration

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use tempfile::TempDir;
use time::macros::datetime;

use market_analytics::analyzer::portfolio::min_risk_allocation;
use market_analytics::config::Config;
use market_analytics::market::{input, MarketBuilder};
use market_analytics::{AnalyticsError, MarketAnalyzer, MarketPosition};

fn analyzer() -> MarketAnalyzer {
    Config::default().analyzer()
}

/// Write a fixture file into `dir`.
fn fixture(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}

#[test]
fn implied_probabilities_sum_to_one_for_any_positive_odds() {
    let books = [
        vec![1.5, 2.8],
        vec![2.0, 3.4, 3.9],
        vec![1.01, 50.0, 120.0, 300.0],
    ];

    for odds in books {
        let map: BTreeMap<String, f64> = odds
            .iter()
            .enumerate()
            .map(|(i, o)| (format!("o{i}"), *o))
            .collect();

        let total: f64 = analyzer().implied_probabilities(&map).unwrap().values().sum();
        assert!((total - 1.0).abs() < 1e-12, "odds {odds:?} summed to {total}");
    }
}

#[test]
fn arbitrage_scan_over_several_markets() {
    let mut markets = BTreeMap::new();
    markets.insert(
        "cheap".to_string(),
        MarketBuilder::new().outcome("a", 0.3).outcome("b", 0.4).build(),
    );
    markets.insert(
        "rich".to_string(),
        MarketBuilder::new().outcome("a", 0.6).outcome("b", 0.5).build(),
    );
    markets.insert(
        "thin".to_string(),
        MarketBuilder::new().outcome("a", 0.1).build(),
    );

    let opps = analyzer().detect_arbitrage(&markets).unwrap();

    assert_eq!(opps.len(), 1);
    assert_eq!(opps[0].market_id, "cheap");
    assert_eq!(opps[0].required_stake, dec!(1000));
    assert!(opps[0].profit_percentage > 0.0);
}

#[test]
fn kelly_and_value_bet_agree() {
    let a = analyzer();
    assert!((a.kelly_criterion(0.6, 2.0).unwrap() - 0.2).abs() < 1e-12);
    assert!((a.value_bet_score(0.5, 0.6, 1.0).unwrap() - 0.1 * 0.2).abs() < 1e-12);
    assert!(matches!(
        a.kelly_criterion(0.6, 1.0),
        Err(AnalyticsError::DegenerateArithmetic { .. })
    ));
}

#[test]
fn sharpe_ratio_edge_cases() {
    assert_eq!(analyzer().sharpe_ratio(&[], 252), 0.0);
    assert_eq!(analyzer().sharpe_ratio(&[0.05], 252), 0.0);
}

#[test]
fn uncorrelated_variance_matches_hand_computation() {
    let positions = MarketBuilder::new().outcome("x", 0.3).outcome("y", 0.6).build();

    let variance = analyzer().portfolio_variance(&positions, &HashMap::new());

    // 0.09 · 0.21 + 0.36 · 0.24
    assert!((variance - (0.0189 + 0.0864)).abs() < 1e-12);
}

#[test]
fn optimizer_result_is_feasible() {
    let positions = MarketBuilder::new()
        .outcome("a", 0.15)
        .outcome("b", 0.35)
        .outcome("c", 0.55)
        .outcome("d", 0.9)
        .build();

    for target in [0.2, 0.4, 0.6, 0.8] {
        let weights = analyzer().optimize_portfolio(&positions, target);
        assert_eq!(weights.len(), 4);

        let total: f64 = weights.values().sum();
        let achieved: f64 = positions
            .iter()
            .map(|p| p.probability * weights[&p.outcome])
            .sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert!((achieved - target).abs() < 1e-6);
        assert!(weights.values().all(|w| (0.0..=1.0).contains(w)));
    }

    assert!(analyzer().optimize_portfolio(&positions, 1.2).is_empty());
    assert!(analyzer().optimize_portfolio(&positions, -0.5).is_empty());
}

#[test]
fn optimizer_beats_uniform_weights_when_uniform_is_feasible() {
    // Uniform weights give return 0.5 here
    let probabilities = [0.2, 0.4, 0.6, 0.8];
    let allocation = min_risk_allocation(&probabilities, 0.5).unwrap();

    let uniform_risk = (probabilities
        .iter()
        .map(|p| 0.25 * (p - 0.5_f64).powi(2))
        .sum::<f64>())
    .sqrt();
    assert!(allocation.risk <= uniform_risk + 1e-6);
}

#[test]
fn positions_and_markets_load_from_json() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = fixture(
        &dir,
        "markets.json",
        r#"{
            "M1": [
                {"outcome": "yes", "probability": 0.3, "liquidity": 100.0, "volume": 40.0, "timestamp": "2024-05-01T12:00:00Z"},
                {"outcome": "no", "probability": 0.4, "liquidity": 80.0, "volume": 60.0, "timestamp": "2024-05-01T12:00:00Z"}
            ]
        }"#,
    );

    let markets = input::load_markets(&path).unwrap();

    let positions: &Vec<MarketPosition> = &markets["M1"];
    assert_eq!(positions[0].timestamp, datetime!(2024-05-01 12:00 UTC));

    let summary = analyzer().summarize(positions, 0.1);
    assert!((summary.efficiency - 0.7).abs() < 1e-12);
    assert!((summary.sentiment["no"] - 0.24).abs() < 1e-12);

    let opps = analyzer().detect_arbitrage(&markets).unwrap();
    assert_eq!(opps[0].outcomes, ("yes".to_string(), "no".to_string()));
}

#[test]
fn forecast_from_csv() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = fixture(
        &dir,
        "series.csv",
        "timestamp,yes,no\n\
         2024-01-01T00:00:00Z,0.40,0.60\n\
         2024-01-02T00:00:00Z,0.42,0.58\n\
         2024-01-03T00:00:00Z,0.41,0.59\n\
         2024-01-04T00:00:00Z,0.45,0.55\n\
         2024-01-05T00:00:00Z,0.47,0.53\n\
         2024-01-06T00:00:00Z,0.46,0.54\n\
         2024-01-07T00:00:00Z,0.50,0.50\n\
         2024-01-08T00:00:00Z,0.52,0.48\n",
    );

    let history = input::load_series(&path).unwrap();

    let forecast = analyzer().forecast_market_movement(&history, 3).unwrap();

    assert_eq!(
        forecast.timestamps,
        vec![
            datetime!(2024-01-09 0:00 UTC),
            datetime!(2024-01-10 0:00 UTC),
            datetime!(2024-01-11 0:00 UTC),
        ]
    );
    assert_eq!(
        forecast.columns.keys().collect::<Vec<_>>(),
        vec!["no", "yes"]
    );
    assert!(forecast
        .columns
        .values()
        .flatten()
        .all(|v| v.is_finite()));
}
