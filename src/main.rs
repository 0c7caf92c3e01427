//! Market analytics command line entry point.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use market_analytics::analyzer::DEFAULT_PERIODS;
use market_analytics::config::Config;
use market_analytics::market::input;
use market_analytics::metrics;

/// Prediction market analytics.
#[derive(Parser, Debug)]
#[command(name = "market-analytics")]
#[command(about = "Implied odds, arbitrage, Kelly sizing, portfolio risk and forecasting")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print Prometheus metrics to stderr on exit.
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check configuration validity.
    CheckConfig,

    /// Normalize decimal odds into implied probabilities.
    Implied {
        /// JSON object of outcome to decimal odds.
        #[arg(long)]
        odds: PathBuf,
    },

    /// Scan markets for two-outcome arbitrage.
    Arbitrage {
        /// JSON object of market id to positions.
        #[arg(long)]
        markets: PathBuf,
    },

    /// Efficiency, sentiment, liquidity, depth and manipulation flags.
    Summary {
        /// JSON array of positions.
        #[arg(long)]
        positions: PathBuf,

        /// Deviation from the mean probability that flags an outcome.
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Annualized Sharpe ratio of a return series.
    Sharpe {
        /// JSON array of period returns.
        #[arg(long)]
        returns: PathBuf,

        /// Periods per year.
        #[arg(long)]
        periods: Option<u32>,
    },

    /// Full-Kelly stake fraction.
    Kelly {
        /// Win probability.
        #[arg(long)]
        probability: f64,

        /// Decimal odds.
        #[arg(long)]
        odds: f64,
    },

    /// Edge-weighted Kelly score.
    ValueBet {
        /// Market-implied probability.
        #[arg(long)]
        implied: f64,

        /// Estimated true probability.
        #[arg(long)]
        true_prob: f64,

        /// Fraction of full Kelly.
        #[arg(long)]
        fraction: Option<f64>,
    },

    /// Variance of a probability-weighted portfolio.
    Variance {
        /// JSON array of positions.
        #[arg(long)]
        positions: PathBuf,

        /// JSON array of {"a", "b", "correlation"} entries.
        #[arg(long)]
        correlations: Option<PathBuf>,
    },

    /// Minimum-risk weights for a target return.
    Optimize {
        /// JSON array of positions.
        #[arg(long)]
        positions: PathBuf,

        /// Target portfolio return.
        #[arg(long)]
        target: f64,
    },

    /// ARIMA(1,1,1) forecast of every numeric column.
    Forecast {
        /// CSV with a timestamp column.
        #[arg(long)]
        series: PathBuf,

        /// Number of future rows.
        #[arg(long)]
        periods: Option<usize>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load()?;

    // Logs go to stderr so stdout stays machine readable
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::new(config.log_filter(args.verbose)))
        .init();

    let prometheus = if args.metrics {
        Some(PrometheusBuilder::new().install_recorder()?)
    } else {
        None
    };
    metrics::init_metrics();

    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    let result = run(args.command, &config);

    if let Some(handle) = prometheus {
        eprintln!("{}", handle.render());
    }

    result
}

fn run(command: Command, config: &Config) -> anyhow::Result<()> {
    let analyzer = config.analyzer();

    match command {
        Command::CheckConfig => cmd_check_config(config),
        Command::Implied { odds } => {
            let odds = input::load_odds(odds)?;
            print_json(&analyzer.implied_probabilities(&odds)?)
        }
        Command::Arbitrage { markets } => {
            let markets = input::load_markets(markets)?;
            let opportunities = analyzer.detect_arbitrage(&markets)?;
            info!(
                markets = markets.len(),
                opportunities = opportunities.len(),
                "Arbitrage scan complete"
            );
            print_json(&opportunities)
        }
        Command::Summary {
            positions,
            threshold,
        } => {
            let positions = input::load_positions(positions)?;
            let threshold = threshold.unwrap_or(config.manipulation_threshold);
            print_json(&analyzer.summarize(&positions, threshold))
        }
        Command::Sharpe { returns, periods } => {
            let returns = input::load_returns(returns)?;
            let periods = periods.unwrap_or(config.annualization_periods);
            print_json(&analyzer.sharpe_ratio(&returns, periods))
        }
        Command::Kelly { probability, odds } => {
            print_json(&analyzer.kelly_criterion(probability, odds)?)
        }
        Command::ValueBet {
            implied,
            true_prob,
            fraction,
        } => {
            let fraction = fraction.unwrap_or(config.kelly_fraction);
            print_json(&analyzer.value_bet_score(implied, true_prob, fraction)?)
        }
        Command::Variance {
            positions,
            correlations,
        } => {
            let positions = input::load_positions(positions)?;
            let correlations = match correlations {
                Some(path) => input::load_correlations(path)?,
                None => HashMap::new(),
            };
            print_json(&analyzer.portfolio_variance(&positions, &correlations))
        }
        Command::Optimize { positions, target } => {
            let positions = input::load_positions(positions)?;
            print_json(&analyzer.optimize_portfolio(&positions, target))
        }
        Command::Forecast { series, periods } => {
            let history = input::load_series(series)?;
            let periods = periods.unwrap_or(config.forecast_periods);
            let forecast = analyzer.forecast_market_movement(&history, periods)?;

            let mut writer = csv::Writer::from_writer(io::stdout());
            let mut header = vec!["timestamp".to_string()];
            header.extend(forecast.columns.keys().cloned());
            writer.write_record(&header)?;

            for (row, ts) in forecast.timestamps.iter().enumerate() {
                let mut record = vec![ts.format(&time::format_description::well_known::Rfc3339)?];
                record.extend(forecast.columns.values().map(|c| c[row].to_string()));
                writer.write_record(&record)?;
            }
            writer.flush()?;
            Ok(())
        }
    }
}

fn cmd_check_config(config: &Config) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("MARKET ANALYTICS - CONFIGURATION CHECK");
    println!("======================================================================");
    println!("  Risk-free rate: {}", config.risk_free_rate);
    println!(
        "  Annualization periods: {}{}",
        config.annualization_periods,
        if config.annualization_periods == DEFAULT_PERIODS {
            " (trading days)"
        } else {
            ""
        }
    );
    println!("  Arbitrage stake: {}", config.arbitrage_stake);
    println!("  Kelly fraction: {}", config.kelly_fraction);
    println!("  Manipulation threshold: {}", config.manipulation_threshold);
    println!("  Forecast periods: {}", config.forecast_periods);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
