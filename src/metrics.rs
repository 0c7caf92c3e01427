//! Metrics for analysis throughput and outcomes.
//!
//! Without an installed recorder every call here is a no-op, so library users
//! only pay for metrics when their binary opts in.

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use tracing::debug;

// === Metric Name Constants ===

/// Analysis latency metric name.
pub const METRIC_ANALYSIS_LATENCY: &str = "analysis_latency_ms";
/// Analyses run counter metric name.
pub const METRIC_ANALYSES_RUN: &str = "analyses_run_total";
/// Arbitrage opportunities detected counter metric name.
pub const METRIC_OPPORTUNITIES_DETECTED: &str = "arbitrage_opportunities_detected_total";
/// Markets skipped by the arbitrage check counter metric name.
pub const METRIC_MARKETS_SKIPPED: &str = "arbitrage_markets_skipped_total";
/// Portfolio optimizations without a feasible solution counter metric name.
pub const METRIC_OPTIMIZER_FAILURES: &str = "portfolio_optimizer_failures_total";
/// Forecast fits that fell back to AR(1) counter metric name.
pub const METRIC_FORECAST_FALLBACKS: &str = "forecast_ar1_fallbacks_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_ANALYSIS_LATENCY,
        "Time spent in one analysis call in milliseconds"
    );

    describe_counter!(METRIC_ANALYSES_RUN, "Total number of analysis calls");
    describe_counter!(
        METRIC_OPPORTUNITIES_DETECTED,
        "Total number of arbitrage opportunities detected"
    );
    describe_counter!(
        METRIC_MARKETS_SKIPPED,
        "Total number of markets with fewer than two positions"
    );
    describe_counter!(
        METRIC_OPTIMIZER_FAILURES,
        "Total number of portfolio optimizations with no feasible solution"
    );
    describe_counter!(
        METRIC_FORECAST_FALLBACKS,
        "Total number of forecast columns fitted without an MA term"
    );

    debug!("Metrics initialized");
}

/// Increment opportunities detected counter.
pub fn inc_opportunities_detected() {
    counter!(METRIC_OPPORTUNITIES_DETECTED).increment(1);
}

/// Increment skipped markets counter.
pub fn inc_markets_skipped() {
    counter!(METRIC_MARKETS_SKIPPED).increment(1);
}

/// Increment optimizer failures counter.
pub fn inc_optimizer_failures() {
    counter!(METRIC_OPTIMIZER_FAILURES).increment(1);
}

/// Increment forecast fallbacks counter.
pub fn inc_forecast_fallbacks() {
    counter!(METRIC_FORECAST_FALLBACKS).increment(1);
}

/// RAII guard for timing one analysis call.
/// Counts the call and records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    operation: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given operation.
    pub fn new(operation: &'static str) -> Self {
        counter!(METRIC_ANALYSES_RUN, "operation" => operation).increment(1);
        Self {
            start: Instant::now(),
            operation,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        let latency_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        histogram!(METRIC_ANALYSIS_LATENCY, "operation" => self.operation).record(latency_ms);
    }
}
