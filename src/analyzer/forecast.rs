//! ARIMA(1,1,1) forecasting of time-indexed columns.
//!
//! Each column is differenced once and an ARMA(1,1) without constant is fitted
//! to the differences by Hannan–Rissanen regression: a long autoregression
//! (Levinson–Durbin on the sample autocovariances) supplies innovation
//! estimates, then `d_t = φ·d_{t-1} + θ·e_{t-1}` is solved by least squares.
//! Short or collinear series fall back to an AR(1) on the differences.

use std::collections::BTreeMap;

use time::Duration;
use tracing::{debug, instrument};

use super::MarketAnalyzer;
use crate::error::{AnalyticsError, Result};
use crate::market::TimeSeriesFrame;
use crate::metrics::{self, LatencyTimer};

/// Smallest series that can be differenced and still leave a lag.
pub const MIN_OBSERVATIONS: usize = 3;

/// Coefficients are kept strictly inside the unit interval.
const COEFFICIENT_BOUND: f64 = 0.99;

/// Fitted ARIMA(1,1,1) model for one series.
#[derive(Debug, Clone, PartialEq)]
pub struct ArimaFit {
    /// Autoregressive coefficient on the differenced series.
    pub phi: f64,
    /// Moving-average coefficient on the differenced series.
    pub theta: f64,
    /// Whether the MA term was dropped for lack of data.
    pub ar_only: bool,
    last_level: f64,
    last_diff: f64,
    last_innovation: f64,
}

impl ArimaFit {
    /// Fit the model to a series, oldest observation first.
    pub fn fit(series: &[f64]) -> Result<Self> {
        if series.len() < MIN_OBSERVATIONS {
            return Err(AnalyticsError::InvalidInput(format!(
                "need at least {MIN_OBSERVATIONS} observations, got {}",
                series.len()
            )));
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(AnalyticsError::InvalidInput(
                "series contains non-finite values".to_string(),
            ));
        }

        let diffs: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();
        let gamma0 = autocovariance(&diffs, 0);

        let (phi, theta, ar_only) = if gamma0 == 0.0 {
            (0.0, 0.0, false)
        } else {
            match hannan_rissanen(&diffs) {
                Some((phi, theta)) => (phi, theta, false),
                None => (ar1(&diffs), 0.0, true),
            }
        };
        let phi = phi.clamp(-COEFFICIENT_BOUND, COEFFICIENT_BOUND);
        let theta = theta.clamp(-COEFFICIENT_BOUND, COEFFICIENT_BOUND);

        let innovations = innovations(&diffs, phi, theta);

        Ok(Self {
            phi,
            theta,
            ar_only,
            last_level: series[series.len() - 1],
            last_diff: diffs[diffs.len() - 1],
            last_innovation: innovations[innovations.len() - 1],
        })
    }

    /// Project `steps` future levels.
    pub fn forecast(&self, steps: usize) -> Vec<f64> {
        let mut out = Vec::with_capacity(steps);
        let mut level = self.last_level;
        let mut diff = self.last_diff;

        for step in 0..steps {
            diff = if step == 0 {
                self.phi * diff + self.theta * self.last_innovation
            } else {
                self.phi * diff
            };
            level += diff;
            out.push(level);
        }

        out
    }
}

/// Biased sample autocovariance at `lag`, assuming a zero-mean series.
fn autocovariance(x: &[f64], lag: usize) -> f64 {
    if lag >= x.len() {
        return 0.0;
    }
    let sum: f64 = x[lag..].iter().zip(x).map(|(a, b)| a * b).sum();
    sum / x.len() as f64
}

/// AR coefficients `a₁..a_order` from autocovariances.
fn levinson_durbin(gamma: &[f64], order: usize) -> Vec<f64> {
    let mut a = vec![0.0; order + 1];
    let mut err = gamma[0];

    for k in 1..=order {
        if err <= f64::EPSILON * gamma[0] {
            break;
        }
        let mut acc = gamma[k];
        for j in 1..k {
            acc -= a[j] * gamma[k - j];
        }
        let kappa = acc / err;
        let prev = a.clone();
        a[k] = kappa;
        for j in 1..k {
            a[j] = prev[j] - kappa * prev[k - j];
        }
        err *= 1.0 - kappa * kappa;
    }

    a.split_off(1)
}

/// Two-stage ARMA(1,1) estimate, or `None` when the regression is degenerate.
fn hannan_rissanen(diffs: &[f64]) -> Option<(f64, f64)> {
    let m = diffs.len();
    let order = ((m as f64).sqrt() as usize).max(1);
    // Rows t = order+1..m regress on d_{t-1} and e_{t-1}.
    if m < order + 4 {
        return None;
    }

    let gamma: Vec<f64> = (0..=order).map(|lag| autocovariance(diffs, lag)).collect();
    let coeffs = levinson_durbin(&gamma, order);

    let mut residuals = vec![0.0; m];
    for t in order..m {
        let fitted: f64 = coeffs
            .iter()
            .enumerate()
            .map(|(j, a)| a * diffs[t - j - 1])
            .sum();
        residuals[t] = diffs[t] - fitted;
    }

    let (mut sxx, mut sxe, mut see, mut sxy, mut sey) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for t in (order + 1)..m {
        let x = diffs[t - 1];
        let e = residuals[t - 1];
        let y = diffs[t];
        sxx += x * x;
        sxe += x * e;
        see += e * e;
        sxy += x * y;
        sey += e * y;
    }

    let det = sxx * see - sxe * sxe;
    if det.abs() <= 1e-10 * (sxx * see).abs() {
        return None;
    }

    let phi = (sxy * see - sey * sxe) / det;
    let theta = (sxx * sey - sxe * sxy) / det;
    if !phi.is_finite() || !theta.is_finite() {
        return None;
    }
    Some((phi, theta))
}

/// Lag-one autoregression coefficient of a zero-mean series.
fn ar1(diffs: &[f64]) -> f64 {
    let num: f64 = diffs.windows(2).map(|w| w[1] * w[0]).sum();
    let den: f64 = diffs[..diffs.len() - 1].iter().map(|d| d * d).sum();
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Conditional innovations with `e₀ = 0`.
fn innovations(diffs: &[f64], phi: f64, theta: f64) -> Vec<f64> {
    let mut e = vec![0.0; diffs.len()];
    for t in 1..diffs.len() {
        e[t] = diffs[t] - phi * diffs[t - 1] - theta * e[t - 1];
    }
    e
}

impl MarketAnalyzer {
    /// Project every column `forecast_periods` steps ahead.
    ///
    /// Forecast rows are stamped one day apart, starting the day after the
    /// last historical timestamp.
    #[instrument(skip(self, history), fields(rows = history.len(), columns = history.columns.len()))]
    pub fn forecast_market_movement(
        &self,
        history: &TimeSeriesFrame,
        forecast_periods: usize,
    ) -> Result<TimeSeriesFrame> {
        let _timer = LatencyTimer::new("forecast_market_movement");
        history.check_shape()?;

        let last = history
            .timestamps
            .last()
            .copied()
            .ok_or_else(|| AnalyticsError::InvalidInput("history has no rows".to_string()))?;

        let timestamps = (1..=forecast_periods)
            .map(|day| {
                i64::try_from(day)
                    .ok()
                    .and_then(|day| last.checked_add(Duration::days(day)))
                    .ok_or_else(|| {
                        AnalyticsError::InvalidInput(format!(
                            "forecast day {day} after {last} is out of range"
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut columns = BTreeMap::new();
        for (name, values) in &history.columns {
            let fit = ArimaFit::fit(values).map_err(|e| match e {
                AnalyticsError::InvalidInput(reason) => {
                    AnalyticsError::InvalidInput(format!("column {name}: {reason}"))
                }
                other => other,
            })?;
            if fit.ar_only {
                debug!(column = %name, "Fitted without MA term");
                metrics::inc_forecast_fallbacks();
            }
            debug!(column = %name, phi = fit.phi, theta = fit.theta, "Column fitted");
            columns.insert(name.clone(), fit.forecast(forecast_periods));
        }

        Ok(TimeSeriesFrame {
            timestamps,
            columns,
        })
    }
}
