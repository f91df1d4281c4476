//! Rolling volatility estimates.
//!
//! Sample standard deviation (n-1 denominator) over a trailing window of n
//! returns, annualized by sqrt(observations per year).
//! Warmup: a value exists only once the window holds n non-NaN returns.

use crate::domain::frame::TimeFrame;

pub fn rolling_stddev(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period < 2 {
        return out;
    }

    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }

        let mean: f64 = window.iter().sum::<f64>() / period as f64;
        let variance: f64 = window
            .iter()
            .map(|v| {
                let diff = v - mean;
                diff * diff
            })
            .sum::<f64>()
            / (period - 1) as f64;

        out[i] = variance.sqrt();
    }
    out
}

/// Annualized rolling volatility of every column of a return frame.
pub fn rolling_volatility(returns: &TimeFrame, periods: usize, obs_in_year: f64) -> TimeFrame {
    let scale = obs_in_year.sqrt();
    returns.map_columns(|col| {
        rolling_stddev(col, periods)
            .into_iter()
            .map(|v| v * scale)
            .collect()
    })
}
