//! Volatility-targeted leverage.
//!
//! Leverage is `vol_target / rolling_vol`, capped at `max_leverage`, only
//! allowed to change on rebalance dates, and undefined (NaN) until the
//! rolling window is full.

use crate::domain::error::TradePnlError;
use crate::domain::frame::{TimeFrame, forward_fill};
use crate::domain::rebalance::{RebalanceCalendar, ResampleType, resample_to_calendar};
use crate::domain::returns::{BP, calculate_returns, create_mult_index, signal_returns_with_tc};
use crate::domain::volatility::rolling_volatility;
use tracing::debug;

/// Parameters of one volatility-targeting layer (per-asset or portfolio).
#[derive(Debug, Clone, PartialEq)]
pub struct VolTargetConfig {
    /// Target annualized volatility, e.g. 0.1 for 10%.
    pub vol_target: f64,
    pub max_leverage: f64,
    /// Rolling window length in observations.
    pub periods: usize,
    pub obs_in_year: f64,
    pub rebalance: RebalanceCalendar,
    /// Pre-resampling of the volatility input. Not supported; any value is
    /// rejected.
    pub resample_freq: Option<String>,
    pub resample_type: ResampleType,
    /// Delay applied to the volatility estimate, in observations.
    pub period_shift: usize,
}

impl VolTargetConfig {
    pub fn new(
        vol_target: f64,
        max_leverage: f64,
        periods: usize,
        obs_in_year: f64,
        rebalance: RebalanceCalendar,
    ) -> Self {
        Self {
            vol_target,
            max_leverage,
            periods,
            obs_in_year,
            rebalance,
            resample_freq: None,
            resample_type: ResampleType::default(),
            period_shift: 0,
        }
    }

    /// Check the numeric parameters. `section` names the config layer in
    /// error messages.
    pub fn validate(&self, section: &str) -> Result<(), TradePnlError> {
        let invalid = |key: &str, reason: &str| TradePnlError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.to_string(),
        };

        if !(self.vol_target > 0.0 && self.vol_target.is_finite()) {
            return Err(invalid("vol_target", "vol_target must be positive"));
        }
        if !(self.max_leverage > 0.0 && self.max_leverage.is_finite()) {
            return Err(invalid("max_leverage", "max_leverage must be positive"));
        }
        if self.periods < 1 {
            return Err(invalid("periods", "periods must be at least 1"));
        }
        if !(self.obs_in_year > 0.0 && self.obs_in_year.is_finite()) {
            return Err(invalid("obs_in_year", "obs_in_year must be positive"));
        }
        if let Some(freq) = &self.resample_freq {
            return Err(TradePnlError::UnsupportedResample { freq: freq.clone() });
        }
        Ok(())
    }
}

/// Leverage series for every column of `returns`.
///
/// Output has the same dates and labels as `returns`; each value is NaN or in
/// `[0, max_leverage]`.
pub fn compute_leverage(
    returns: &TimeFrame,
    cfg: &VolTargetConfig,
) -> Result<TimeFrame, TradePnlError> {
    if let Some(freq) = &cfg.resample_freq {
        return Err(TradePnlError::UnsupportedResample { freq: freq.clone() });
    }

    debug!(
        columns = returns.width(),
        observations = returns.len(),
        vol_target = cfg.vol_target,
        periods = cfg.periods,
        rebalance = %cfg.rebalance,
        "computing leverage"
    );

    let roll_vol = rolling_volatility(returns, cfg.periods, cfg.obs_in_year).shift(cfg.period_shift);

    // Zero volatility gives +inf, which the cap turns into max_leverage.
    // NaN volatility stays NaN.
    let raw = roll_vol.map_columns(|col| {
        col.iter()
            .map(|&vol| {
                let lev = cfg.vol_target / vol;
                if lev > cfg.max_leverage {
                    cfg.max_leverage
                } else {
                    lev
                }
            })
            .collect()
    });

    let dates = returns.dates();
    let warmup = cfg.periods.min(returns.len());
    let leverage = raw.map_columns(|col| {
        let rebalanced = resample_to_calendar(col, dates, cfg.rebalance, cfg.resample_type);
        let mut filled = forward_fill(&rebalanced);
        filled[..warmup].fill(f64::NAN);
        filled
    });

    Ok(leverage)
}

/// Scale `returns` to the volatility target.
///
/// The leverage series is treated as a position against `returns` (lagged one
/// period, with transaction costs on leverage changes). Returns the leveraged
/// returns and the leverage used.
pub fn vol_adjusted_returns(
    returns: &TimeFrame,
    cfg: &VolTargetConfig,
    transaction_cost_bp: f64,
) -> Result<(TimeFrame, TimeFrame), TradePnlError> {
    let leverage = compute_leverage(returns, cfg)?;
    let adjusted = signal_returns_with_tc(&leverage, returns, transaction_cost_bp / BP)?;
    Ok((adjusted, leverage))
}

/// Cumulative index of a price series after volatility targeting.
pub fn vol_adjusted_index_from_prices(
    prices: &TimeFrame,
    cfg: &VolTargetConfig,
    transaction_cost_bp: f64,
) -> Result<TimeFrame, TradePnlError> {
    let returns = calculate_returns(prices);
    let (adjusted, _) = vol_adjusted_returns(&returns, cfg, transaction_cost_bp)?;
    Ok(create_mult_index(&adjusted))
}
