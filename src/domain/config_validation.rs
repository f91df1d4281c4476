//! Configuration validation.
//!
//! Reads every backtest option from a `ConfigPort` once, rejects missing or
//! malformed values, and produces a `BacktestConfig`. A vol-targeting section
//! is enabled by the presence of its `vol_target` key; once enabled, all of
//! its required keys must be present.

use crate::domain::backtest::{BacktestConfig, PortfolioCombination};
use crate::domain::error::TradePnlError;
use crate::domain::leverage::VolTargetConfig;
use crate::domain::rebalance::{RebalanceCalendar, ResampleType};
use crate::ports::config_port::ConfigPort;
use std::str::FromStr;

pub const BACKTEST_SECTION: &str = "backtest";
pub const SIGNAL_VOL_SECTION: &str = "signal_vol";
pub const PORTFOLIO_VOL_SECTION: &str = "portfolio_vol";

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, TradePnlError> {
    let defaults = BacktestConfig::default();

    let bt = BacktestConfig {
        transaction_cost_bp: optional(config, BACKTEST_SECTION, "transaction_cost_bp")?
            .unwrap_or(defaults.transaction_cost_bp),
        annualization_factor: optional(config, BACKTEST_SECTION, "annualization_factor")?
            .unwrap_or(defaults.annualization_factor),
        portfolio_combination: optional::<PortfolioCombination>(
            config,
            BACKTEST_SECTION,
            "portfolio_combination",
        )?
        .unwrap_or_default(),
        signal_vol: build_vol_config(config, SIGNAL_VOL_SECTION)?,
        portfolio_vol: build_vol_config(config, PORTFOLIO_VOL_SECTION)?,
    };

    bt.validate()?;
    Ok(bt)
}

fn build_vol_config(
    config: &dyn ConfigPort,
    section: &str,
) -> Result<Option<VolTargetConfig>, TradePnlError> {
    let Some(vol_target) = optional::<f64>(config, section, "vol_target")? else {
        return Ok(None);
    };

    let resample_freq = config
        .get_string(section, "resample_freq")
        .filter(|s| !s.trim().is_empty());
    if let Some(freq) = resample_freq {
        return Err(TradePnlError::UnsupportedResample { freq });
    }

    let vol = VolTargetConfig {
        vol_target,
        max_leverage: required(config, section, "max_leverage")?,
        periods: required(config, section, "periods")?,
        obs_in_year: required(config, section, "obs_in_year")?,
        rebalance: required::<RebalanceCalendar>(config, section, "rebalance_freq")?,
        resample_freq: None,
        resample_type: optional::<ResampleType>(config, section, "resample_type")?
            .unwrap_or_default(),
        period_shift: optional(config, section, "period_shift")?.unwrap_or(0),
    };
    vol.validate(section)?;
    Ok(Some(vol))
}

fn required<T>(config: &dyn ConfigPort, section: &str, key: &str) -> Result<T, TradePnlError>
where
    T: FromStr,
    T::Err: ToString,
{
    optional(config, section, key)?.ok_or_else(|| TradePnlError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    })
}

fn optional<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, TradePnlError>
where
    T: FromStr,
    T::Err: ToString,
{
    match config.get_string(section, key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| TradePnlError::ConfigInvalid {
                    section: section.to_string(),
                    key: key.to_string(),
                    reason: e.to_string(),
                })
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    const SIGNAL_VOL: &str = "[signal_vol]\nvol_target = 0.1\nmax_leverage = 5\nperiods = 20\nobs_in_year = 252\nrebalance_freq = BM\n";

    #[test]
    fn empty_config_uses_defaults() {
        let config = build_backtest_config(&make_config("[backtest]\n")).unwrap();
        assert_eq!(config, BacktestConfig::default());
    }

    #[test]
    fn full_backtest_section() {
        let config = build_backtest_config(&make_config(
            "[backtest]\ntransaction_cost_bp = 2.5\nannualization_factor = 52\nportfolio_combination = sum\n",
        ))
        .unwrap();
        assert_eq!(config.transaction_cost_bp, 2.5);
        assert_eq!(config.annualization_factor, 52.0);
        assert_eq!(config.portfolio_combination, PortfolioCombination::Sum);
    }

    #[test]
    fn signal_vol_section_enables_targeting() {
        let config = build_backtest_config(&make_config(SIGNAL_VOL)).unwrap();
        let vol = config.signal_vol.unwrap();
        assert_eq!(vol.vol_target, 0.1);
        assert_eq!(vol.max_leverage, 5.0);
        assert_eq!(vol.periods, 20);
        assert_eq!(vol.rebalance, RebalanceCalendar::MonthEnd);
        assert_eq!(vol.resample_type, ResampleType::Mean);
        assert_eq!(vol.period_shift, 0);
        assert!(config.portfolio_vol.is_none());
    }

    #[test]
    fn vol_target_without_periods_fails() {
        let err = build_backtest_config(&make_config(
            "[portfolio_vol]\nvol_target = 0.1\nmax_leverage = 5\nobs_in_year = 252\nrebalance_freq = BM\n",
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            TradePnlError::ConfigMissing { section, key } if section == "portfolio_vol" && key == "periods"
        ));
    }

    #[test]
    fn unknown_combination_fails() {
        let err = build_backtest_config(&make_config(
            "[backtest]\nportfolio_combination = median\n",
        ))
        .unwrap_err();
        assert!(
            matches!(err, TradePnlError::ConfigInvalid { key, .. } if key == "portfolio_combination")
        );
    }

    #[test]
    fn non_numeric_cost_fails() {
        let err =
            build_backtest_config(&make_config("[backtest]\ntransaction_cost_bp = cheap\n"))
                .unwrap_err();
        assert!(
            matches!(err, TradePnlError::ConfigInvalid { key, .. } if key == "transaction_cost_bp")
        );
    }

    #[test]
    fn negative_cost_fails() {
        let err = build_backtest_config(&make_config("[backtest]\ntransaction_cost_bp = -1\n"))
            .unwrap_err();
        assert!(
            matches!(err, TradePnlError::ConfigInvalid { key, .. } if key == "transaction_cost_bp")
        );
    }

    #[test]
    fn resample_freq_is_unsupported() {
        let content = format!("{}resample_freq = B\n", SIGNAL_VOL);
        let err = build_backtest_config(&make_config(&content)).unwrap_err();
        assert!(matches!(err, TradePnlError::UnsupportedResample { freq } if freq == "B"));
    }

    #[test]
    fn bad_rebalance_calendar_fails() {
        let content = SIGNAL_VOL.replace("BM", "sometimes");
        let err = build_backtest_config(&make_config(&content)).unwrap_err();
        assert!(
            matches!(err, TradePnlError::ConfigInvalid { key, .. } if key == "rebalance_freq")
        );
    }

    #[test]
    fn zero_max_leverage_fails() {
        let content = SIGNAL_VOL.replace("max_leverage = 5", "max_leverage = 0");
        let err = build_backtest_config(&make_config(&content)).unwrap_err();
        assert!(
            matches!(err, TradePnlError::ConfigInvalid { section, key, .. } if section == "signal_vol" && key == "max_leverage")
        );
    }

    #[test]
    fn optional_vol_keys_are_read() {
        let content = format!("{}resample_type = last\nperiod_shift = 1\n", SIGNAL_VOL);
        let vol = build_backtest_config(&make_config(&content))
            .unwrap()
            .signal_vol
            .unwrap();
        assert_eq!(vol.resample_type, ResampleType::Last);
        assert_eq!(vol.period_shift, 1);
    }
}
