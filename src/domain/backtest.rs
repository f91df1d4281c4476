//! Signal-to-P&L engine.
//!
//! `calculate_trading_pnl` turns a price frame and a signal frame into
//! per-asset and portfolio P&L under transaction costs and optional
//! volatility targeting. BacktestConfig defines the parameters of one run.

use crate::domain::error::TradePnlError;
use crate::domain::frame::TimeFrame;
use crate::domain::leverage::{VolTargetConfig, compute_leverage, vol_adjusted_returns};
use crate::domain::returns::{BP, calculate_returns, create_mult_index, signal_returns_with_tc};
use crate::domain::trades::individual_trade_gains;
use std::cell::OnceCell;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

pub const PORTFOLIO_COLUMN: &str = "Portfolio";

/// How per-asset P&L streams combine into the portfolio stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PortfolioCombination {
    Sum,
    #[default]
    Mean,
}

impl FromStr for PortfolioCombination {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(PortfolioCombination::Sum),
            "mean" => Ok(PortfolioCombination::Mean),
            other => Err(format!("unknown portfolio combination '{}'", other)),
        }
    }
}

impl fmt::Display for PortfolioCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortfolioCombination::Sum => write!(f, "sum"),
            PortfolioCombination::Mean => write!(f, "mean"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    /// Cost in basis points per unit of absolute position change.
    pub transaction_cost_bp: f64,
    /// Periods per year, for return statistics only.
    pub annualization_factor: f64,
    pub signal_vol: Option<VolTargetConfig>,
    pub portfolio_vol: Option<VolTargetConfig>,
    pub portfolio_combination: PortfolioCombination,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            transaction_cost_bp: 0.0,
            annualization_factor: 252.0,
            signal_vol: None,
            portfolio_vol: None,
            portfolio_combination: PortfolioCombination::Mean,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), TradePnlError> {
        if !(self.transaction_cost_bp >= 0.0 && self.transaction_cost_bp.is_finite()) {
            return Err(TradePnlError::ConfigInvalid {
                section: "backtest".into(),
                key: "transaction_cost_bp".into(),
                reason: "transaction_cost_bp must be non-negative".into(),
            });
        }
        if !(self.annualization_factor > 0.0 && self.annualization_factor.is_finite()) {
            return Err(TradePnlError::ConfigInvalid {
                section: "backtest".into(),
                key: "annualization_factor".into(),
                reason: "annualization_factor must be positive".into(),
            });
        }
        if let Some(cfg) = &self.signal_vol {
            cfg.validate("signal_vol")?;
        }
        if let Some(cfg) = &self.portfolio_vol {
            cfg.validate("portfolio_vol")?;
        }
        Ok(())
    }
}

/// Output of one backtest run.
///
/// Frames are read-only once built, so the lazily computed trade breakdown
/// always matches the signal and P&L it was derived from.
#[derive(Debug)]
pub struct BacktestResult {
    pnl: TimeFrame,
    cum_pnl: TimeFrame,
    portfolio: TimeFrame,
    cum_portfolio: TimeFrame,
    individual_leverage: Option<TimeFrame>,
    portfolio_leverage: TimeFrame,
    portfolio_signal: TimeFrame,
    signal: TimeFrame,
    pnl_trades: OnceCell<TimeFrame>,
}

impl BacktestResult {
    /// Per-asset P&L, labelled `"<asset> / <signal>"`.
    pub fn pnl(&self) -> &TimeFrame {
        &self.pnl
    }

    pub fn cum_pnl(&self) -> &TimeFrame {
        &self.cum_pnl
    }

    /// Single `Portfolio` column.
    pub fn portfolio(&self) -> &TimeFrame {
        &self.portfolio
    }

    pub fn cum_portfolio(&self) -> &TimeFrame {
        &self.cum_portfolio
    }

    /// Per-asset leverage, present when per-asset vol targeting is enabled.
    pub fn individual_leverage(&self) -> Option<&TimeFrame> {
        self.individual_leverage.as_ref()
    }

    /// Portfolio leverage; all 1.0 when portfolio vol targeting is disabled.
    pub fn portfolio_leverage(&self) -> &TimeFrame {
        &self.portfolio_leverage
    }

    /// Signals including individual and portfolio leverage: what would be traded.
    pub fn portfolio_signal(&self) -> &TimeFrame {
        &self.portfolio_signal
    }

    /// Signals including individual leverage only.
    pub fn signal(&self) -> &TimeFrame {
        &self.signal
    }

    /// Running P&L of each individual trade per asset. Computed on first call.
    pub fn pnl_trades(&self) -> Result<&TimeFrame, TradePnlError> {
        if let Some(trades) = self.pnl_trades.get() {
            return Ok(trades);
        }
        let trades = individual_trade_gains(&self.signal, &self.pnl)?;
        Ok(self.pnl_trades.get_or_init(|| trades))
    }

    pub fn asset_count(&self) -> usize {
        self.signal.width()
    }
}

pub fn calculate_trading_pnl(
    config: &BacktestConfig,
    prices: &TimeFrame,
    signal: &TimeFrame,
) -> Result<BacktestResult, TradePnlError> {
    config.validate()?;

    if prices.width() != signal.width() {
        return Err(TradePnlError::ColumnMismatch {
            prices: prices.width(),
            signals: signal.width(),
        });
    }
    if prices.width() == 0 {
        return Err(TradePnlError::FrameShape {
            reason: "no asset columns".into(),
        });
    }

    // Signal may only change on days the asset actually traded: mask before
    // filling either side.
    let signal = signal
        .reindex(prices.dates())
        .mask_missing(prices)?
        .forward_fill();
    let asset = prices.forward_fill();

    for (c, name) in asset.columns().iter().enumerate() {
        if asset.column(c).iter().all(|v| v.is_nan()) {
            warn!(asset = %name, "asset has no prices");
        }
    }

    let returns = calculate_returns(&asset);
    let tc = config.transaction_cost_bp / BP;
    let asset_count = asset.width();

    debug!(
        assets = asset_count,
        observations = asset.len(),
        tc_bp = config.transaction_cost_bp,
        combination = %config.portfolio_combination,
        "calculating trading P&L"
    );

    let pnl_cols: Vec<String> = returns
        .columns()
        .iter()
        .zip(signal.columns())
        .map(|(r, s)| format!("{} / {}", r, s))
        .collect();

    let (signal, individual_leverage) = match &config.signal_vol {
        Some(vol_cfg) => {
            let leverage = compute_leverage(&returns, vol_cfg)?;
            let leveraged = signal.zip_with(&leverage, |s, l| s * l)?;
            (leveraged, Some(leverage))
        }
        None => (signal, None),
    };

    let pnl = signal_returns_with_tc(&signal, &returns, tc)?.with_columns(pnl_cols)?;

    let portfolio = combine(&pnl, config.portfolio_combination)?;

    let (portfolio, portfolio_leverage) = match &config.portfolio_vol {
        Some(vol_cfg) => {
            debug!("applying portfolio vol target");
            vol_adjusted_returns(&portfolio, vol_cfg, config.transaction_cost_bp)?
        }
        None => {
            let ones = TimeFrame::filled(pnl.dates(), &[PORTFOLIO_COLUMN.to_string()], 1.0);
            (portfolio, ones)
        }
    };

    let scale = match config.portfolio_combination {
        PortfolioCombination::Sum => 1.0,
        PortfolioCombination::Mean => asset_count as f64,
    };
    let port_lev = portfolio_leverage.column(0);
    let portfolio_signal = signal.map_columns(|col| {
        col.iter()
            .zip(port_lev)
            .map(|(s, l)| s * l / scale)
            .collect()
    });

    let cum_pnl = create_mult_index(&pnl);
    let cum_portfolio = create_mult_index(&portfolio);

    Ok(BacktestResult {
        pnl,
        cum_pnl,
        portfolio,
        cum_portfolio,
        individual_leverage,
        portfolio_leverage,
        portfolio_signal,
        signal,
        pnl_trades: OnceCell::new(),
    })
}

/// Collapse asset P&L into a single `Portfolio` column, skipping NaN.
///
/// An all-NaN row is NaN under `Mean` and 0.0 under `Sum`.
pub fn combine(
    pnl: &TimeFrame,
    combination: PortfolioCombination,
) -> Result<TimeFrame, TradePnlError> {
    let values = (0..pnl.len())
        .map(|t| {
            let (sum, count) = pnl
                .row(t)
                .into_iter()
                .filter(|v| !v.is_nan())
                .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
            match combination {
                PortfolioCombination::Sum => sum,
                PortfolioCombination::Mean if count == 0 => f64::NAN,
                PortfolioCombination::Mean => sum / count as f64,
            }
        })
        .collect();

    TimeFrame::from_column(pnl.dates().to_vec(), PORTFOLIO_COLUMN, values)
}
