//! Return-series building blocks shared by the P&L engine and the leverage
//! calculator.

use crate::domain::error::TradePnlError;
use crate::domain::frame::TimeFrame;

/// Basis points per unit.
pub const BP: f64 = 10_000.0;

/// Simple period-over-period returns. The first observation is NaN.
pub fn calculate_returns(prices: &TimeFrame) -> TimeFrame {
    prices.map_columns(|col| {
        let mut out = Vec::with_capacity(col.len());
        out.extend(col.first().map(|_| f64::NAN));
        out.extend(col.windows(2).map(|w| w[1] / w[0] - 1.0));
        out
    })
}

/// Cost-adjusted returns of holding `positions` against `returns`.
///
/// `pnl[t] = pos[t-1] * r[t] - tc * |pos[t] - pos[t-1]|` where `tc` is the
/// per-unit cost as a fraction (not basis points). The first row is NaN and
/// NaN propagates. Columns pair up by position; labels come from `returns`.
pub fn signal_returns_with_tc(
    positions: &TimeFrame,
    returns: &TimeFrame,
    tc: f64,
) -> Result<TimeFrame, TradePnlError> {
    if positions.len() != returns.len() || positions.width() != returns.width() {
        return Err(TradePnlError::FrameShape {
            reason: format!(
                "positions are {}x{} but returns are {}x{}",
                positions.len(),
                positions.width(),
                returns.len(),
                returns.width()
            ),
        });
    }

    let values = (0..returns.width())
        .map(|c| {
            let pos = positions.column(c);
            let ret = returns.column(c);
            (0..ret.len())
                .map(|t| {
                    if t == 0 {
                        return f64::NAN;
                    }
                    let prev = pos[t - 1];
                    prev * ret[t] - tc * (pos[t] - prev).abs()
                })
                .collect()
        })
        .collect();

    TimeFrame::new(
        returns.dates().to_vec(),
        returns.columns().to_vec(),
        values,
    )
}

/// Compounded index of a return series, base 1. NaN returns do not advance
/// the index.
pub fn create_mult_index(returns: &TimeFrame) -> TimeFrame {
    returns.map_columns(|col| {
        let mut level = 1.0;
        col.iter()
            .map(|&r| {
                if !r.is_nan() {
                    level *= 1.0 + r;
                }
                level
            })
            .collect()
    })
}
