//! Trade-level P&L breakdown.
//!
//! A trade is a maximal run of observations holding the same (lagged)
//! position. Each observation inside a non-flat trade carries the running sum
//! of that trade's per-period P&L; flat or undefined observations are NaN.

use crate::domain::error::TradePnlError;
use crate::domain::frame::{TimeFrame, shift};

pub fn individual_trade_gains(
    signal: &TimeFrame,
    pnl: &TimeFrame,
) -> Result<TimeFrame, TradePnlError> {
    if signal.len() != pnl.len() || signal.width() != pnl.width() {
        return Err(TradePnlError::FrameShape {
            reason: format!(
                "signal is {}x{} but pnl is {}x{}",
                signal.len(),
                signal.width(),
                pnl.len(),
                pnl.width()
            ),
        });
    }

    let values = (0..pnl.width())
        .map(|c| trade_gains(&shift(signal.column(c), 1), pnl.column(c)))
        .collect();

    TimeFrame::new(pnl.dates().to_vec(), pnl.columns().to_vec(), values)
}

/// `held` is the position earning each row's P&L.
fn trade_gains(held: &[f64], pnl: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(pnl.len());
    let mut running = 0.0;

    for t in 0..pnl.len() {
        let pos = held[t];
        let new_trade = t == 0 || !same_position(pos, held[t - 1]);
        if new_trade {
            running = 0.0;
        }

        if pos.is_nan() || pos == 0.0 {
            out.push(f64::NAN);
            continue;
        }

        if !pnl[t].is_nan() {
            running += pnl[t];
        }
        out.push(running);
    }
    out
}

fn same_position(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}
