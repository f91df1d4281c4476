//! CSV report adapter: one wide CSV file per result frame.

use crate::adapters::csv_adapter::CsvAdapter;
use crate::domain::backtest::BacktestResult;
use crate::domain::error::TradePnlError;
use crate::domain::frame::TimeFrame;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::Path;
use tracing::info;

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// File name and frame for every output of a run, in write order.
pub fn report_frames(
    result: &BacktestResult,
) -> Result<Vec<(&'static str, &TimeFrame)>, TradePnlError> {
    let mut frames = vec![
        ("pnl.csv", result.pnl()),
        ("cum_pnl.csv", result.cum_pnl()),
        ("portfolio.csv", result.portfolio()),
        ("cum_portfolio.csv", result.cum_portfolio()),
        ("portfolio_leverage.csv", result.portfolio_leverage()),
        ("portfolio_signal.csv", result.portfolio_signal()),
        ("signal.csv", result.signal()),
        ("pnl_trades.csv", result.pnl_trades()?),
    ];
    if let Some(lev) = result.individual_leverage() {
        frames.push(("individual_leverage.csv", lev));
    }
    Ok(frames)
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &BacktestResult, output_dir: &Path) -> Result<(), TradePnlError> {
        fs::create_dir_all(output_dir)?;
        let frames = report_frames(result)?;
        for (name, frame) in &frames {
            CsvAdapter::write_frame(frame, &output_dir.join(name))?;
        }
        info!(
            dir = %output_dir.display(),
            files = frames.len(),
            "report written"
        );
        Ok(())
    }
}
