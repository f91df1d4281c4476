//! Result export port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TradePnlError;
use std::path::Path;

/// Port for persisting the frames of a finished backtest.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_dir: &Path) -> Result<(), TradePnlError>;
}
