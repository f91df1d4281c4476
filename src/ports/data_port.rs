//! Data access port trait.

use crate::domain::error::TradePnlError;
use crate::domain::frame::TimeFrame;
use std::path::Path;

pub trait DataPort {
    /// Load a date-indexed table (prices or signals) from `source`.
    fn load_frame(&self, source: &Path) -> Result<TimeFrame, TradePnlError>;
}
