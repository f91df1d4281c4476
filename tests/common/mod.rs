#![allow(dead_code)]

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use proptest::prelude::*;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tradepnl::domain::backtest::BacktestResult;
use tradepnl::domain::error::TradePnlError;
use tradepnl::domain::frame::TimeFrame;
use tradepnl::ports::data_port::DataPort;
use tradepnl::ports::report_port::ReportPort;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// `n` consecutive weekdays starting at (or after) `start`.
pub fn business_days(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(n);
    let mut d = start;
    while dates.len() < n {
        if !matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(d);
        }
        d += Duration::days(1);
    }
    dates
}

pub fn names(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

/// Frame over business days from 2024-01-01, one inner vec per column.
pub fn make_frame(columns: &[&str], values: Vec<Vec<f64>>) -> TimeFrame {
    let len = values.first().map_or(0, |v| v.len());
    TimeFrame::new(business_days(date(2024, 1, 1), len), names(columns), values).unwrap()
}

/// Constant signal with the shape of `prices`.
pub fn constant_signal(prices: &TimeFrame, value: f64) -> TimeFrame {
    TimeFrame::filled(prices.dates(), prices.columns(), value)
}

/// Compound a return path into prices starting at 100.
pub fn prices_from_returns(returns: &[f64]) -> Vec<f64> {
    let mut level = 100.0;
    let mut prices = Vec::with_capacity(returns.len() + 1);
    prices.push(level);
    for r in returns {
        level *= 1.0 + r;
        prices.push(level);
    }
    prices
}

pub fn asset_names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("A{i}")).collect()
}

/// Price frame with `n_assets` columns of `len` random-walk prices.
pub fn price_frame() -> impl Strategy<Value = TimeFrame> {
    (1usize..4, 30usize..90).prop_flat_map(|(n_assets, len)| {
        proptest::collection::vec(
            proptest::collection::vec(-0.03f64..0.03, len - 1),
            n_assets,
        )
        .prop_map(move |paths| {
            let values = paths.iter().map(|r| prices_from_returns(r)).collect();
            TimeFrame::new(
                business_days(date(2023, 1, 2), len),
                asset_names(n_assets),
                values,
            )
            .unwrap()
        })
    })
}

/// Price frame together with a signal of the same shape drawn from
/// {-1, 0, 0.5, 1}.
pub fn prices_and_signal() -> impl Strategy<Value = (TimeFrame, TimeFrame)> {
    price_frame().prop_flat_map(|prices| {
        let cells = prices.len() * prices.width();
        proptest::collection::vec(prop_oneof![Just(-1.0), Just(0.0), Just(0.5), Just(1.0)], cells)
            .prop_map(move |flat| {
                let values = flat.chunks(prices.len()).map(|c| c.to_vec()).collect();
                let signal = TimeFrame::new(
                    prices.dates().to_vec(),
                    prices.columns().to_vec(),
                    values,
                )
                .unwrap();
                (prices.clone(), signal)
            })
    })
}

pub struct MockDataPort {
    pub frames: HashMap<PathBuf, TimeFrame>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            frames: HashMap::new(),
        }
    }

    pub fn with_frame(mut self, path: &str, frame: TimeFrame) -> Self {
        self.frames.insert(PathBuf::from(path), frame);
        self
    }
}

impl DataPort for MockDataPort {
    fn load_frame(&self, source: &Path) -> Result<TimeFrame, TradePnlError> {
        self.frames
            .get(source)
            .cloned()
            .ok_or_else(|| TradePnlError::Data {
                reason: format!("no frame for {}", source.display()),
            })
    }
}

/// Records the portfolio frame and output directory of every write.
pub struct MockReportPort {
    pub calls: RefCell<Vec<(TimeFrame, PathBuf)>>,
}

impl MockReportPort {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl ReportPort for MockReportPort {
    fn write(&self, result: &BacktestResult, output_dir: &Path) -> Result<(), TradePnlError> {
        self.calls
            .borrow_mut()
            .push((result.portfolio().clone(), output_dir.to_path_buf()));
        Ok(())
    }
}

/// Price frame with roughly one cell in eight knocked out (holidays), paired
/// with a random signal.
pub fn gapped_prices_and_signal() -> impl Strategy<Value = (TimeFrame, TimeFrame)> {
    prices_and_signal().prop_flat_map(|(prices, signal)| {
        let cells = prices.len() * prices.width();
        proptest::collection::vec(proptest::bool::weighted(0.125), cells).prop_map(move |holes| {
            let len = prices.len();
            let values = (0..prices.width())
                .map(|c| {
                    prices
                        .column(c)
                        .iter()
                        .enumerate()
                        .map(|(t, &p)| if holes[c * len + t] { f64::NAN } else { p })
                        .collect()
                })
                .collect();
            let gapped =
                TimeFrame::new(prices.dates().to_vec(), prices.columns().to_vec(), values)
                    .unwrap();
            (gapped, signal.clone())
        })
    })
}
