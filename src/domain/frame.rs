//! Date-indexed, column-oriented table of `f64` values.
//!
//! `TimeFrame` is the single series type the engine works with: prices,
//! signals, returns, leverage and P&L are all frames. Missing values are NaN.
//! Every operation returns a new frame; nothing mutates its input.

use crate::domain::error::TradePnlError;
use chrono::NaiveDate;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct TimeFrame {
    dates: Vec<NaiveDate>,
    columns: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl TimeFrame {
    /// Build a frame from column-major data.
    ///
    /// Dates must be strictly ascending and every column must have one value
    /// per date.
    pub fn new(
        dates: Vec<NaiveDate>,
        columns: Vec<String>,
        values: Vec<Vec<f64>>,
    ) -> Result<Self, TradePnlError> {
        if columns.len() != values.len() {
            return Err(TradePnlError::FrameShape {
                reason: format!(
                    "{} column names for {} columns of data",
                    columns.len(),
                    values.len()
                ),
            });
        }
        if let Some((name, col)) = columns
            .iter()
            .zip(&values)
            .find(|(_, col)| col.len() != dates.len())
        {
            return Err(TradePnlError::FrameShape {
                reason: format!(
                    "column {} has {} values for {} dates",
                    name,
                    col.len(),
                    dates.len()
                ),
            });
        }
        if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(TradePnlError::FrameShape {
                reason: format!("dates not strictly ascending at {} -> {}", w[0], w[1]),
            });
        }
        Ok(Self {
            dates,
            columns,
            values,
        })
    }

    pub fn from_column(
        dates: Vec<NaiveDate>,
        name: &str,
        values: Vec<f64>,
    ) -> Result<Self, TradePnlError> {
        Self::new(dates, vec![name.to_string()], vec![values])
    }

    /// A frame with every cell set to `value`.
    pub fn filled(dates: &[NaiveDate], columns: &[String], value: f64) -> Self {
        Self {
            dates: dates.to_vec(),
            columns: columns.to_vec(),
            values: vec![vec![value; dates.len()]; columns.len()],
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of observations (rows).
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, idx: usize) -> &[f64] {
        &self.values[idx]
    }

    pub fn column_by_name(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.values[i].as_slice())
    }

    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.values[col][row]
    }

    /// Values of one observation across all columns.
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.values.iter().map(|col| col[row]).collect()
    }

    /// Replace the column labels, keeping the data.
    pub fn with_columns(self, columns: Vec<String>) -> Result<Self, TradePnlError> {
        Self::new(self.dates, columns, self.values)
    }

    /// Apply `f` to each column independently; the result keeps dates and labels.
    pub fn map_columns<F>(&self, f: F) -> Self
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        Self {
            dates: self.dates.clone(),
            columns: self.columns.clone(),
            values: self.values.iter().map(|c| f(c.as_slice())).collect(),
        }
    }

    /// Element-wise combination of two frames of identical shape.
    ///
    /// Labels are taken from `self`; columns pair up by position.
    pub fn zip_with<F>(&self, other: &TimeFrame, f: F) -> Result<Self, TradePnlError>
    where
        F: Fn(f64, f64) -> f64,
    {
        if self.len() != other.len() || self.width() != other.width() {
            return Err(TradePnlError::FrameShape {
                reason: format!(
                    "cannot combine {}x{} frame with {}x{} frame",
                    self.len(),
                    self.width(),
                    other.len(),
                    other.width()
                ),
            });
        }
        let values = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| a.iter().zip(b).map(|(&x, &y)| f(x, y)).collect())
            .collect();
        Ok(Self {
            dates: self.dates.clone(),
            columns: self.columns.clone(),
            values,
        })
    }

    /// Left join onto `dates`: rows for dates this frame lacks are NaN, rows
    /// for dates absent from `dates` are dropped.
    pub fn reindex(&self, dates: &[NaiveDate]) -> Self {
        let lookup: HashMap<NaiveDate, usize> = self
            .dates
            .iter()
            .enumerate()
            .map(|(i, d)| (*d, i))
            .collect();
        let rows: Vec<Option<usize>> = dates.iter().map(|d| lookup.get(d).copied()).collect();
        let values = self
            .values
            .iter()
            .map(|col| {
                rows.iter()
                    .map(|r| r.map_or(f64::NAN, |i| col[i]))
                    .collect()
            })
            .collect();
        Self {
            dates: dates.to_vec(),
            columns: self.columns.clone(),
            values,
        }
    }

    /// Carry the last non-NaN value of each column forward over NaN gaps.
    pub fn forward_fill(&self) -> Self {
        self.map_columns(forward_fill)
    }

    /// Set cells to NaN wherever the same cell of `reference` is NaN.
    pub fn mask_missing(&self, reference: &TimeFrame) -> Result<Self, TradePnlError> {
        self.zip_with(reference, |v, r| if r.is_nan() { f64::NAN } else { v })
    }

    /// Move values `periods` rows later; vacated leading rows become NaN.
    pub fn shift(&self, periods: usize) -> Self {
        self.map_columns(|col| shift(col, periods))
    }
}

pub fn forward_fill(col: &[f64]) -> Vec<f64> {
    let mut last = f64::NAN;
    col.iter()
        .map(|&v| {
            if !v.is_nan() {
                last = v;
            }
            last
        })
        .collect()
}

pub fn shift(col: &[f64], periods: usize) -> Vec<f64> {
    let n = col.len();
    let lead = periods.min(n);
    let mut out = vec![f64::NAN; lead];
    out.extend_from_slice(&col[..n - lead]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn sample() -> TimeFrame {
        TimeFrame::new(
            vec![d(1), d(2), d(3)],
            vec!["A".into(), "B".into()],
            vec![vec![1.0, f64::NAN, 3.0], vec![f64::NAN, 5.0, 6.0]],
        )
        .unwrap()
    }

    #[test]
    fn new_rejects_ragged_columns() {
        let err = TimeFrame::new(vec![d(1), d(2)], vec!["A".into()], vec![vec![1.0]]).unwrap_err();
        assert!(matches!(err, TradePnlError::FrameShape { .. }));
    }

    #[test]
    fn new_rejects_unsorted_dates() {
        let err = TimeFrame::new(
            vec![d(2), d(1)],
            vec!["A".into()],
            vec![vec![1.0, 2.0]],
        )
        .unwrap_err();
        assert!(matches!(err, TradePnlError::FrameShape { .. }));
    }

    #[test]
    fn new_rejects_duplicate_dates() {
        let result = TimeFrame::new(vec![d(1), d(1)], vec!["A".into()], vec![vec![1.0, 2.0]]);
        assert!(result.is_err());
    }

    #[test]
    fn new_rejects_label_count_mismatch() {
        let result = TimeFrame::new(vec![d(1)], vec!["A".into(), "B".into()], vec![vec![1.0]]);
        assert!(result.is_err());
    }

    #[test]
    fn forward_fill_carries_last_value() {
        let filled = sample().forward_fill();
        assert_eq!(filled.column(0), &[1.0, 1.0, 3.0]);
        assert!(filled.value(0, 1).is_nan());
        assert_eq!(filled.value(1, 1), 5.0);
    }

    #[test]
    fn reindex_inserts_nan_and_drops_extra_dates() {
        let frame = sample();
        let out = frame.reindex(&[d(2), d(3), d(4)]);
        assert_eq!(out.dates(), &[d(2), d(3), d(4)]);
        assert!(out.value(0, 0).is_nan());
        assert_eq!(out.value(1, 0), 3.0);
        assert!(out.value(2, 0).is_nan());
        assert!(out.value(2, 1).is_nan());
    }

    #[test]
    fn mask_missing_follows_reference() {
        let frame = TimeFrame::filled(&[d(1), d(2), d(3)], &["A".into(), "B".into()], 1.0);
        let masked = frame.mask_missing(&sample()).unwrap();
        assert!(masked.value(1, 0).is_nan());
        assert!(masked.value(0, 1).is_nan());
        assert_eq!(masked.value(2, 1), 1.0);
    }

    #[test]
    fn shift_moves_values_down() {
        assert_eq!(shift(&[1.0, 2.0, 3.0], 1)[1..], [1.0, 2.0]);
        assert!(shift(&[1.0, 2.0], 5).iter().all(|v| v.is_nan()));
        assert_eq!(shift(&[1.0, 2.0], 0), vec![1.0, 2.0]);
    }

    #[test]
    fn zip_with_rejects_shape_mismatch() {
        let a = sample();
        let b = TimeFrame::filled(&[d(1), d(2)], &["A".into(), "B".into()], 1.0);
        assert!(a.zip_with(&b, |x, y| x * y).is_err());
    }

    #[test]
    fn column_by_name_and_row() {
        let frame = sample();
        assert_eq!(frame.column_by_name("B").unwrap()[2], 6.0);
        assert!(frame.column_by_name("C").is_none());
        assert_eq!(frame.row(2), vec![3.0, 6.0]);
    }
}
