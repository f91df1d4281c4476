//! CSV frame adapter.
//!
//! Frames are stored wide: a `date` column (YYYY-MM-DD) followed by one
//! column per asset. Empty cells and `NaN` read as missing.

use crate::domain::error::TradePnlError;
use crate::domain::frame::TimeFrame;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use tracing::debug;

pub struct CsvAdapter;

impl CsvAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_frame(content: &str) -> Result<TimeFrame, TradePnlError> {
        let mut rdr = csv::Reader::from_reader(content.as_bytes());

        let headers = rdr.headers().map_err(|e| TradePnlError::Data {
            reason: format!("CSV header error: {}", e),
        })?;
        if headers.len() < 2 {
            return Err(TradePnlError::Data {
                reason: "expected a date column and at least one value column".into(),
            });
        }
        let columns: Vec<String> = headers.iter().skip(1).map(|h| h.trim().to_string()).collect();

        let mut rows: Vec<(NaiveDate, Vec<f64>)> = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| TradePnlError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(0).ok_or_else(|| TradePnlError::Data {
                reason: "missing date column".into(),
            })?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                TradePnlError::Data {
                    reason: format!("invalid date format '{}': {}", date_str, e),
                }
            })?;

            let values = (1..=columns.len())
                .map(|i| parse_cell(record.get(i).unwrap_or(""), &columns[i - 1], date))
                .collect::<Result<Vec<f64>, TradePnlError>>()?;
            rows.push((date, values));
        }

        rows.sort_by_key(|(d, _)| *d);

        let dates = rows.iter().map(|(d, _)| *d).collect();
        let values = (0..columns.len())
            .map(|c| rows.iter().map(|(_, v)| v[c]).collect())
            .collect();
        TimeFrame::new(dates, columns, values)
    }

    pub fn format_frame(frame: &TimeFrame) -> Result<String, TradePnlError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        let csv_err = |e: csv::Error| TradePnlError::Data {
            reason: format!("CSV write error: {}", e),
        };

        let mut header = vec!["date".to_string()];
        header.extend(frame.columns().iter().cloned());
        wtr.write_record(&header).map_err(csv_err)?;

        for (t, date) in frame.dates().iter().enumerate() {
            let mut record = vec![date.format("%Y-%m-%d").to_string()];
            record.extend(frame.row(t).into_iter().map(|v| {
                if v.is_nan() {
                    String::new()
                } else {
                    v.to_string()
                }
            }));
            wtr.write_record(&record).map_err(csv_err)?;
        }

        let bytes = wtr.into_inner().map_err(|e| TradePnlError::Data {
            reason: format!("CSV flush error: {}", e),
        })?;
        String::from_utf8(bytes).map_err(|e| TradePnlError::Data {
            reason: format!("CSV encoding error: {}", e),
        })
    }

    pub fn write_frame(frame: &TimeFrame, path: &Path) -> Result<(), TradePnlError> {
        fs::write(path, Self::format_frame(frame)?)?;
        debug!(path = %path.display(), rows = frame.len(), "wrote frame");
        Ok(())
    }
}

impl Default for CsvAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_cell(raw: &str, column: &str, date: NaiveDate) -> Result<f64, TradePnlError> {
    let cell = raw.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    cell.parse().map_err(|e| TradePnlError::Data {
        reason: format!("invalid value '{}' for {} on {}: {}", cell, column, date, e),
    })
}

impl DataPort for CsvAdapter {
    fn load_frame(&self, source: &Path) -> Result<TimeFrame, TradePnlError> {
        let content = fs::read_to_string(source).map_err(|e| TradePnlError::Data {
            reason: format!("failed to read {}: {}", source.display(), e),
        })?;
        let frame = Self::parse_frame(&content)?;
        debug!(
            path = %source.display(),
            rows = frame.len(),
            columns = frame.width(),
            "loaded frame"
        );
        Ok(frame)
    }
}
