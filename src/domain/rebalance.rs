//! Rebalance calendars for leverage updates.
//!
//! A calendar partitions observation dates into periods (week, month, ...).
//! Leverage may only take a fresh value on the last observation of a closed
//! period.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebalanceCalendar {
    /// Every observation is its own period.
    Daily,
    /// ISO week, closing on Friday.
    Weekly,
    MonthEnd,
    QuarterEnd,
    YearEnd,
}

/// How leverage values inside one rebalance period collapse to one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResampleType {
    #[default]
    Mean,
    Last,
}

impl FromStr for RebalanceCalendar {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "D" | "B" | "DAILY" => Ok(RebalanceCalendar::Daily),
            "W" | "W-FRI" | "WEEKLY" => Ok(RebalanceCalendar::Weekly),
            "M" | "BM" | "ME" | "BME" | "MONTHLY" => Ok(RebalanceCalendar::MonthEnd),
            "Q" | "BQ" | "QE" | "BQE" | "QUARTERLY" => Ok(RebalanceCalendar::QuarterEnd),
            "A" | "BA" | "Y" | "BY" | "YE" | "YEARLY" => Ok(RebalanceCalendar::YearEnd),
            other => Err(format!("unknown rebalance calendar '{}'", other)),
        }
    }
}

impl fmt::Display for RebalanceCalendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebalanceCalendar::Daily => write!(f, "D"),
            RebalanceCalendar::Weekly => write!(f, "W"),
            RebalanceCalendar::MonthEnd => write!(f, "BM"),
            RebalanceCalendar::QuarterEnd => write!(f, "BQ"),
            RebalanceCalendar::YearEnd => write!(f, "BA"),
        }
    }
}

impl FromStr for ResampleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(ResampleType::Mean),
            "last" => Ok(ResampleType::Last),
            other => Err(format!("unknown resample type '{}'", other)),
        }
    }
}

impl fmt::Display for ResampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResampleType::Mean => write!(f, "mean"),
            ResampleType::Last => write!(f, "last"),
        }
    }
}

impl RebalanceCalendar {
    /// Key identifying the period a date belongs to.
    fn period_key(&self, date: NaiveDate) -> (i32, u32) {
        match self {
            RebalanceCalendar::Daily => (date.year(), date.ordinal()),
            RebalanceCalendar::Weekly => {
                let week = date.iso_week();
                (week.year(), week.week())
            }
            RebalanceCalendar::MonthEnd => (date.year(), date.month()),
            RebalanceCalendar::QuarterEnd => (date.year(), (date.month() - 1) / 3),
            RebalanceCalendar::YearEnd => (date.year(), 0),
        }
    }

    /// Final business day (Mon-Fri) of the period containing `date`.
    pub fn period_end(&self, date: NaiveDate) -> NaiveDate {
        let calendar_end = match self {
            RebalanceCalendar::Daily => return date,
            RebalanceCalendar::Weekly => {
                let offset = 6 - date.weekday().num_days_from_monday() as i64;
                date + Duration::days(offset)
            }
            RebalanceCalendar::MonthEnd => last_day_of_month(date.year(), date.month()),
            RebalanceCalendar::QuarterEnd => {
                let quarter_last_month = ((date.month() - 1) / 3) * 3 + 3;
                last_day_of_month(date.year(), quarter_last_month)
            }
            RebalanceCalendar::YearEnd => last_day_of_month(date.year(), 12),
        };
        last_business_day_on_or_before(calendar_end)
    }

    /// Index of the last observation of every closed period, ascending.
    ///
    /// The trailing period counts as closed only once its last observation
    /// reaches the period's final business day.
    pub fn period_end_indices(&self, dates: &[NaiveDate]) -> Vec<usize> {
        let mut indices = Vec::new();
        for i in 0..dates.len() {
            match dates.get(i + 1) {
                Some(next) => {
                    if self.period_key(*next) != self.period_key(dates[i]) {
                        indices.push(i);
                    }
                }
                None => {
                    if dates[i] >= self.period_end(dates[i]) {
                        indices.push(i);
                    }
                }
            }
        }
        indices
    }
}

impl ResampleType {
    /// Collapse one period's values, ignoring NaN. An all-NaN period yields NaN.
    pub fn aggregate(&self, values: &[f64]) -> f64 {
        match self {
            ResampleType::Mean => {
                let (sum, count) = values
                    .iter()
                    .filter(|v| !v.is_nan())
                    .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
                if count == 0 {
                    f64::NAN
                } else {
                    sum / count as f64
                }
            }
            ResampleType::Last => values
                .iter()
                .rev()
                .copied()
                .find(|v| !v.is_nan())
                .unwrap_or(f64::NAN),
        }
    }
}

/// Resample `values` onto the calendar: each closed period's aggregate lands
/// on the period's last observation, every other observation is NaN.
pub fn resample_to_calendar(
    values: &[f64],
    dates: &[NaiveDate],
    calendar: RebalanceCalendar,
    resample_type: ResampleType,
) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    let mut start = 0;
    for end in calendar.period_end_indices(dates) {
        out[end] = resample_type.aggregate(&values[start..=end]);
        start = end + 1;
    }
    out
}

fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

fn last_business_day_on_or_before(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date - Duration::days(2),
        _ => date,
    }
}
