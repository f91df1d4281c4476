//! Return statistics for finished P&L series.
//!
//! The engine never reads these values; they only summarise its output.

use super::frame::TimeFrame;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    pub name: String,
    pub annualized_return: f64,
    pub annualized_vol: f64,
    pub information_ratio: f64,
    pub max_drawdown: f64,
    pub observations: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetStats {
    pub columns: Vec<ColumnStats>,
}

impl RetStats {
    /// Statistics for every column of a periodic return frame. NaN returns
    /// are skipped.
    pub fn calculate(returns: &TimeFrame, ann_factor: f64) -> Self {
        let columns = returns
            .columns()
            .iter()
            .enumerate()
            .map(|(c, name)| column_stats(name, returns.column(c), ann_factor))
            .collect();
        RetStats { columns }
    }

    pub fn information_ratio(&self) -> Vec<f64> {
        self.columns.iter().map(|c| c.information_ratio).collect()
    }

    /// One line per column, e.g. `Portfolio Ret = 5.2% Vol = 10.1% IR = 0.51 Dr = -8.3%`.
    pub fn summary(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| {
                format!(
                    "{} Ret = {:.1}% Vol = {:.1}% IR = {:.2} Dr = {:.1}%",
                    c.name,
                    c.annualized_return * 100.0,
                    c.annualized_vol * 100.0,
                    c.information_ratio,
                    -c.max_drawdown * 100.0,
                )
            })
            .collect()
    }
}

fn column_stats(name: &str, returns: &[f64], ann_factor: f64) -> ColumnStats {
    let valid: Vec<f64> = returns.iter().copied().filter(|r| !r.is_nan()).collect();
    let n = valid.len();

    let growth: f64 = valid.iter().map(|r| 1.0 + r).product();
    let years = n as f64 / ann_factor;
    let annualized_return = if years > 0.0 && growth > 0.0 {
        growth.powf(1.0 / years) - 1.0
    } else {
        0.0
    };

    let annualized_vol = if n > 1 {
        let mean = valid.iter().sum::<f64>() / n as f64;
        let variance =
            valid.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        variance.sqrt() * ann_factor.sqrt()
    } else {
        0.0
    };

    let information_ratio = if annualized_vol > 0.0 {
        annualized_return / annualized_vol
    } else {
        0.0
    };

    ColumnStats {
        name: name.to_string(),
        annualized_return,
        annualized_vol,
        information_ratio,
        max_drawdown: compute_drawdown(&valid),
        observations: n,
    }
}

/// Largest peak-to-trough fall of the compounded index, as a positive fraction.
fn compute_drawdown(returns: &[f64]) -> f64 {
    let mut level = 1.0_f64;
    let mut peak = 1.0_f64;
    let mut max_dd = 0.0_f64;

    for r in returns {
        level *= 1.0 + r;
        if level > peak {
            peak = level;
        } else if peak > 0.0 {
            let dd = (peak - level) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}
