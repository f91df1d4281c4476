//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{BacktestConfig, calculate_trading_pnl};
use crate::domain::config_validation::build_backtest_config;
use crate::domain::error::TradePnlError;
use crate::domain::leverage::VolTargetConfig;
use crate::domain::metrics::RetStats;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "tradepnl", about = "Signal P&L backtester with volatility targeting")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest over a price and a signal table
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        prices: PathBuf,
        #[arg(short, long)]
        signal: PathBuf,
        /// Directory for the result CSV files
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a backtest configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            prices,
            signal,
            output,
        } => run_backtest(&config, &prices, &signal, output.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = TradePnlError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn load_backtest_config(path: &Path) -> Result<BacktestConfig, ExitCode> {
    let adapter = load_config(path)?;
    build_backtest_config(&adapter).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn run_backtest(
    config_path: &Path,
    prices_path: &Path,
    signal_path: &Path,
    output_dir: Option<&Path>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let bt_config = match load_backtest_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let data = CsvAdapter::new();
    let report = CsvReportAdapter::new();
    match run_backtest_pipeline(
        &data,
        &report,
        &bt_config,
        prices_path,
        signal_path,
        output_dir,
    ) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Load both tables, run the engine, print the summary and optionally write
/// the result frames.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    bt_config: &BacktestConfig,
    prices_path: &Path,
    signal_path: &Path,
    output_dir: Option<&Path>,
) -> Result<(), TradePnlError> {
    let prices = data_port.load_frame(prices_path)?;
    let signal = data_port.load_frame(signal_path)?;

    if prices.is_empty() {
        return Err(TradePnlError::Data {
            reason: format!("no price rows in {}", prices_path.display()),
        });
    }

    eprintln!(
        "Running backtest: {} assets, {} to {}",
        prices.width(),
        prices.dates()[0],
        prices.dates()[prices.len() - 1],
    );

    let result = calculate_trading_pnl(bt_config, &prices, &signal)?;

    let asset_stats = RetStats::calculate(result.pnl(), bt_config.annualization_factor);
    let portfolio_stats = RetStats::calculate(result.portfolio(), bt_config.annualization_factor);

    eprintln!("\n=== Assets ===");
    for line in asset_stats.summary() {
        eprintln!("  {line}");
    }
    let asset_irs = asset_stats.information_ratio();
    eprintln!(
        "  Average IR = {:.2}",
        asset_irs.iter().sum::<f64>() / asset_irs.len() as f64
    );
    eprintln!("\n=== Portfolio ===");
    for line in portfolio_stats.summary() {
        eprintln!("  {line}");
    }

    if let Some(dir) = output_dir {
        report_port.write(&result, dir)?;
        eprintln!("\nResults written to {}", dir.display());
    }

    Ok(())
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let bt_config = match load_backtest_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    eprintln!("\nBacktest:");
    eprintln!("  Transaction cost:   {} bp", bt_config.transaction_cost_bp);
    eprintln!("  Annualization:      {}", bt_config.annualization_factor);
    eprintln!("  Combination:        {}", bt_config.portfolio_combination);
    print_vol_section("Signal vol target", bt_config.signal_vol.as_ref());
    print_vol_section("Portfolio vol target", bt_config.portfolio_vol.as_ref());

    eprintln!("\nConfig is valid.");
    ExitCode::SUCCESS
}

fn print_vol_section(title: &str, vol: Option<&VolTargetConfig>) {
    match vol {
        None => eprintln!("{title}: disabled"),
        Some(v) => {
            eprintln!("{title}:");
            eprintln!("  Target:             {:.1}%", v.vol_target * 100.0);
            eprintln!("  Max leverage:       {}", v.max_leverage);
            eprintln!("  Window:             {} obs", v.periods);
            eprintln!("  Obs per year:       {}", v.obs_in_year);
            eprintln!("  Rebalance:          {}", v.rebalance);
            eprintln!("  Resample type:      {}", v.resample_type);
            eprintln!("  Period shift:       {}", v.period_shift);
        }
    }
}
