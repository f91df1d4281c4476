//! Core domain types and logic.

pub mod frame;
pub mod returns;
pub mod volatility;
pub mod rebalance;
pub mod leverage;
pub mod backtest;
pub mod trades;
pub mod metrics;
pub mod config_validation;
pub mod error;
