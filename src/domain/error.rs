//! Domain error types.

/// Top-level error type for tradepnl.
#[derive(Debug, thiserror::Error)]
pub enum TradePnlError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("volatility input resampling ({freq}) is not supported")]
    UnsupportedResample { freq: String },

    #[error("signal has {signals} columns but prices have {prices}")]
    ColumnMismatch { prices: usize, signals: usize },

    #[error("malformed frame: {reason}")]
    FrameShape { reason: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TradePnlError> for std::process::ExitCode {
    fn from(err: &TradePnlError) -> Self {
        let code: u8 = match err {
            TradePnlError::Io(_) => 1,
            TradePnlError::ConfigParse { .. }
            | TradePnlError::ConfigMissing { .. }
            | TradePnlError::ConfigInvalid { .. } => 2,
            TradePnlError::UnsupportedResample { .. } => 3,
            TradePnlError::ColumnMismatch { .. } | TradePnlError::FrameShape { .. } => 4,
            TradePnlError::Data { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
