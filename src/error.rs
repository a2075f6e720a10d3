use thiserror::Error;

use crate::indicators::Timeframe;

/// Errors produced by the momentum engine.
///
/// Only `InvalidTimeframes`, `InvalidRequest` and `NoResults` end a
/// multi-timeframe call; the per-timeframe kinds are downgraded to warnings.
#[derive(Debug, Error)]
pub enum MomentumError {
    #[error("No valid timeframes requested for {symbol}")]
    InvalidTimeframes { symbol: String },

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Insufficient data for {symbol} {timeframe}: need {required} candles, got {actual}")]
    InsufficientData {
        symbol: String,
        timeframe: Timeframe,
        required: usize,
        actual: usize,
    },

    // anyhow::Error is not a std Error, so the chain is rendered inline
    #[error("Data source failed for {symbol} {timeframe}: {cause:#}")]
    DataSource {
        symbol: String,
        timeframe: Timeframe,
        cause: anyhow::Error,
    },

    #[error("Fetching {symbol} {timeframe} timed out after {timeout_ms}ms")]
    Timeout {
        symbol: String,
        timeframe: Timeframe,
        timeout_ms: u64,
    },

    #[error("Every timeframe failed for {symbol}: {}", .failures.join("; "))]
    NoResults {
        symbol: String,
        failures: Vec<String>,
    },
}

pub type Result<T> = std::result::Result<T, MomentumError>;
