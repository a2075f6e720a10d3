//! Multi-timeframe momentum analysis.
//!
//! Candles are pulled from a [`market::CandleSource`], scored per timeframe by
//! [`analysis::MomentumAnalyzer`], cached in [`analysis::MomentumCache`] and
//! combined into a confluence verdict by [`analysis::MultiTimeframeAnalyzer`].

pub mod analysis;
pub mod config;
pub mod error;
pub mod indicators;
pub mod logging;
pub mod market;

pub use analysis::{AnalysisRequest, MultiTimeframeAnalyzer, MultiTimeframeResult};
pub use config::MultiTimeframeConfig;
pub use error::{MomentumError, Result};

/// Current wall-clock time as Unix milliseconds.
pub(crate) fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}
