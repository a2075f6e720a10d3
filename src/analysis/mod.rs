//! Momentum engine: single-timeframe analyzer, result cache and the
//! multi-timeframe orchestrator that ties them together.

pub mod analyzer;
pub mod cache;
pub mod orchestrator;
pub mod result;

pub use analyzer::MomentumAnalyzer;
pub use cache::{CacheStats, MomentumCache};
pub use orchestrator::{AnalysisRequest, MultiTimeframeAnalyzer, filter_timeframes};
pub use result::{
    Direction, MomentumMetadata, MomentumResult, MultiTimeframeResult, Strength,
    TimeframeAlignment, TimeframeWarning,
};
