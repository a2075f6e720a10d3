//! Technical indicators for momentum analysis

pub mod candle;
pub mod momentum;
pub mod moving_averages;
pub mod timeframe;
pub mod volume;

pub use candle::Candle;
pub use moving_averages::Macd;
pub use timeframe::{Timeframe, UnknownTimeframe};
