//! Candle source implementations.

pub mod binance;
pub mod mock;

// Re-export for convenience
pub use binance::{BinanceCandleSource, BinanceProtocol, new_binance_source};
pub use mock::MockCandleSource;
