//! Candle sources: the pull boundary between the engine and exchanges.

pub mod candle_source;
pub mod message_parser;
pub mod providers;
pub mod websocket_client;

// Re-exports for convenience
pub use candle_source::CandleSource;
pub use message_parser::CandleProtocol;
pub use websocket_client::WebSocketCandleSource;

// Re-export provider convenience functions
pub use providers::binance::new_binance_source;
