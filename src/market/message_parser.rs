//! CandleProtocol trait for exchange-specific request/response handling.

use anyhow::Result;

use crate::indicators::{Candle, Timeframe};

// This trait is the key abstraction that makes WebSocketCandleSource exchange-agnostic.
// Each exchange formats its own kline request and parses its own response;
// WebSocketCandleSource handles connecting, fallback and response matching.

/// Trait for exchange-specific candle request formatting and parsing.
pub trait CandleProtocol: Send + Sync + 'static {
    /// Returns the primary WebSocket API endpoint URL.
    fn endpoint(&self) -> &str;

    /// Returns a fallback endpoint URL (if primary fails).
    fn fallback_endpoint(&self) -> Option<&str> {
        None
    }

    fn name(&self) -> &'static str;

    /// Builds the request frame asking for the latest `limit` candles.
    fn format_candles_request(
        &self,
        id: u64,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> String;

    /// Extracts the request id a response frame answers, `None` for
    /// unrelated frames.
    fn response_id(&self, msg: &str) -> Option<u64>;

    /// Parses a response frame into candles ordered oldest to newest.
    /// Error payloads from the exchange become `Err`.
    fn parse_candles_response(&self, msg: &str) -> Result<Vec<Candle>>;
}
