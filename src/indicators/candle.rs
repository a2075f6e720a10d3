//! Candle (OHLCV) data structure with timestamp

use serde::{Deserialize, Serialize};

/// Represents a single candlestick with OHLCV data and timestamp.
///
/// The timestamp is stored as Unix time in milliseconds, which is the format
/// used by most cryptocurrency exchanges (Binance, Coinbase, etc.).
/// Series of candles are ordered oldest to newest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Unix timestamp in milliseconds (candle open time)
    timestamp: u64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl Candle {
    /// Creates a new Candle.
    ///
    /// `timestamp` should be Unix time in milliseconds (candle open time).
    /// Use `0` for the timestamp if not available (e.g., in tests).
    pub fn new(
        timestamp: u64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        debug_assert!(high >= low, "candle high must be >= low");

        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Returns the candle's timestamp (Unix time in milliseconds).
    pub fn get_timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn get_open(&self) -> f64 {
        self.open
    }

    pub fn get_high(&self) -> f64 {
        self.high
    }

    pub fn get_low(&self) -> f64 {
        self.low
    }

    pub fn get_close(&self) -> f64 {
        self.close
    }

    pub fn get_volume(&self) -> f64 {
        self.volume
    }
}

/// Extracts closing prices from a candle series, preserving order.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(Candle::get_close).collect()
}

/// Extracts volumes from a candle series, preserving order.
pub fn volumes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(Candle::get_volume).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candle_accessors() {
        let candle = Candle::new(1638747660000, 100.0, 110.0, 90.0, 105.0, 1000.0);
        assert_eq!(candle.get_timestamp(), 1638747660000);
        assert_eq!(candle.get_open(), 100.0);
        assert_eq!(candle.get_high(), 110.0);
        assert_eq!(candle.get_low(), 90.0);
        assert_eq!(candle.get_close(), 105.0);
        assert_eq!(candle.get_volume(), 1000.0);
    }

    #[test]
    fn test_closes_and_volumes_keep_order() {
        let candles = vec![
            Candle::new(0, 10.0, 11.0, 9.0, 10.5, 100.0),
            Candle::new(0, 10.5, 12.0, 10.0, 11.5, 200.0),
        ];
        assert_eq!(closes(&candles), vec![10.5, 11.5]);
        assert_eq!(volumes(&candles), vec![100.0, 200.0]);
    }

    #[test]
    fn test_candle_serializes_to_json() {
        let candle = Candle::new(1, 1.0, 2.0, 0.5, 1.5, 10.0);
        let json = serde_json::to_value(candle).unwrap();
        assert_eq!(json["close"], 1.5);
        assert_eq!(json["timestamp"], 1);
    }
}
