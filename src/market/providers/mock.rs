//! Deterministic in-process candle source for tests and offline runs.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use tracing::debug;

use crate::indicators::{Candle, Timeframe};
use crate::market::candle_source::CandleSource;

/// Open time of the first synthetic candle (2023-11-14T22:13:20Z).
const START_TIMESTAMP_MS: u64 = 1_700_000_000_000;
const BASE_PRICE: f64 = 100.0;

/// Generates a geometric price walk per timeframe with a small deterministic
/// wobble. Records how often it is called and how many calls overlap.
#[derive(Debug, Default)]
pub struct MockCandleSource {
    default_drift: f64,
    drifts: HashMap<Timeframe, f64>,
    failing: HashSet<Timeframe>,
    history_limits: HashMap<Timeframe, usize>,
    delay: Option<Duration>,
    fetch_count: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockCandleSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-bar growth rate used for timeframes without their own drift.
    pub fn with_default_drift(mut self, drift: f64) -> Self {
        self.default_drift = drift;
        self
    }

    pub fn with_drift(mut self, timeframe: Timeframe, drift: f64) -> Self {
        self.drifts.insert(timeframe, drift);
        self
    }

    /// Every fetch for this timeframe fails.
    pub fn failing_on(mut self, timeframe: Timeframe) -> Self {
        self.failing.insert(timeframe);
        self
    }

    /// Caps how many candles are returned for this timeframe.
    pub fn with_history_limit(mut self, timeframe: Timeframe, max_candles: usize) -> Self {
        self.history_limits.insert(timeframe, max_candles);
        self
    }

    /// Each fetch sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Highest number of fetches that were running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn generate(&self, timeframe: Timeframe, limit: usize) -> Vec<Candle> {
        let drift = self
            .drifts
            .get(&timeframe)
            .copied()
            .unwrap_or(self.default_drift);
        let count = self
            .history_limits
            .get(&timeframe)
            .map_or(limit, |&cap| cap.min(limit));

        let mut close = BASE_PRICE;
        (0..count)
            .map(|i| {
                let open = close;
                let wobble = 1.0 + 0.001 * (i as f64).sin();
                close = BASE_PRICE * (1.0 + drift).powi(i as i32 + 1) * wobble;
                let high = open.max(close) * 1.002;
                let low = open.min(close) * 0.998;
                let volume = 1000.0 + 100.0 * (i % 5) as f64;
                let timestamp = START_TIMESTAMP_MS + i as u64 * timeframe.to_millis();
                Candle::new(timestamp, open, high, low, close, volume)
            })
            .collect()
    }
}

/// Decrements the in-flight gauge when a fetch ends, however it ends.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CandleSource for MockCandleSource {
    async fn get_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.contains(&timeframe) {
            bail!("simulated outage for {} {}", symbol, timeframe);
        }

        debug!("[Mock] Serving {} candles for {} {}", limit, symbol, timeframe);
        Ok(self.generate(timeframe, limit))
    }

    fn name(&self) -> &'static str {
        "Mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generates_requested_history() {
        let source = MockCandleSource::new().with_default_drift(0.01);
        let candles = source.get_candles("BTCUSDT", Timeframe::H1, 50).await.unwrap();

        assert_eq!(candles.len(), 50);
        assert!(candles[49].get_close() > candles[0].get_close());
        assert_eq!(
            candles[1].get_timestamp() - candles[0].get_timestamp(),
            Timeframe::H1.to_millis()
        );
        assert_eq!(source.fetch_count(), 1);
        assert_eq!(source.peak_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_failure_and_history_limit() {
        let source = MockCandleSource::new()
            .failing_on(Timeframe::M5)
            .with_history_limit(Timeframe::H4, 10);

        assert!(source.get_candles("BTCUSDT", Timeframe::M5, 50).await.is_err());
        let candles = source.get_candles("BTCUSDT", Timeframe::H4, 50).await.unwrap();
        assert_eq!(candles.len(), 10);
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_is_deterministic() {
        let source = MockCandleSource::new().with_drift(Timeframe::D1, -0.02);
        let a = source.get_candles("X", Timeframe::D1, 40).await.unwrap();
        let b = source.get_candles("X", Timeframe::D1, 40).await.unwrap();
        assert_eq!(a, b);
    }
}
