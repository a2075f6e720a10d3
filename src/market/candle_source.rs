//! Pull interface the orchestrator uses to obtain candle history.

use anyhow::Result;
use async_trait::async_trait;

use crate::indicators::{Candle, Timeframe};

// Design: the engine never talks to an exchange directly. Anything that can
// return the last `limit` candles (WebSocket API, REST, a file, a test double)
// implements this trait and plugs into MultiTimeframeAnalyzer.

#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Returns up to `limit` most recent candles, ordered oldest to newest.
    async fn get_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>>;

    fn name(&self) -> &'static str;
}
