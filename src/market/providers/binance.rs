//! Binance WebSocket API implementation of the kline request/response protocol.

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::indicators::{Candle, Timeframe};
use crate::market::message_parser::CandleProtocol;
use crate::market::websocket_client::WebSocketCandleSource;

pub const BINANCE_API_BASE_ENDPOINT: &str = "wss://ws-api.binance.com:443/ws-api/v3";
pub const BINANCE_API_FALLBACK_ENDPOINT: &str = "wss://ws-api.binance.com:9443/ws-api/v3";

/// Largest `limit` the klines method accepts.
pub const BINANCE_MAX_KLINES: usize = 1000;

/// Binance WebSocket API kline protocol.
#[derive(Debug, Clone)]
pub struct BinanceProtocol;

impl BinanceProtocol {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BinanceProtocol {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: u16,
    #[serde(default)]
    result: Option<Vec<Vec<Value>>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    msg: String,
}

impl CandleProtocol for BinanceProtocol {
    fn endpoint(&self) -> &str {
        BINANCE_API_BASE_ENDPOINT
    }

    fn fallback_endpoint(&self) -> Option<&str> {
        Some(BINANCE_API_FALLBACK_ENDPOINT)
    }

    fn name(&self) -> &'static str {
        "Binance"
    }

    fn format_candles_request(
        &self,
        id: u64,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> String {
        // Binance interval tokens match Timeframe::as_str
        json!({
            "id": id,
            "method": "klines",
            "params": {
                "symbol": symbol.to_uppercase(),
                "interval": timeframe.as_str(),
                "limit": limit.clamp(1, BINANCE_MAX_KLINES),
            }
        })
        .to_string()
    }

    fn response_id(&self, msg: &str) -> Option<u64> {
        let value: Value = serde_json::from_str(msg).ok()?;
        value.get("id")?.as_u64()
    }

    fn parse_candles_response(&self, msg: &str) -> Result<Vec<Candle>> {
        let response: ApiResponse =
            serde_json::from_str(msg).context("decoding Binance klines response")?;

        if let Some(error) = response.error {
            bail!(
                "Binance error {} (status {}): {}",
                error.code,
                response.status,
                error.msg
            );
        }
        if response.status != 200 {
            bail!("Binance returned status {}", response.status);
        }

        response
            .result
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                parse_kline_row(&row).ok_or_else(|| anyhow!("malformed kline row {}", i))
            })
            .collect()
    }
}

/// Row layout: [openTime, open, high, low, close, volume, closeTime, ...]
/// with prices and volume as decimal strings.
fn parse_kline_row(row: &[Value]) -> Option<Candle> {
    if row.len() < 6 {
        return None;
    }

    let timestamp = row[0].as_u64()?;
    let open = parse_number(&row[1])?;
    let high = parse_number(&row[2])?;
    let low = parse_number(&row[3])?;
    let close = parse_number(&row[4])?;
    let volume = parse_number(&row[5])?;
    if high.is_nan() || low.is_nan() || high < low {
        return None;
    }

    Some(Candle::new(timestamp, open, high, low, close, volume))
}

fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.parse().ok(),
        other => other.as_f64(),
    }
}

pub type BinanceCandleSource = WebSocketCandleSource<BinanceProtocol>;

pub fn new_binance_source() -> BinanceCandleSource {
    WebSocketCandleSource::new(BinanceProtocol::new())
}
