//! Generic request/response WebSocket candle source.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, warn};

use crate::indicators::{Candle, Timeframe};
use crate::market::candle_source::CandleSource;
use crate::market::message_parser::CandleProtocol;

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

// Design: WebSocketCandleSource<P: CandleProtocol> is generic over the protocol type.
// Connection handling, fallback and response matching live here once; each
// exchange only implements CandleProtocol.
//
// Every request opens its own short-lived connection, so concurrent fetches never
// share socket state and need no locking.

/// Candle source backed by an exchange WebSocket API.
pub struct WebSocketCandleSource<P: CandleProtocol> {
    protocol: P,
    next_id: AtomicU64,
}

impl<P: CandleProtocol> WebSocketCandleSource<P> {
    pub fn new(protocol: P) -> Self {
        Self {
            protocol,
            next_id: AtomicU64::new(1),
        }
    }

    async fn connect(&self) -> Result<WsStream> {
        let endpoint = self.protocol.endpoint();
        debug!("[{}] Connecting to {}", self.protocol.name(), endpoint);

        match connect_async(endpoint).await {
            Ok((stream, _response)) => Ok(stream),
            Err(primary) => {
                let Some(fallback) = self.protocol.fallback_endpoint() else {
                    return Err(primary).with_context(|| format!("connecting to {}", endpoint));
                };
                warn!(
                    "[{}] Primary endpoint failed ({}), trying {}",
                    self.protocol.name(),
                    primary,
                    fallback
                );
                let (stream, _response) = connect_async(fallback)
                    .await
                    .with_context(|| format!("connecting to fallback {}", fallback))?;
                Ok(stream)
            }
        }
    }

    /// Sends one request frame and waits for the response carrying `id`.
    async fn request(&self, id: u64, payload: String) -> Result<String> {
        let stream = self.connect().await?;
        let (mut write, mut read) = stream.split();

        write
            .send(Message::Text(payload.into()))
            .await
            .context("sending request")?;

        while let Some(frame) = read.next().await {
            match frame.context("reading response")? {
                Message::Text(text) => {
                    if self.protocol.response_id(text.as_str()) == Some(id) {
                        // Best effort; the response is already in hand
                        let _ = write.send(Message::Close(None)).await;
                        return Ok(text.as_str().to_string());
                    }
                }
                Message::Close(frame) => {
                    bail!("connection closed before response: {:?}", frame);
                }
                // Pong handled automatically by tungstenite
                _ => {}
            }
        }

        bail!("connection ended before response to request {}", id)
    }
}

#[async_trait]
impl<P: CandleProtocol> CandleSource for WebSocketCandleSource<P> {
    async fn get_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = self
            .protocol
            .format_candles_request(id, symbol, timeframe, limit);

        let response = self
            .request(id, payload)
            .await
            .with_context(|| format!("[{}] klines {} {}", self.protocol.name(), symbol, timeframe))?;
        let candles = self.protocol.parse_candles_response(&response)?;

        debug!(
            "[{}] Received {} candles for {} {}",
            self.protocol.name(),
            candles.len(),
            symbol,
            timeframe
        );
        Ok(candles)
    }

    fn name(&self) -> &'static str {
        self.protocol.name()
    }
}
