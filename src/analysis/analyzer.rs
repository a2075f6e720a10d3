//! Single-timeframe momentum analyzer.
//!
//! Turns a candle series into a `MomentumResult` by combining three clamped
//! sub-scores (RSI ±50, MACD histogram ±30, recent price change ±20) and
//! scaling the sum by a volume amplifier in [0.8, 1.5].

use crate::analysis::result::{Direction, MomentumMetadata, MomentumResult, Strength};
use crate::config::AnalyzerConfig;
use crate::error::{MomentumError, Result};
use crate::indicators::candle::{closes, volumes};
use crate::indicators::momentum::{price_change_pct, rsi};
use crate::indicators::moving_averages::macd;
use crate::indicators::volume::volume_ratio;
use crate::indicators::{Candle, Timeframe};

const RSI_SCORE_LIMIT: f64 = 50.0;
const MACD_SCORE_LIMIT: f64 = 30.0;
const PRICE_SCORE_LIMIT: f64 = 20.0;

/// RSI points per unit inside the neutral band.
const RSI_NEUTRAL_SLOPE: f64 = 0.8;
const MACD_SCALE: f64 = 10.0;
const PRICE_SCALE: f64 = 5.0;
/// Bars covered by the recent price change sub-score.
const PRICE_CHANGE_BARS: usize = 5;

const VOLUME_MULTIPLIER_MIN: f64 = 0.8;
const VOLUME_MULTIPLIER_MAX: f64 = 1.5;
/// Multiplier gained per unit of volume ratio.
const VOLUME_MULTIPLIER_SLOPE: f64 = 0.2;

/// Stateless analyzer; holds only its configuration.
#[derive(Debug, Clone, Default)]
pub struct MomentumAnalyzer {
    config: AnalyzerConfig,
}

impl MomentumAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Analyzes a candle series (oldest first) stamped with the current time.
    pub fn analyze(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        candles: &[Candle],
    ) -> Result<MomentumResult> {
        self.analyze_at(symbol, timeframe, candles, crate::now_millis())
    }

    /// Same as `analyze` with an explicit result timestamp.
    pub fn analyze_at(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        candles: &[Candle],
        timestamp: u64,
    ) -> Result<MomentumResult> {
        let required = self.config.min_candles();
        if candles.len() < required {
            return Err(MomentumError::InsufficientData {
                symbol: symbol.to_string(),
                timeframe,
                required,
                actual: candles.len(),
            });
        }

        let closes = closes(candles);
        let volumes = volumes(candles);

        let rsi_value = rsi(&closes, self.config.rsi_period);
        let macd_reading = macd(
            &closes,
            self.config.macd_fast,
            self.config.macd_slow,
            self.config.macd_signal,
        );
        let histogram = macd_reading.map(|m| m.histogram).unwrap_or(0.0);
        let volume = volume_ratio(&volumes, self.config.volume_avg_period);
        let change_pct = price_change_pct(&closes, PRICE_CHANGE_BARS);

        let rsi_score = self.rsi_score(rsi_value);
        let macd_score = (histogram * MACD_SCALE).clamp(-MACD_SCORE_LIMIT, MACD_SCORE_LIMIT);
        let price_score = (change_pct * PRICE_SCALE).clamp(-PRICE_SCORE_LIMIT, PRICE_SCORE_LIMIT);
        let volume_multiplier = volume_multiplier(volume);

        let mut score = ((rsi_score + macd_score + price_score) * volume_multiplier).clamp(-100.0, 100.0);
        if !score.is_finite() {
            score = 0.0;
        }

        Ok(MomentumResult {
            symbol: symbol.to_string(),
            timeframe,
            timestamp,
            direction: Direction::from_score(score),
            strength: Strength::from_score(score),
            score,
            rsi: Some(rsi_value),
            macd_signal: macd_reading.map(|m| m.histogram),
            volume_ratio: Some(volume),
            metadata: MomentumMetadata {
                candles_analyzed: candles.len(),
                last_close: closes[closes.len() - 1],
                price_change_pct: change_pct,
                macd_line: macd_reading.map(|m| m.line),
                macd_signal_line: macd_reading.map(|m| m.signal),
                rsi_score,
                macd_score,
                price_score,
                volume_multiplier,
            },
        })
    }

    /// Linear and damped inside the oversold..overbought band, square-root
    /// shaped beyond it so extremes saturate toward ±50.
    fn rsi_score(&self, rsi_value: f64) -> f64 {
        let overbought = self.config.rsi_overbought;
        let oversold = self.config.rsi_oversold;

        let score = if rsi_value > overbought {
            let band_edge = (overbought - 50.0) * RSI_NEUTRAL_SLOPE;
            let excess = (rsi_value - overbought) / (100.0 - overbought).max(f64::EPSILON);
            band_edge + (RSI_SCORE_LIMIT - band_edge) * excess.sqrt()
        } else if rsi_value < oversold {
            let band_edge = (oversold - 50.0) * RSI_NEUTRAL_SLOPE;
            let excess = (oversold - rsi_value) / oversold.max(f64::EPSILON);
            band_edge - (RSI_SCORE_LIMIT + band_edge) * excess.sqrt()
        } else {
            (rsi_value - 50.0) * RSI_NEUTRAL_SLOPE
        };

        score.clamp(-RSI_SCORE_LIMIT, RSI_SCORE_LIMIT)
    }
}

/// Volume amplifier applied to the summed sub-scores.
fn volume_multiplier(volume_ratio: f64) -> f64 {
    (VOLUME_MULTIPLIER_MIN + volume_ratio * VOLUME_MULTIPLIER_SLOPE)
        .clamp(VOLUME_MULTIPLIER_MIN, VOLUME_MULTIPLIER_MAX)
}
