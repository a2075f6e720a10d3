//! Momentum readings and the cross-timeframe aggregate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::indicators::Timeframe;

/// Score above which a reading is bullish (and below whose negation it is bearish).
pub const DIRECTION_THRESHOLD: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl Direction {
    /// Maps a score in [-100, 100] to a direction using the ±15 band.
    pub fn from_score(score: f64) -> Self {
        if score > DIRECTION_THRESHOLD {
            Direction::Bullish
        } else if score < -DIRECTION_THRESHOLD {
            Direction::Bearish
        } else {
            Direction::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Strong,
    Moderate,
    Weak,
}

impl Strength {
    /// Strength of a single-timeframe score.
    pub fn from_score(score: f64) -> Self {
        let magnitude = score.abs();
        if magnitude > 60.0 {
            Strength::Strong
        } else if magnitude > 30.0 {
            Strength::Moderate
        } else {
            Strength::Weak
        }
    }
}

/// Details behind a score, kept for display and debugging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumMetadata {
    pub candles_analyzed: usize,
    pub last_close: f64,
    pub price_change_pct: f64,
    pub macd_line: Option<f64>,
    pub macd_signal_line: Option<f64>,
    pub rsi_score: f64,
    pub macd_score: f64,
    pub price_score: f64,
    pub volume_multiplier: f64,
}

/// Momentum reading for one symbol on one timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumResult {
    pub symbol: String,
    pub timeframe: Timeframe,
    /// Unix ms when the reading was produced
    pub timestamp: u64,
    pub direction: Direction,
    pub strength: Strength,
    /// Composite score in [-100, 100]
    pub score: f64,
    pub rsi: Option<f64>,
    /// MACD histogram (line - signal)
    pub macd_signal: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub metadata: MomentumMetadata,
}

/// How well the per-timeframe directions agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeAlignment {
    pub aligned: bool,
    pub aligned_timeframes: Vec<Timeframe>,
    pub divergent_timeframes: Vec<Timeframe>,
    pub dominant_direction: Direction,
    /// Percentage of timeframes sharing the dominant direction
    pub alignment_score: f64,
    /// Percentage of total timeframe weight held by the dominant direction
    pub weighted_score: f64,
}

/// A timeframe that was dropped from the result and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeWarning {
    pub timeframe: Timeframe,
    pub message: String,
}

/// Combined momentum across timeframes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiTimeframeResult {
    pub symbol: String,
    pub timestamp: u64,
    pub results: BTreeMap<Timeframe, MomentumResult>,
    pub alignment: TimeframeAlignment,
    pub overall_direction: Direction,
    pub overall_strength: Strength,
    /// Agreement of signals in [0, 100]
    pub confluence_score: f64,
    pub warnings: Vec<TimeframeWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_thresholds() {
        assert_eq!(Direction::from_score(15.0), Direction::Neutral);
        assert_eq!(Direction::from_score(15.1), Direction::Bullish);
        assert_eq!(Direction::from_score(-15.0), Direction::Neutral);
        assert_eq!(Direction::from_score(-15.1), Direction::Bearish);
    }

    #[test]
    fn test_strength_thresholds() {
        assert_eq!(Strength::from_score(61.0), Strength::Strong);
        assert_eq!(Strength::from_score(-60.0), Strength::Moderate);
        assert_eq!(Strength::from_score(30.0), Strength::Weak);
        assert_eq!(Strength::from_score(-30.5), Strength::Moderate);
    }

    #[test]
    fn test_direction_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Direction::Bullish).unwrap(),
            r#""bullish""#
        );
        assert_eq!(serde_json::to_string(&Strength::Weak).unwrap(), r#""weak""#);
    }
}
