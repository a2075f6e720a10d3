//! Configuration values for the analyzer, the result cache and the orchestrator.
//!
//! Every component takes its config by value at construction; there are no
//! global defaults. `MultiTimeframeConfig::from_env` layers `MOMENTUM_*`
//! environment variables on top of `Default`.

use std::collections::HashMap;
use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::indicators::Timeframe;

/// Indicator periods and thresholds for the single-timeframe analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub volume_avg_period: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            volume_avg_period: 20,
        }
    }
}

impl AnalyzerConfig {
    /// Minimum number of candles the analyzer accepts.
    pub fn min_candles(&self) -> usize {
        self.macd_slow + self.macd_signal
    }

    pub fn validate(&self) -> Result<()> {
        if self.rsi_period == 0 || self.macd_fast == 0 || self.macd_signal == 0 {
            bail!("indicator periods must be greater than zero");
        }
        if self.volume_avg_period == 0 {
            bail!("volume_avg_period must be greater than zero");
        }
        if self.macd_fast >= self.macd_slow {
            bail!(
                "macd_fast ({}) must be smaller than macd_slow ({})",
                self.macd_fast,
                self.macd_slow
            );
        }
        if !(0.0..=100.0).contains(&self.rsi_oversold)
            || !(0.0..=100.0).contains(&self.rsi_overbought)
            || self.rsi_oversold >= self.rsi_overbought
        {
            bail!(
                "rsi thresholds must satisfy 0 <= oversold ({}) < overbought ({}) <= 100",
                self.rsi_oversold,
                self.rsi_overbought
            );
        }
        Ok(())
    }
}

/// TTL and capacity settings for the result cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub default_ttl_ms: u64,
    /// Multiplier applied to `default_ttl_ms` per timeframe; missing entries use 1.0.
    pub ttl_multipliers: HashMap<Timeframe, f64>,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let ttl_multipliers = HashMap::from([
            (Timeframe::M1, 0.5),
            (Timeframe::M5, 1.0),
            (Timeframe::M15, 2.0),
            (Timeframe::M30, 3.0),
            (Timeframe::H1, 4.0),
            (Timeframe::H4, 8.0),
            (Timeframe::D1, 24.0),
        ]);

        Self {
            default_ttl_ms: 60_000,
            ttl_multipliers,
            max_entries: 1000,
        }
    }
}

impl CacheConfig {
    /// TTL for entries of the given timeframe.
    pub fn ttl_ms(&self, timeframe: Timeframe) -> u64 {
        let multiplier = self.ttl_multipliers.get(&timeframe).copied().unwrap_or(1.0);
        (self.default_ttl_ms as f64 * multiplier).round() as u64
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            bail!("cache max_entries must be greater than zero");
        }
        if let Some((tf, m)) = self
            .ttl_multipliers
            .iter()
            .find(|(_, m)| !m.is_finite() || **m < 0.0)
        {
            bail!("ttl multiplier for {} must be a non-negative number, got {}", tf, m);
        }
        Ok(())
    }
}

/// Settings for the multi-timeframe orchestrator, with its nested component configs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiTimeframeConfig {
    pub default_lookback: usize,
    pub max_concurrency: usize,
    /// Fraction (0..=1) of timeframes that must share the dominant direction.
    pub alignment_threshold: f64,
    /// No timeout when `None`; a hung fetch then blocks its slot indefinitely.
    pub fetch_timeout_ms: Option<u64>,
    pub analyzer: AnalyzerConfig,
    pub cache: CacheConfig,
}

impl Default for MultiTimeframeConfig {
    fn default() -> Self {
        Self {
            default_lookback: 100,
            max_concurrency: 6,
            alignment_threshold: 0.6,
            fetch_timeout_ms: None,
            analyzer: AnalyzerConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl MultiTimeframeConfig {
    /// Loads configuration from `MOMENTUM_*` environment variables, falling back
    /// to defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        config.default_lookback = env_or("MOMENTUM_DEFAULT_LOOKBACK", config.default_lookback)?;
        config.max_concurrency = env_or("MOMENTUM_MAX_CONCURRENCY", config.max_concurrency)?;
        config.alignment_threshold =
            env_or("MOMENTUM_ALIGNMENT_THRESHOLD", config.alignment_threshold)?;
        if let Ok(raw) = env::var("MOMENTUM_FETCH_TIMEOUT_MS") {
            config.fetch_timeout_ms = Some(
                raw.parse()
                    .with_context(|| format!("Invalid MOMENTUM_FETCH_TIMEOUT_MS: {}", raw))?,
            );
        }

        let analyzer = &mut config.analyzer;
        analyzer.rsi_period = env_or("MOMENTUM_RSI_PERIOD", analyzer.rsi_period)?;
        analyzer.rsi_overbought = env_or("MOMENTUM_RSI_OVERBOUGHT", analyzer.rsi_overbought)?;
        analyzer.rsi_oversold = env_or("MOMENTUM_RSI_OVERSOLD", analyzer.rsi_oversold)?;
        analyzer.macd_fast = env_or("MOMENTUM_MACD_FAST", analyzer.macd_fast)?;
        analyzer.macd_slow = env_or("MOMENTUM_MACD_SLOW", analyzer.macd_slow)?;
        analyzer.macd_signal = env_or("MOMENTUM_MACD_SIGNAL", analyzer.macd_signal)?;
        analyzer.volume_avg_period =
            env_or("MOMENTUM_VOLUME_AVG_PERIOD", analyzer.volume_avg_period)?;

        config.cache.default_ttl_ms = env_or("MOMENTUM_CACHE_TTL_MS", config.cache.default_ttl_ms)?;
        config.cache.max_entries = env_or("MOMENTUM_CACHE_MAX_ENTRIES", config.cache.max_entries)?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_lookback == 0 {
            bail!("default_lookback must be greater than zero");
        }
        if self.max_concurrency == 0 {
            bail!("max_concurrency must be greater than zero");
        }
        if !(0.0..=1.0).contains(&self.alignment_threshold) {
            bail!(
                "alignment_threshold must be within [0, 1], got {}",
                self.alignment_threshold
            );
        }
        self.analyzer.validate().context("analyzer config")?;
        self.cache.validate().context("cache config")?;
        Ok(())
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid {}: {}", key, raw)),
        Err(_) => Ok(default),
    }
}
