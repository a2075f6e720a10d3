//! Multi-timeframe orchestration: cache lookup, bounded concurrent fetch and
//! analysis of the misses, write-back, then cross-timeframe aggregation.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::analysis::analyzer::MomentumAnalyzer;
use crate::analysis::cache::{CacheStats, MomentumCache};
use crate::analysis::result::{
    Direction, MomentumResult, MultiTimeframeResult, Strength, TimeframeAlignment,
    TimeframeWarning,
};
use crate::config::MultiTimeframeConfig;
use crate::error::{MomentumError, Result};
use crate::indicators::Timeframe;
use crate::market::CandleSource;

/// Caller-facing request: timeframes are raw tokens such as `"1h"`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisRequest {
    pub symbol: String,
    pub timeframes: Vec<String>,
    pub lookback: Option<usize>,
}

impl AnalysisRequest {
    pub fn new<I, T>(symbol: impl Into<String>, timeframes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            symbol: symbol.into(),
            timeframes: timeframes.into_iter().map(Into::into).collect(),
            lookback: None,
        }
    }

    pub fn with_lookback(mut self, lookback: usize) -> Self {
        self.lookback = Some(lookback);
        self
    }
}

/// Keeps recognized timeframe tokens in request order, dropping unknown ones
/// and duplicates.
pub fn filter_timeframes<T: AsRef<str>>(tokens: &[T]) -> Vec<Timeframe> {
    let mut seen = HashSet::new();
    tokens
        .iter()
        .filter_map(|token| token.as_ref().parse::<Timeframe>().ok())
        .filter(|tf| seen.insert(*tf))
        .collect()
}

/// Combines momentum readings from several timeframes of one symbol.
///
/// Generic over the candle source so tests can count and fail fetches.
pub struct MultiTimeframeAnalyzer<S: CandleSource> {
    source: S,
    analyzer: MomentumAnalyzer,
    cache: Mutex<MomentumCache>,
    config: MultiTimeframeConfig,
}

impl<S: CandleSource> MultiTimeframeAnalyzer<S> {
    pub fn new(source: S, config: MultiTimeframeConfig) -> Self {
        Self {
            source,
            analyzer: MomentumAnalyzer::new(config.analyzer.clone()),
            cache: Mutex::new(MomentumCache::new(config.cache.clone())),
            config,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &MultiTimeframeConfig {
        &self.config
    }

    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<MultiTimeframeResult> {
        let symbol = normalize_symbol(&request.symbol)?;
        let lookback = self.resolve_lookback(request.lookback)?;

        let timeframes = filter_timeframes(&request.timeframes);
        if timeframes.is_empty() {
            return Err(MomentumError::InvalidTimeframes {
                symbol: symbol.to_string(),
            });
        }

        let (cached, missing) = {
            let mut cache = self.lock_cache();
            let mut cached = BTreeMap::new();
            let mut missing = Vec::new();
            for tf in timeframes {
                match cache.get(symbol, tf) {
                    Some(result) => {
                        cached.insert(tf, result);
                    }
                    None => missing.push(tf),
                }
            }
            (cached, missing)
        };
        debug!(symbol, cached = cached.len(), missing = missing.len(), "cache partition");

        let outcomes: Vec<(Timeframe, Result<MomentumResult>)> = stream::iter(missing)
            .map(|tf| async move { (tf, self.fetch_and_analyze(symbol, tf, lookback).await) })
            .buffer_unordered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        let mut fresh = Vec::new();
        let mut warnings = Vec::new();
        for (tf, outcome) in outcomes {
            match outcome {
                Ok(result) => fresh.push(result),
                Err(e) => {
                    warn!(symbol, timeframe = %tf, error = %e, "timeframe analysis failed");
                    warnings.push(TimeframeWarning {
                        timeframe: tf,
                        message: e.to_string(),
                    });
                }
            }
        }
        warnings.sort_by_key(|w| w.timeframe);

        if !fresh.is_empty() {
            self.lock_cache().set_many(fresh.iter().cloned());
        }

        let mut results = cached;
        for result in fresh {
            results.insert(result.timeframe, result);
        }

        if results.is_empty() {
            return Err(MomentumError::NoResults {
                symbol: symbol.to_string(),
                failures: warnings.into_iter().map(|w| w.message).collect(),
            });
        }

        let alignment = calculate_alignment(&results, self.config.alignment_threshold);
        let aggregate = aggregate(symbol, results, alignment, warnings);
        info!(
            symbol,
            timeframes = aggregate.results.len(),
            direction = ?aggregate.overall_direction,
            confluence = aggregate.confluence_score,
            "multi-timeframe analysis complete"
        );
        Ok(aggregate)
    }

    /// Cache-first reading for a single timeframe; errors are returned as-is.
    pub async fn analyze_single(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        lookback: Option<usize>,
    ) -> Result<MomentumResult> {
        let symbol = normalize_symbol(symbol)?;
        let lookback = self.resolve_lookback(lookback)?;
        let cached = self.lock_cache().get(symbol, timeframe);
        if let Some(result) = cached {
            return Ok(result);
        }

        let result = self.fetch_and_analyze(symbol, timeframe, lookback).await?;
        self.lock_cache().set(result.clone());
        Ok(result)
    }

    pub fn get_cache_stats(&self) -> CacheStats {
        self.lock_cache().stats()
    }

    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }

    pub fn invalidate_cache(&self, symbol: &str, timeframe: Option<Timeframe>) {
        self.lock_cache().invalidate(symbol.trim(), timeframe);
    }

    /// Purges expired cache entries; callers may run this periodically.
    pub fn cleanup_cache(&self) -> usize {
        self.lock_cache().cleanup()
    }

    fn resolve_lookback(&self, lookback: Option<usize>) -> Result<usize> {
        match lookback {
            Some(0) => Err(MomentumError::InvalidRequest {
                reason: "lookback must be a positive integer".to_string(),
            }),
            Some(n) => Ok(n),
            None => Ok(self.config.default_lookback),
        }
    }

    async fn fetch_and_analyze(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        lookback: usize,
    ) -> Result<MomentumResult> {
        let fetch = self.source.get_candles(symbol, timeframe, lookback);
        let fetched = match self.config.fetch_timeout_ms {
            Some(timeout_ms) => tokio::time::timeout(Duration::from_millis(timeout_ms), fetch)
                .await
                .map_err(|_| MomentumError::Timeout {
                    symbol: symbol.to_string(),
                    timeframe,
                    timeout_ms,
                })?,
            None => fetch.await,
        };

        let candles = fetched.map_err(|cause| MomentumError::DataSource {
            symbol: symbol.to_string(),
            timeframe,
            cause,
        })?;

        self.analyzer.analyze(symbol, timeframe, &candles)
    }

    // The guard is never held across an await
    fn lock_cache(&self) -> MutexGuard<'_, MomentumCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Trims surrounding whitespace so cache keys match across entry points.
fn normalize_symbol(symbol: &str) -> Result<&str> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(MomentumError::InvalidRequest {
            reason: "symbol must not be empty".to_string(),
        });
    }
    Ok(symbol)
}

/// Measures agreement of per-timeframe directions, weighting longer timeframes more.
pub fn calculate_alignment(
    results: &BTreeMap<Timeframe, MomentumResult>,
    alignment_threshold: f64,
) -> TimeframeAlignment {
    let mut bullish = (0usize, 0.0);
    let mut bearish = (0usize, 0.0);
    let mut neutral = (0usize, 0.0);

    for (tf, result) in results {
        let bucket = match result.direction {
            Direction::Bullish => &mut bullish,
            Direction::Bearish => &mut bearish,
            Direction::Neutral => &mut neutral,
        };
        bucket.0 += 1;
        bucket.1 += tf.weight();
    }

    let dominant_direction = if bullish.1 > bearish.1 && bullish.1 > neutral.1 {
        Direction::Bullish
    } else if bearish.1 > bullish.1 && bearish.1 > neutral.1 {
        Direction::Bearish
    } else {
        Direction::Neutral
    };
    let (dominant_count, dominant_weight) = match dominant_direction {
        Direction::Bullish => bullish,
        Direction::Bearish => bearish,
        Direction::Neutral => neutral,
    };

    let total_count = results.len();
    let total_weight = bullish.1 + bearish.1 + neutral.1;
    let alignment_score = percentage(dominant_count as f64, total_count as f64);
    let weighted_score = percentage(dominant_weight, total_weight);

    let aligned_timeframes = results
        .values()
        .filter(|r| r.direction == dominant_direction)
        .map(|r| r.timeframe)
        .collect();
    let divergent_timeframes = results
        .values()
        .filter(|r| r.direction != Direction::Neutral && r.direction != dominant_direction)
        .map(|r| r.timeframe)
        .collect();

    TimeframeAlignment {
        aligned: alignment_score >= alignment_threshold * 100.0,
        aligned_timeframes,
        divergent_timeframes,
        dominant_direction,
        alignment_score,
        weighted_score,
    }
}

fn aggregate(
    symbol: &str,
    results: BTreeMap<Timeframe, MomentumResult>,
    alignment: TimeframeAlignment,
    warnings: Vec<TimeframeWarning>,
) -> MultiTimeframeResult {
    let (weighted_sum, total_weight) = results
        .iter()
        .fold((0.0, 0.0), |(sum, weight), (tf, r)| {
            (sum + r.score * tf.weight(), weight + tf.weight())
        });
    let avg_score = if total_weight > 0.0 {
        weighted_sum / total_weight
    } else {
        0.0
    };

    let overall_direction = Direction::from_score(avg_score);
    let overall_strength = if alignment.aligned && avg_score.abs() > 50.0 {
        Strength::Strong
    } else if alignment.aligned || avg_score.abs() > 30.0 {
        Strength::Moderate
    } else {
        Strength::Weak
    };

    let aligned_ratio = alignment.aligned_timeframes.len() as f64 / results.len() as f64;
    let confluence_score = (alignment.weighted_score * 0.4
        + avg_score.abs() * 0.4
        + aligned_ratio * 100.0 * 0.2)
        .min(100.0);

    MultiTimeframeResult {
        symbol: symbol.to_string(),
        timestamp: crate::now_millis(),
        results,
        alignment,
        overall_direction,
        overall_strength,
        confluence_score,
        warnings,
    }
}

fn percentage(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { part / whole * 100.0 } else { 0.0 }
}
