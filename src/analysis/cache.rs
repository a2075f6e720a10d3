//! TTL + LRU cache of momentum readings keyed by `"<symbol>:<timeframe>"`.
//!
//! Expiry is checked lazily on read and in bulk by `cleanup`. Recency is kept
//! in a `BTreeMap` ordered by a monotonic access tick, so the least recently
//! used key is always the first entry.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::analysis::result::MomentumResult;
use crate::config::CacheConfig;
use crate::indicators::Timeframe;

#[derive(Debug, Clone)]
struct CacheEntry {
    data: MomentumResult,
    timestamp: u64,
    expires_at: u64,
    /// Position in `recency`
    tick: u64,
}

/// Size snapshot returned by `MomentumCache::stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_entries: usize,
}

#[derive(Debug)]
pub struct MomentumCache {
    config: CacheConfig,
    entries: HashMap<String, CacheEntry>,
    recency: BTreeMap<u64, String>,
    next_tick: u64,
}

pub fn cache_key(symbol: &str, timeframe: Timeframe) -> String {
    format!("{}:{}", symbol, timeframe)
}

impl MomentumCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            next_tick: 0,
        }
    }

    pub fn get(&mut self, symbol: &str, timeframe: Timeframe) -> Option<MomentumResult> {
        self.get_at(symbol, timeframe, crate::now_millis())
    }

    /// Returns the cached reading if it has not expired at `now_ms`.
    /// Expired entries are removed; hits become most recently used.
    pub fn get_at(
        &mut self,
        symbol: &str,
        timeframe: Timeframe,
        now_ms: u64,
    ) -> Option<MomentumResult> {
        let key = cache_key(symbol, timeframe);
        let (stored_at, expires_at) = {
            let entry = self.entries.get(&key)?;
            (entry.timestamp, entry.expires_at)
        };

        if now_ms > expires_at {
            debug!(key = %key, "cache entry expired");
            self.remove(&key);
            return None;
        }

        debug!(key = %key, age_ms = now_ms.saturating_sub(stored_at), "cache hit");
        let tick = self.bump_tick();
        let entry = self.entries.get_mut(&key)?;
        self.recency.remove(&entry.tick);
        entry.tick = tick;
        self.recency.insert(tick, key);
        Some(entry.data.clone())
    }

    pub fn set(&mut self, result: MomentumResult) {
        self.set_at(result, crate::now_millis())
    }

    /// Stores a reading with the TTL of its timeframe, evicting least recently
    /// used entries first if the cache is full.
    pub fn set_at(&mut self, result: MomentumResult, now_ms: u64) {
        let key = cache_key(&result.symbol, result.timeframe);
        // Overwriting a key must not evict some other entry
        self.remove(&key);

        while self.entries.len() >= self.config.max_entries {
            let Some((_, lru_key)) = self.recency.pop_first() else {
                break;
            };
            debug!(key = %lru_key, "evicting least recently used cache entry");
            self.entries.remove(&lru_key);
        }

        let ttl = self.config.ttl_ms(result.timeframe);
        let tick = self.bump_tick();
        self.recency.insert(tick, key.clone());
        self.entries.insert(
            key,
            CacheEntry {
                data: result,
                timestamp: now_ms,
                expires_at: now_ms.saturating_add(ttl),
                tick,
            },
        );
    }

    pub fn set_many(&mut self, results: impl IntoIterator<Item = MomentumResult>) {
        let now = crate::now_millis();
        for result in results {
            self.set_at(result, now);
        }
    }

    /// Looks up several timeframes; misses are simply absent from the map.
    pub fn get_many(
        &mut self,
        symbol: &str,
        timeframes: &[Timeframe],
    ) -> HashMap<Timeframe, MomentumResult> {
        let now = crate::now_millis();
        timeframes
            .iter()
            .filter_map(|&tf| self.get_at(symbol, tf, now).map(|r| (tf, r)))
            .collect()
    }

    /// Removes one timeframe for the symbol, or every timeframe when `None`.
    pub fn invalidate(&mut self, symbol: &str, timeframe: Option<Timeframe>) {
        match timeframe {
            Some(tf) => {
                self.remove(&cache_key(symbol, tf));
            }
            None => {
                // Symbols may themselves contain ':', so match on the stored symbol
                let keys: Vec<String> = self
                    .entries
                    .iter()
                    .filter(|(_, entry)| entry.data.symbol == symbol)
                    .map(|(key, _)| key.clone())
                    .collect();
                for key in keys {
                    self.remove(&key);
                }
            }
        }
    }

    pub fn cleanup(&mut self) -> usize {
        self.cleanup_at(crate::now_millis())
    }

    /// Purges every entry expired at `now_ms`, returning how many were removed.
    pub fn cleanup_at(&mut self, now_ms: u64) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| now_ms > entry.expires_at)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove(key);
        }
        if !expired.is_empty() {
            debug!(removed = expired.len(), "purged expired cache entries");
        }
        expired.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            max_entries: self.config.max_entries,
        }
    }

    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.recency.remove(&entry.tick);
        Some(entry)
    }

    fn bump_tick(&mut self) -> u64 {
        self.next_tick += 1;
        self.next_tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::result::{Direction, MomentumMetadata, Strength};

    fn reading(symbol: &str, timeframe: Timeframe) -> MomentumResult {
        MomentumResult {
            symbol: symbol.to_string(),
            timeframe,
            timestamp: 0,
            direction: Direction::Neutral,
            strength: Strength::Weak,
            score: 0.0,
            rsi: Some(50.0),
            macd_signal: Some(0.0),
            volume_ratio: Some(1.0),
            metadata: MomentumMetadata {
                candles_analyzed: 100,
                last_close: 1.0,
                price_change_pct: 0.0,
                macd_line: None,
                macd_signal_line: None,
                rsi_score: 0.0,
                macd_score: 0.0,
                price_score: 0.0,
                volume_multiplier: 1.0,
            },
        }
    }

    fn cache_with_capacity(max_entries: usize) -> MomentumCache {
        MomentumCache::new(CacheConfig {
            max_entries,
            ..CacheConfig::default()
        })
    }

    /// Recency list and map must always hold the same keys.
    fn assert_in_sync(cache: &MomentumCache) {
        assert_eq!(cache.entries.len(), cache.recency.len());
        for (tick, key) in &cache.recency {
            assert_eq!(cache.entries[key].tick, *tick);
        }
    }

    #[test]
    fn test_ttl_boundary_per_timeframe() {
        let config = CacheConfig::default();
        for tf in Timeframe::ALL {
            let mut cache = MomentumCache::new(config.clone());
            let ttl = config.ttl_ms(tf);
            let t = 1_000_000;
            cache.set_at(reading("BTCUSDT", tf), t);

            assert!(cache.get_at("BTCUSDT", tf, t + ttl - 1).is_some());
            assert!(cache.get_at("BTCUSDT", tf, t + ttl + 1).is_none());
            assert_eq!(cache.stats().size, 0, "expired entry is removed on read");
        }
    }

    #[test]
    fn test_lru_evicts_oldest_insert() {
        let mut cache = cache_with_capacity(3);
        cache.set_at(reading("A", Timeframe::H1), 0);
        cache.set_at(reading("B", Timeframe::H1), 0);
        cache.set_at(reading("C", Timeframe::H1), 0);
        cache.set_at(reading("D", Timeframe::H1), 0);

        assert!(cache.get_at("A", Timeframe::H1, 1).is_none());
        assert!(cache.get_at("B", Timeframe::H1, 1).is_some());
        assert!(cache.get_at("D", Timeframe::H1, 1).is_some());
        assert_in_sync(&cache);
    }

    #[test]
    fn test_lru_read_refreshes_recency() {
        let mut cache = cache_with_capacity(3);
        cache.set_at(reading("A", Timeframe::H1), 0);
        cache.set_at(reading("B", Timeframe::H1), 0);
        cache.set_at(reading("C", Timeframe::H1), 0);
        assert!(cache.get_at("A", Timeframe::H1, 1).is_some());
        cache.set_at(reading("D", Timeframe::H1), 2);

        assert!(cache.get_at("A", Timeframe::H1, 3).is_some());
        assert!(cache.get_at("B", Timeframe::H1, 3).is_none());
        assert_eq!(cache.stats().size, 3);
        assert_in_sync(&cache);
    }

    #[test]
    fn test_overwrite_does_not_evict_others() {
        let mut cache = cache_with_capacity(2);
        cache.set_at(reading("A", Timeframe::H1), 0);
        cache.set_at(reading("B", Timeframe::H1), 0);
        cache.set_at(reading("A", Timeframe::H1), 5);

        assert_eq!(cache.stats().size, 2);
        assert!(cache.get_at("B", Timeframe::H1, 6).is_some());
        assert_eq!(cache.entries[&cache_key("A", Timeframe::H1)].timestamp, 5);
        assert_in_sync(&cache);
    }

    #[test]
    fn test_invalidate_single_and_symbol() {
        let mut cache = cache_with_capacity(10);
        cache.set_at(reading("BTC", Timeframe::H1), 0);
        cache.set_at(reading("BTC", Timeframe::H4), 0);
        cache.set_at(reading("BTCUP", Timeframe::H1), 0);
        cache.set_at(reading("ETH", Timeframe::H1), 0);

        cache.invalidate("BTC", Some(Timeframe::H1));
        assert!(cache.get_at("BTC", Timeframe::H1, 1).is_none());
        assert!(cache.get_at("BTC", Timeframe::H4, 1).is_some());

        cache.invalidate("BTC", None);
        assert!(cache.get_at("BTC", Timeframe::H4, 1).is_none());
        assert!(cache.get_at("BTCUP", Timeframe::H1, 1).is_some());
        assert!(cache.get_at("ETH", Timeframe::H1, 1).is_some());
        assert_in_sync(&cache);
    }

    #[test]
    fn test_invalidate_symbol_containing_colon() {
        let mut cache = cache_with_capacity(10);
        cache.set_at(reading("BTC", Timeframe::H1), 0);
        cache.set_at(reading("BTC:PERP", Timeframe::H1), 0);
        cache.set_at(reading("BTC/USDT:USDT", Timeframe::H4), 0);

        cache.invalidate("BTC", None);
        assert!(cache.get_at("BTC", Timeframe::H1, 1).is_none());
        assert!(cache.get_at("BTC:PERP", Timeframe::H1, 1).is_some());
        assert!(cache.get_at("BTC/USDT:USDT", Timeframe::H4, 1).is_some());

        cache.invalidate("BTC:PERP", None);
        assert_eq!(cache.stats().size, 1);
        assert_in_sync(&cache);
    }

    #[test]
    fn test_cleanup_counts_expired() {
        let mut cache = cache_with_capacity(10);
        cache.set_at(reading("BTC", Timeframe::M1), 0);
        cache.set_at(reading("BTC", Timeframe::D1), 0);

        let removed = cache.cleanup_at(CacheConfig::default().ttl_ms(Timeframe::M1) + 1);
        assert_eq!(removed, 1);
        assert_eq!(cache.stats().size, 1);
        assert_in_sync(&cache);
    }

    #[test]
    fn test_batch_helpers() {
        let mut cache = cache_with_capacity(10);
        cache.set_many(vec![reading("BTC", Timeframe::M5), reading("BTC", Timeframe::H1)]);

        let hits = cache.get_many("BTC", &[Timeframe::M5, Timeframe::H1, Timeframe::D1]);
        assert_eq!(hits.len(), 2);
        assert!(hits.contains_key(&Timeframe::M5));
        assert!(!hits.contains_key(&Timeframe::D1));
        assert_eq!(hits[&Timeframe::H1].symbol, "BTC");
    }

    #[test]
    fn test_clear_and_stats() {
        let mut cache = cache_with_capacity(4);
        cache.set_at(reading("BTC", Timeframe::M5), 0);
        assert_eq!(cache.stats(), CacheStats { size: 1, max_entries: 4 });
        cache.clear();
        assert_eq!(cache.stats().size, 0);
        assert_in_sync(&cache);
    }
}
