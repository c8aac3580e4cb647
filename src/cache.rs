//! Result cache over the query_cache table
//!
//! The cache is an optimization, never a correctness dependency: every
//! backend failure degrades to a miss on read and is swallowed on write.
//! Entries are keyed on (fingerprint, language) and served without
//! revalidation; staleness is bounded only by the TTL purge.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::CacheConfig;
use crate::database::Database;
use crate::language::Language;
use crate::models::ScoredCandidate;

/// In-process hit/miss counters for monitoring
#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

pub struct ResultCache {
    database: Arc<Database>,
    config: CacheConfig,
    stats: Arc<RwLock<CacheStats>>,
}

impl ResultCache {
    pub fn new(database: Arc<Database>, config: CacheConfig) -> Self {
        Self {
            database,
            config,
            stats: Arc::new(RwLock::new(CacheStats::default())),
        }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Look up a cached candidate list.
    ///
    /// A hit atomically bumps the row's hit count and recency. Backend
    /// errors and undecodable payloads are logged and treated as a miss.
    pub async fn check(
        &self,
        fingerprint: &str,
        language: Language,
    ) -> Option<Vec<ScoredCandidate>> {
        if !self.config.enabled {
            return None;
        }

        match self.database.cache_check(fingerprint, language).await {
            Ok(Some(payload)) => match serde_json::from_value::<Vec<ScoredCandidate>>(payload) {
                Ok(results) => {
                    self.record_hit().await;
                    debug!("Cache hit for fingerprint {}", fingerprint);
                    Some(results)
                }
                Err(e) => {
                    warn!("Cache payload for {} is undecodable: {}", fingerprint, e);
                    self.record_miss().await;
                    None
                }
            },
            Ok(None) => {
                self.record_miss().await;
                debug!("Cache miss for fingerprint {}", fingerprint);
                None
            }
            Err(e) => {
                warn!("Cache check failed, treating as miss: {}", e);
                self.record_miss().await;
                None
            }
        }
    }

    /// Store a candidate list. Errors are logged and swallowed; a lost
    /// write only costs a future miss.
    pub async fn save(
        &self,
        fingerprint: &str,
        normalized_query: &str,
        language: Language,
        results: &[ScoredCandidate],
    ) {
        if !self.config.enabled {
            return;
        }

        let payload = match serde_json::to_value(results) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize cache payload: {}", e);
                return;
            }
        };

        if let Err(e) = self
            .database
            .cache_save(fingerprint, normalized_query, language, &payload)
            .await
        {
            warn!("Cache save failed: {}", e);
        }
    }

    /// Delete entries unused for longer than the configured TTL
    pub async fn purge_stale(&self) -> u64 {
        match self.database.cache_purge_stale(self.config.ttl_seconds).await {
            Ok(purged) => {
                if purged > 0 {
                    info!("Purged {} stale cache entries", purged);
                }
                purged
            }
            Err(e) => {
                warn!("Cache purge failed: {}", e);
                0
            }
        }
    }

    /// Spawn the periodic TTL purge loop
    pub fn start_cleanup_task(self: &Arc<Self>) {
        if !self.config.enabled {
            return;
        }

        let cache = Arc::clone(self);
        let interval = std::time::Duration::from_secs(self.config.cleanup_interval_secs);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                cache.purge_stale().await;
            }
        });
    }

    pub async fn stats(&self) -> CacheStats {
        self.stats.read().await.clone()
    }

    async fn record_hit(&self) {
        self.stats.write().await.hits += 1;
    }

    async fn record_miss(&self) {
        self.stats.write().await.misses += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_empty_is_zero() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats { hits: 3, misses: 1 };
        assert!((stats.hit_rate() - 0.75).abs() < 1e-9);
    }
}
