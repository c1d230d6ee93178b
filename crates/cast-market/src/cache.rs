//! Pipeline step cache
//!
//! Intermediate pipeline results (price history, news, social data,
//! generated predictions) are cached under an explicit key of
//! (symbol, step, as-of date) with a TTL, and the cache is injected into
//! whatever runs the pipeline rather than living as ambient state.

use cached::{Cached, TimedCache};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// The pipeline step a cached value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    /// Historical price data
    History,
    /// Company news articles
    News,
    /// Social posts and sentiment
    Social,
    /// Generated prediction text
    Prediction,
}

/// Cache key for pipeline step data
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepKey {
    /// Stock symbol
    pub symbol: String,
    /// Pipeline step the value belongs to
    pub step: PipelineStep,
    /// As-of date the step was computed for
    pub as_of: NaiveDate,
}

impl StepKey {
    /// Create a new step cache key
    pub fn new(symbol: impl Into<String>, step: PipelineStep, as_of: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            step,
            as_of,
        }
    }
}

/// Thread-safe TTL cache for pipeline step data
pub struct StepCache {
    cache: Arc<RwLock<TimedCache<StepKey, serde_json::Value>>>,
}

impl StepCache {
    /// Create a new cache with the specified TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    /// Get a value from the cache
    pub async fn get(&self, key: &StepKey) -> Option<serde_json::Value> {
        let mut cache = self.cache.write().await;
        cache.cache_get(key).cloned()
    }

    /// Insert a value into the cache
    pub async fn insert(&self, key: StepKey, value: serde_json::Value) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key, value);
    }

    /// Get or fetch a value using the provided fetcher function
    ///
    /// If the value exists in cache, it's returned immediately.
    /// Otherwise, the fetcher function is called and the result is cached.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        key: StepKey,
        fetcher: F,
    ) -> std::result::Result<serde_json::Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<serde_json::Value, E>>,
    {
        // Try to get from cache first
        if let Some(value) = self.get(&key).await {
            tracing::debug!("Cache hit for key: {:?}", key);
            return Ok(value);
        }

        tracing::debug!("Cache miss for key: {:?}", key);

        // Fetch the value
        let value = fetcher().await?;

        // Store in cache
        self.insert(key, value.clone()).await;

        Ok(value)
    }

    /// Invalidate a specific cache entry
    pub async fn invalidate(&self, key: &StepKey) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_remove(key);
    }

    /// Clear all cached entries
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.cache_clear();
    }

    /// Get the number of cached entries
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Clone for StepCache {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_step_key_creation() {
        let key = StepKey::new("AAPL", PipelineStep::History, day("2025-06-02"));
        assert_eq!(key.symbol, "AAPL");
        assert_eq!(key.step, PipelineStep::History);
    }

    #[tokio::test]
    async fn test_cache_insert_and_get() {
        let cache = StepCache::new(Duration::from_secs(60));
        let key = StepKey::new("AAPL", PipelineStep::History, day("2025-06-02"));
        let value = serde_json::json!({"prices": [150.0]});

        cache.insert(key.clone(), value.clone()).await;

        let retrieved = cache.get(&key).await;
        assert_eq!(retrieved, Some(value));
    }

    #[tokio::test]
    async fn test_same_symbol_different_step_is_distinct() {
        let cache = StepCache::new(Duration::from_secs(60));
        let as_of = day("2025-06-02");
        let history_key = StepKey::new("AAPL", PipelineStep::History, as_of);
        let news_key = StepKey::new("AAPL", PipelineStep::News, as_of);

        cache
            .insert(history_key.clone(), serde_json::json!([1.0]))
            .await;

        assert!(cache.get(&history_key).await.is_some());
        assert!(cache.get(&news_key).await.is_none());
    }

    #[tokio::test]
    async fn test_cache_get_or_fetch() {
        let cache = StepCache::new(Duration::from_secs(60));
        let key = StepKey::new("AAPL", PipelineStep::News, day("2025-06-02"));
        let value = serde_json::json!({"articles": 3});

        let mut call_count = 0;
        let fetcher = || {
            call_count += 1;
            async { Ok::<_, String>(value.clone()) }
        };

        // First call should execute fetcher
        let result = cache.get_or_fetch(key.clone(), fetcher).await.unwrap();
        assert_eq!(result, value);
        assert_eq!(call_count, 1);

        // Second call should use cache
        let result = cache
            .get_or_fetch(key.clone(), || async {
                call_count += 1;
                Ok::<_, String>(value.clone())
            })
            .await
            .unwrap();
        assert_eq!(result, value);
        assert_eq!(call_count, 1); // Should not have incremented
    }

    #[tokio::test]
    async fn test_cache_invalidation() {
        let cache = StepCache::new(Duration::from_secs(60));
        let key = StepKey::new("AAPL", PipelineStep::Social, day("2025-06-02"));

        cache.insert(key.clone(), serde_json::json!({})).await;
        assert!(cache.get(&key).await.is_some());

        cache.invalidate(&key).await;
        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn test_cache_clear() {
        let cache = StepCache::new(Duration::from_secs(60));

        for i in 0..5 {
            let key = StepKey::new(format!("STOCK{i}"), PipelineStep::History, day("2025-06-02"));
            cache.insert(key, serde_json::json!({"price": i})).await;
        }

        assert_eq!(cache.len().await, 5);

        cache.clear().await;
        assert_eq!(cache.len().await, 0);
        assert!(cache.is_empty().await);
    }
}
