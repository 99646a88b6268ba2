//! Keyed read cache for list and result endpoints.
//!
//! Keys are namespaced strings such as `participants:game=<id>`. Every write
//! invalidates the namespaces it can affect by prefix, so a later read
//! always reloads from the store.

use crate::error::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

pub mod keys {
    pub const SCHOOLS: &str = "schools";
    pub const GAMES: &str = "games";
    pub const PARTICIPANTS: &str = "participants";
    pub const HEATS: &str = "heats";
    pub const HEAT_PARTICIPANTS: &str = "heat_participants";
    pub const MATCH_POOLS: &str = "match_pools";
    pub const CHAMPIONSHIPS: &str = "championships";
    pub const CIRCULARS: &str = "circulars";
    pub const RANKINGS: &str = "rankings";
    pub const QUALIFIED: &str = "qualified";
    pub const STATS: &str = "stats";
}

/// Upper bound on live entries. Query parameters come from anonymous
/// callers, so the key space is unbounded.
pub const MAX_ENTRIES: usize = 512;

pub struct QueryCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, (Instant, Value)>>,
    /// Bumped by every invalidation, under the entries write lock.
    generation: AtomicU64,
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|(stored, _)| stored.elapsed() < self.ttl)
            .map(|(_, value)| value.clone())
    }

    pub async fn put(&self, key: String, value: Value) {
        let mut entries = self.entries.write().await;
        self.insert(&mut entries, key, value);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    fn insert(&self, entries: &mut HashMap<String, (Instant, Value)>, key: String, value: Value) {
        entries.retain(|_, (stored, _)| stored.elapsed() < self.ttl);

        if entries.len() >= MAX_ENTRIES && !entries.contains_key(&key) {
            tracing::debug!(key = %key, "cache full, not storing");
            return;
        }
        entries.insert(key, (Instant::now(), value));
    }

    /// Cached value for `key`, or the result of `load` which is then stored.
    /// Load errors are returned as-is and nothing is cached. A value loaded
    /// while an invalidation ran is returned but not stored, since it may
    /// predate the write that triggered it.
    pub async fn get_or_load<T, F, Fut>(&self, key: String, load: F) -> Result<Value>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(hit) = self.get(&key).await {
            tracing::debug!(key = %key, "cache hit");
            return Ok(hit);
        }

        let generation = self.generation.load(Ordering::Acquire);
        let value = serde_json::to_value(load().await?)
            .map_err(|e| anyhow::anyhow!("Failed to serialize {}: {}", key, e))?;

        let mut entries = self.entries.write().await;
        if self.generation.load(Ordering::Acquire) == generation {
            self.insert(&mut entries, key, value.clone());
        } else {
            tracing::debug!(key = %key, "invalidated during load, not storing");
        }
        Ok(value)
    }

    /// Drop every entry whose key starts with one of `prefixes`.
    pub async fn invalidate(&self, prefixes: &[&str]) {
        let mut entries = self.entries.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        let before = entries.len();
        entries.retain(|key, _| !prefixes.iter().any(|p| key.starts_with(p)));
        tracing::debug!(
            removed = before - entries.len(),
            prefixes = ?prefixes,
            "cache invalidated"
        );
    }
}

pub fn key(namespace: &str, params: &[(&str, Option<&str>)]) -> String {
    let mut key = namespace.to_string();
    for (name, value) in params {
        key.push_str(&format!(":{}={}", name, value.unwrap_or("all")));
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_loads_once_until_invalidated() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let load = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, AppError>(vec![1, 2, 3])
        };

        let first = cache.get_or_load("schools".into(), load).await.unwrap();
        let second = cache.get_or_load("schools".into(), load).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cache.invalidate(&[keys::SCHOOLS]).await;
        cache.get_or_load("schools".into(), load).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_by_prefix() {
        let cache = QueryCache::new(Duration::from_secs(60));
        cache.put(key(keys::PARTICIPANTS, &[("game", Some("g1"))]), Value::Null).await;
        cache.put(key(keys::PARTICIPANTS, &[("game", None)]), Value::Null).await;
        cache.put(keys::SCHOOLS.to_string(), Value::Null).await;

        cache.invalidate(&[keys::PARTICIPANTS]).await;
        assert!(cache.get("participants:game=g1").await.is_none());
        assert!(cache.get("participants:game=all").await.is_none());
        assert!(cache.get("schools").await.is_some());
    }

    #[tokio::test]
    async fn test_expired_entries_are_reloaded() {
        let cache = QueryCache::new(Duration::ZERO);
        cache.put("stats".to_string(), Value::Bool(true)).await;
        assert!(cache.get("stats").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entries_are_dropped_on_write() {
        let cache = QueryCache::new(Duration::ZERO);
        for i in 0..20 {
            let location = format!("town{}", i);
            cache
                .put(key(keys::RANKINGS, &[("location", Some(location.as_str()))]), Value::Null)
                .await;
        }
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_entry_count_is_capped() {
        let cache = QueryCache::new(Duration::from_secs(60));
        for i in 0..MAX_ENTRIES + 25 {
            let game = format!("g{}", i);
            cache
                .get_or_load(key(keys::PARTICIPANTS, &[("game", Some(game.as_str()))]), || async {
                    Ok::<_, AppError>(Vec::<u8>::new())
                })
                .await
                .unwrap();
        }
        assert_eq!(cache.len().await, MAX_ENTRIES);

        // Keys already present can still be refreshed
        cache.put("participants:game=g0".to_string(), Value::Bool(true)).await;
        assert_eq!(cache.get("participants:game=g0").await, Some(Value::Bool(true)));
    }

    #[tokio::test]
    async fn test_value_loaded_across_invalidation_is_not_stored() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let shared = &cache;

        let value = shared
            .get_or_load(keys::STATS.to_string(), || async move {
                // A write lands while the rows are being read
                shared.invalidate(&[keys::STATS]).await;
                Ok::<_, AppError>(7)
            })
            .await
            .unwrap();

        assert_eq!(value, Value::from(7));
        assert!(cache.get(keys::STATS).await.is_none());
    }

    #[tokio::test]
    async fn test_load_errors_are_not_cached() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let result = cache
            .get_or_load("games".into(), || async {
                Err::<Vec<u8>, _>(AppError::NotFound("Game not found".into()))
            })
            .await;
        assert!(result.is_err());
        assert!(cache.get("games").await.is_none());
    }
}
