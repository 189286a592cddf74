//! Content-hash-keyed cache store
//!
//! JSON (de)serialization over a shared key-value backend. Every error
//! is absorbed here: writes report a boolean, reads report absence.
//! Keys are `prefix:sha256(prefix:identifier)` — the hash exists purely
//! for fixed-width, backend-safe keys, not for secrecy.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, error, info};

pub mod backend;

pub use backend::{CacheBackend, InMemoryCacheBackend};

/// Wrapper stored under every derived key
#[derive(Debug, Serialize, Deserialize)]
struct CacheEnvelope<T> {
    data: T,
    cached_at: DateTime<Utc>,
    identifier: String,
}

pub struct CacheStore {
    backend: Box<dyn CacheBackend>,
    default_ttl: Duration,
}

impl CacheStore {
    pub fn new(backend: Box<dyn CacheBackend>, default_ttl: Duration) -> Self {
        Self {
            backend,
            default_ttl,
        }
    }

    pub fn derive_key(prefix: &str, identifier: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("{}:{}", prefix, identifier).as_bytes());
        format!("{}:{}", prefix, hex::encode(hasher.finalize()))
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let serialized = match serde_json::to_string(value) {
            Ok(serialized) => serialized,
            Err(e) => {
                error!(key, error = %e, "Failed to serialize cache value");
                return false;
            }
        };

        match self.backend.set(key, serialized, ttl).await {
            Ok(()) => {
                debug!(key, ttl_secs = ttl.as_secs(), "Cached data");
                true
            }
            Err(e) => {
                error!(key, error = %e, "Failed to cache data");
                false
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let serialized = match self.backend.get(key).await {
            Ok(Some(serialized)) => serialized,
            Ok(None) => {
                debug!(key, "Cache miss");
                return None;
            }
            Err(e) => {
                error!(key, error = %e, "Failed to read cached data");
                return None;
            }
        };

        match serde_json::from_str(&serialized) {
            Ok(value) => {
                debug!(key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                error!(key, error = %e, "Failed to deserialize cached data");
                None
            }
        }
    }

    pub async fn delete(&self, key: &str) -> bool {
        match self.backend.delete(key).await {
            Ok(()) => {
                debug!(key, "Deleted cache key");
                true
            }
            Err(e) => {
                error!(key, error = %e, "Failed to delete cache key");
                false
            }
        }
    }

    /// Store `data` wrapped in the cache envelope under the derived key,
    /// with the default TTL.
    pub async fn cache_data<T: Serialize>(
        &self,
        prefix: &str,
        identifier: &str,
        data: &T,
    ) -> bool {
        let key = Self::derive_key(prefix, identifier);
        let envelope = CacheEnvelope {
            data,
            cached_at: Utc::now(),
            identifier: identifier.to_string(),
        };
        self.set(&key, &envelope, None).await
    }

    pub async fn get_cached_data<T: DeserializeOwned>(
        &self,
        prefix: &str,
        identifier: &str,
    ) -> Option<T> {
        let key = Self::derive_key(prefix, identifier);
        self.get::<CacheEnvelope<T>>(&key)
            .await
            .map(|envelope| envelope.data)
    }

    pub async fn invalidate_data(&self, prefix: &str, identifier: &str) -> bool {
        let key = Self::derive_key(prefix, identifier);
        self.delete(&key).await
    }

    /// Flushes the whole shared store, every prefix included.
    pub async fn clear_all(&self) -> bool {
        match self.backend.clear().await {
            Ok(()) => {
                info!("All cache cleared");
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to clear cache");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionError;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    fn store_with(backend: InMemoryCacheBackend) -> CacheStore {
        CacheStore::new(Box::new(backend), Duration::from_secs(300))
    }

    #[test]
    fn test_derive_key_is_deterministic() {
        let first = CacheStore::derive_key("extraction", "123");
        let second = CacheStore::derive_key("extraction", "123");
        assert_eq!(first, second);
        assert!(first.starts_with("extraction:"));
    }

    #[test]
    fn test_derive_key_differs_per_identifier() {
        let first = CacheStore::derive_key("extraction", "123");
        let second = CacheStore::derive_key("extraction", "124");
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_cache_data_roundtrip() {
        let store = store_with(InMemoryCacheBackend::new());
        let data = json!({"accounts": ["acc-1"]});

        assert!(store.cache_data("extraction", "123", &data).await);
        let cached: Option<Value> = store.get_cached_data("extraction", "123").await;
        assert_eq!(cached, Some(data));
    }

    #[tokio::test]
    async fn test_envelope_shape() {
        let backend = InMemoryCacheBackend::new();
        let store = store_with(backend.clone());
        store
            .cache_data("extraction", "123", &json!({"a": 1}))
            .await;

        let key = CacheStore::derive_key("extraction", "123");
        let raw = backend.get(&key).await.unwrap().unwrap();
        let envelope: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(envelope["data"], json!({"a": 1}));
        assert_eq!(envelope["identifier"], "123");
        assert!(envelope["cached_at"].is_string());
    }

    #[tokio::test]
    async fn test_malformed_content_reads_as_absent() {
        let backend = InMemoryCacheBackend::new();
        let store = store_with(backend.clone());

        let key = CacheStore::derive_key("extraction", "123");
        backend
            .set(&key, "not json at all".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        let cached: Option<Value> = store.get_cached_data("extraction", "123").await;
        assert_eq!(cached, None);
    }

    #[tokio::test]
    async fn test_invalidate_data() {
        let store = store_with(InMemoryCacheBackend::new());
        store.cache_data("extraction", "123", &json!(1)).await;

        assert!(store.invalidate_data("extraction", "123").await);
        let cached: Option<Value> = store.get_cached_data("extraction", "123").await;
        assert_eq!(cached, None);
    }

    #[tokio::test]
    async fn test_clear_all_flushes_every_prefix() {
        let store = store_with(InMemoryCacheBackend::new());
        store.cache_data("extraction", "123", &json!(1)).await;
        store.cache_data("other", "456", &json!(2)).await;

        assert!(store.clear_all().await);
        let first: Option<Value> = store.get_cached_data("extraction", "123").await;
        let second: Option<Value> = store.get_cached_data("other", "456").await;
        assert_eq!(first, None);
        assert_eq!(second, None);
    }

    struct FailingBackend;

    #[async_trait]
    impl CacheBackend for FailingBackend {
        async fn get(&self, _key: &str) -> crate::Result<Option<String>> {
            Err(ExtractionError::Cache("backend down".to_string()))
        }
        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> crate::Result<()> {
            Err(ExtractionError::Cache("backend down".to_string()))
        }
        async fn delete(&self, _key: &str) -> crate::Result<()> {
            Err(ExtractionError::Cache("backend down".to_string()))
        }
        async fn clear(&self) -> crate::Result<()> {
            Err(ExtractionError::Cache("backend down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_backend_errors_are_absorbed() {
        let store = CacheStore::new(Box::new(FailingBackend), Duration::from_secs(300));

        assert!(!store.cache_data("extraction", "123", &json!(1)).await);
        let cached: Option<Value> = store.get_cached_data("extraction", "123").await;
        assert_eq!(cached, None);
        assert!(!store.invalidate_data("extraction", "123").await);
        assert!(!store.clear_all().await);
    }
}
