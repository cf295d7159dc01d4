mod memory;
mod null;

pub use memory::InMemoryCache;
pub use null::NullCache;

use crate::config::{CacheStore, Settings};
use async_trait::async_trait;
use log::info;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to serialize value: {0}")]
    Serialization(String),

    #[error("Failed to deserialize value: {0}")]
    Deserialization(String),
}

/// Storage backend for cached GitHub API responses.
///
/// Values are serialized to JSON strings before storage, so any
/// serde-compatible type can be cached.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Store a value under the given key.
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T)
        -> Result<(), CacheError>;

    /// Fetch a value by key, or `None` when absent or expired.
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, CacheError>;

    /// Drop a key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Verify the backend is usable.
    async fn health_check(&self) -> Result<(), CacheError>;
}

/// Cache implementation selected by configuration.
pub enum Cache {
    InMemory(InMemoryCache),
    Null(NullCache),
}

#[async_trait]
impl CacheBackend for Cache {
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), CacheError> {
        match self {
            Cache::InMemory(cache) => cache.set(key, value).await,
            Cache::Null(cache) => cache.set(key, value).await,
        }
    }

    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self {
            Cache::InMemory(cache) => cache.get(key).await,
            Cache::Null(cache) => cache.get(key).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        match self {
            Cache::InMemory(cache) => cache.delete(key).await,
            Cache::Null(cache) => cache.delete(key).await,
        }
    }

    async fn health_check(&self) -> Result<(), CacheError> {
        match self {
            Cache::InMemory(cache) => cache.health_check().await,
            Cache::Null(cache) => cache.health_check().await,
        }
    }
}

/// Build the cache selected by `settings.cache.store`.
pub fn create_cache(settings: &Settings) -> Cache {
    match settings.cache.store {
        CacheStore::InMemory => {
            info!(
                "Using in-memory cache with TTL {}s and capacity {} MiB",
                settings.cache.ttl_secs, settings.cache.memory_capacity_mib
            );
            Cache::InMemory(InMemoryCache::new(
                u64::from(settings.cache.ttl_secs),
                settings.cache.memory_capacity_mib,
            ))
        }
        CacheStore::None => {
            info!("Caching disabled");
            Cache::Null(NullCache::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheStore;

    #[tokio::test]
    async fn test_create_cache_in_memory() {
        let mut settings = Settings::default();
        settings.cache.store = CacheStore::InMemory;

        let cache = create_cache(&settings);
        assert!(matches!(cache, Cache::InMemory(_)));
        assert!(cache.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_create_cache_null() {
        let mut settings = Settings::default();
        settings.cache.store = CacheStore::None;

        let cache = create_cache(&settings);
        assert!(matches!(cache, Cache::Null(_)));

        cache
            .set("key", &"value".to_string())
            .await
            .expect("Failed to set value");
        let value: Option<String> = cache.get("key").await.expect("Failed to get value");
        assert!(value.is_none());
    }
}
