use super::{CacheBackend, CacheError};
use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

/// In-process cache backed by moka, bounded by entry weight.
pub struct InMemoryCache {
    cache: MokaCache<String, String>,
}

impl InMemoryCache {
    pub fn new(ttl_secs: u64, capacity_mib: usize) -> Self {
        let cache = MokaCache::builder()
            .time_to_live(Duration::from_secs(ttl_secs))
            .weigher(|key: &String, value: &String| (key.len() + value.len()) as u32)
            .max_capacity((capacity_mib * 1024 * 1024) as u64)
            .build();
        Self { cache }
    }
}

#[async_trait]
impl CacheBackend for InMemoryCache {
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), CacheError> {
        let serialized =
            serde_json::to_string(value).map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.cache.insert(key.to_string(), serialized).await;
        Ok(())
    }

    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.cache.get(key).await {
            Some(serialized) => serde_json::from_str(&serialized)
                .map(Some)
                .map_err(|e| CacheError::Deserialization(e.to_string())),
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.cache.remove(key).await;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Profile {
        login: String,
        id: u64,
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = InMemoryCache::new(60, 1);
        let profile = Profile {
            login: "octocat".to_string(),
            id: 583231,
        };

        cache.set("profile", &profile).await.expect("Failed to set");
        let cached: Option<Profile> = cache.get("profile").await.expect("Failed to get");
        assert_eq!(cached, Some(profile));
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let cache = InMemoryCache::new(60, 1);
        let cached: Option<String> = cache.get("missing").await.expect("Failed to get");
        assert!(cached.is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = InMemoryCache::new(60, 1);
        cache
            .set("key", &"value".to_string())
            .await
            .expect("Failed to set");

        cache.delete("key").await.expect("Failed to delete");
        let cached: Option<String> = cache.get("key").await.expect("Failed to get");
        assert!(cached.is_none());

        // deleting again is a no-op
        cache.delete("key").await.expect("Failed to delete");
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache = InMemoryCache::new(1, 1);
        cache
            .set("key", &"value".to_string())
            .await
            .expect("Failed to set");

        tokio::time::sleep(Duration::from_secs(2)).await;

        let cached: Option<String> = cache.get("key").await.expect("Failed to get");
        assert!(cached.is_none());
    }
}
