use confique::Config;
use serde::{Deserialize, Serialize};

/// Backing store for the GitHub profile cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheStore {
    InMemory,
    #[serde(other)]
    None,
}

/// GitHub profile cache configuration.
#[derive(Debug, Config, Clone)]
pub struct CacheConfig {
    /// Which cache store to use
    #[config(env = "BRIDGE_CACHE_STORE", default = "in-memory")]
    pub store: CacheStore,

    /// How long cached profiles stay fresh, in seconds
    #[config(env = "BRIDGE_CACHE_TTL_SECS", default = 60)]
    pub ttl_secs: u32,

    /// Maximum size of the in-memory cache, in MiB
    #[config(env = "BRIDGE_CACHE_MEMORY_CAPACITY_MIB", default = 16)]
    pub memory_capacity_mib: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            store: CacheStore::InMemory,
            ttl_secs: 60,
            memory_capacity_mib: 16,
        }
    }
}
