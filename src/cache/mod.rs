//! Caching of resolved records
//!
//! ```text
//! CacheStore (trait)
//!   ├── RedisCacheStore   <- shared, survives restarts
//!   └── MemoryCacheStore  <- single process, LRU bounded
//! ```
//!
//! Records are stored under their image URL using the [`codec`] encoding.

pub mod codec;
pub mod memory_store;
pub mod redis_store;
pub mod store;

use std::sync::Arc;
use tracing::{info, warn};

pub use memory_store::MemoryCacheStore;
pub use redis_store::RedisCacheStore;
pub use store::CacheStore;

use crate::config::{CacheBackend, CacheConfig, MetricsConfig};
use crate::errors::AppResult;
use crate::utils::url::UrlUtils;

/// Build the configured cache backend. `None` when caching is disabled.
pub async fn build_store(config: &CacheConfig) -> AppResult<Option<Arc<dyn CacheStore>>> {
    let store: Arc<dyn CacheStore> = match config.backend {
        CacheBackend::Disabled => {
            info!("Caching disabled, every image will be looked up");
            return Ok(None);
        }
        CacheBackend::Memory => Arc::new(MemoryCacheStore::new(config.memory_capacity)),
        CacheBackend::Redis => Arc::new(RedisCacheStore::connect(&config.redis_url).await?),
    };
    info!("Using {} cache backend", store.name());
    Ok(Some(store))
}

/// Stores backing the record cache and the metrics lists
pub struct Stores {
    pub cache: Option<Arc<dyn CacheStore>>,
    pub metrics: Option<Arc<dyn CacheStore>>,
}

/// Build the cache store and, when metrics are enabled, the store they are
/// pushed to.
///
/// Metrics share the cache store when there is one. With caching disabled
/// they go to Redis at `redis_url`; if that cannot be reached metrics are
/// turned off with a warning instead of failing start-up.
pub async fn build_stores(cache: &CacheConfig, metrics: &MetricsConfig) -> AppResult<Stores> {
    let cache_store = build_store(cache).await?;
    if !metrics.enabled {
        return Ok(Stores {
            cache: cache_store,
            metrics: None,
        });
    }

    let metrics_store = match &cache_store {
        Some(store) => Some(store.clone()),
        None => {
            let redis_url = UrlUtils::obfuscate_credentials(&cache.redis_url);
            info!("Caching disabled, recording metrics in redis at {}", redis_url);
            match RedisCacheStore::connect(&cache.redis_url).await {
                Ok(store) => Some(Arc::new(store) as Arc<dyn CacheStore>),
                Err(e) => {
                    warn!("Metrics enabled but no store is reachable, metrics disabled: {}", e);
                    None
                }
            }
        }
    };

    Ok(Stores {
        cache: cache_store,
        metrics: metrics_store,
    })
}
