//! Key/value store abstraction used for resolved records and metrics

use async_trait::async_trait;
use std::time::Duration;

use crate::errors::CacheResult;

/// Port for the cache backing the resolver
///
/// Implementations must be thread-safe. Values are opaque bytes; list
/// values are appended in order and never read back by the bot itself.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Human-readable backend name (for logging)
    fn name(&self) -> &'static str;

    /// Fetch a value. `Ok(None)` on a miss.
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Store a value that expires after `ttl`
    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()>;

    /// Remove a value, if present
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Append to a list value
    async fn push_list(&self, key: &str, value: &str) -> CacheResult<()>;
}
