//! Redis cache backend
//!
//! Uses a `ConnectionManager`, which reconnects on its own and is cheap to
//! clone, so every command works on its own handle.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tracing::info;

use super::store::CacheStore;
use crate::errors::CacheResult;
use crate::utils::url::UrlUtils;

pub struct RedisCacheStore {
    connection: ConnectionManager,
}

impl RedisCacheStore {
    /// Connect to `redis_url` (`redis://[:password@]host:port[/db]`)
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;
        info!(
            "Connected to redis at {}",
            UrlUtils::obfuscate_credentials(redis_url)
        );
        Ok(Self { connection })
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut connection = self.connection.clone();
        let value: Option<Vec<u8>> = connection.get(key).await?;
        Ok(value)
    }

    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()> {
        let mut connection = self.connection.clone();
        // SETEX rejects a zero expiry
        let seconds = ttl.as_secs().max(1);
        let _: () = connection.set_ex(key, value, seconds).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut connection = self.connection.clone();
        let _: () = connection.del(key).await?;
        Ok(())
    }

    async fn push_list(&self, key: &str, value: &str) -> CacheResult<()> {
        let mut connection = self.connection.clone();
        let _: () = connection.rpush(key, value).await?;
        Ok(())
    }
}
