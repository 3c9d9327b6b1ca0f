//! In-process cache backend
//!
//! Bounded by LRUs so a long-running bot without Redis cannot grow
//! without limit: at most `capacity` keyed values and `capacity` lists,
//! each list keeping its newest `capacity` items. Keyed values also honour
//! their TTL on read.

use async_trait::async_trait;
use lru::LruCache;
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use super::store::CacheStore;
use crate::errors::CacheResult;

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

pub struct MemoryCacheStore {
    entries: Mutex<LruCache<String, Entry>>,
    lists: Mutex<LruCache<String, VecDeque<String>>>,
    list_capacity: usize,
}

impl MemoryCacheStore {
    /// Create a store holding at most `capacity` keyed values and lists (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            lists: Mutex::new(LruCache::new(capacity)),
            list_capacity: capacity.get(),
        }
    }

    /// Snapshot of a list value, oldest first
    pub async fn list(&self, key: &str) -> Vec<String> {
        self.lists
            .lock()
            .await
            .peek(key)
            .map(|items| items.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Keys of all list values, sorted
    pub async fn list_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .lists
            .lock()
            .await
            .iter()
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Number of live keyed values
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .iter()
            .filter(|(_, entry)| entry.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut entries = self.entries.lock().await;
        let expired = match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            debug!("Dropping expired cache entry for {}", key);
            entries.pop(key);
        }
        Ok(None)
    }

    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()> {
        let entry = Entry {
            value: value.to_vec(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.lock().await.put(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.lock().await.pop(key);
        Ok(())
    }

    async fn push_list(&self, key: &str, value: &str) -> CacheResult<()> {
        let mut lists = self.lists.lock().await;
        let items = lists.get_or_insert_mut(key.to_string(), VecDeque::new);
        if items.len() >= self.list_capacity {
            items.pop_front();
        }
        items.push_back(value.to_string());
        Ok(())
    }
}
