//! Resolution of an image URL to a source record
//!
//! ```text
//! resolve(url)
//!   ├── cache enabled? ── get(url) ── hit ──> decode ──> done (from cache)
//!   │                        └── miss / unreachable
//!   └── provider search ── failure ──> error (nothing cached)
//!                         └── found / not_found ──> set_with_ttl ──> done
//! ```
//!
//! Every attempt emits one metrics event when a recorder is attached.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::metrics::{MetricsEvent, MetricsRecorder};
use crate::cache::{CacheStore, codec};
use crate::config::CacheConfig;
use crate::errors::ResolveError;
use crate::models::{ErrorKind, SauceRecord};
use crate::sources::{ProviderPool, RateLimits, key_fingerprint};

/// Result of a successful resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub record: SauceRecord,
    pub from_cache: bool,
    /// Only present when the provider was actually queried
    pub rate_limits: Option<RateLimits>,
}

pub struct SauceResolver {
    pool: Arc<ProviderPool>,
    api_key: String,
    key_id: String,
    cache: Option<Arc<dyn CacheStore>>,
    metrics: Option<MetricsRecorder>,
    found_ttl: Duration,
    not_found_ttl: Duration,
}

impl SauceResolver {
    /// Resolver without cache or metrics
    pub fn new(pool: Arc<ProviderPool>, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        let defaults = CacheConfig::default();
        Self {
            key_id: key_fingerprint(&api_key),
            pool,
            api_key,
            cache: None,
            metrics: None,
            found_ttl: defaults.found_ttl,
            not_found_ttl: defaults.not_found_ttl,
        }
    }

    pub fn with_cache(mut self, store: Arc<dyn CacheStore>, found_ttl: Duration, not_found_ttl: Duration) -> Self {
        self.cache = Some(store);
        self.found_ttl = found_ttl;
        self.not_found_ttl = not_found_ttl;
        self
    }

    pub fn with_metrics(mut self, recorder: MetricsRecorder) -> Self {
        self.metrics = Some(recorder);
        self
    }

    pub fn caching_enabled(&self) -> bool {
        self.cache.is_some()
    }

    /// Resolve `image_url`, posted in `subreddit` when known
    pub async fn resolve(&self, image_url: &str, subreddit: Option<&str>) -> Result<Resolution, ResolveError> {
        if let Some(cache) = &self.cache {
            match cache.get(image_url).await {
                Ok(Some(bytes)) => return self.from_cache(cache.as_ref(), image_url, &bytes, subreddit).await,
                Ok(None) => debug!("Cache miss for {}", image_url),
                Err(e) => warn!("Cache lookup failed for {}, querying provider: {}", image_url, e),
            }
        }

        let provider = self.pool.client_for(&self.api_key).await.map_err(|e| {
            error!("No provider client available for key {}: {}", self.key_id, e);
            ResolveError::Provider {
                image_url: image_url.to_string(),
                kind: ErrorKind::ProviderError,
            }
        })?;

        let outcome = provider.search(image_url).await;
        if let Some(limits) = &outcome.rate_limits {
            log_rate_limits(provider.name(), limits);
        }

        let record = outcome.record;
        if let Some(kind) = record.error_kind().filter(|kind| kind.is_failure()) {
            warn!("Lookup of {} failed with {}, not caching", image_url, kind);
            self.emit(false, image_url, subreddit, Some(kind.as_str())).await;
            return Err(ResolveError::Provider {
                image_url: image_url.to_string(),
                kind,
            });
        }

        if let Some(cache) = &self.cache {
            let ttl = if record.is_empty() {
                self.not_found_ttl
            } else {
                self.found_ttl
            };
            match codec::encode(&record) {
                Ok(bytes) => match cache.set_with_ttl(image_url, &bytes, ttl).await {
                    Ok(()) => debug!(
                        "Cached result for {} for {}",
                        image_url,
                        humantime::format_duration(ttl)
                    ),
                    Err(e) => warn!("Failed to cache result for {}: {}", image_url, e),
                },
                Err(e) => warn!("Failed to encode result for {}: {}", image_url, e),
            }
        }

        self.emit(false, image_url, subreddit, record.error_kind().map(ErrorKind::as_str))
            .await;

        Ok(Resolution {
            record,
            from_cache: false,
            rate_limits: outcome.rate_limits,
        })
    }

    async fn from_cache(
        &self,
        cache: &dyn CacheStore,
        image_url: &str,
        bytes: &[u8],
        subreddit: Option<&str>,
    ) -> Result<Resolution, ResolveError> {
        match codec::decode(image_url, bytes) {
            Ok(record) => {
                info!("Found cache entry for {}", image_url);
                self.emit(true, image_url, subreddit, record.error_kind().map(ErrorKind::as_str))
                    .await;
                Ok(Resolution {
                    record,
                    from_cache: true,
                    rate_limits: None,
                })
            }
            Err(source) => {
                error!("Corrupt cache entry for {}, evicting: {}", image_url, source);
                if let Err(e) = cache.delete(image_url).await {
                    warn!("Failed to evict corrupt cache entry for {}: {}", image_url, e);
                }
                self.emit(true, image_url, subreddit, Some("decode_error")).await;
                Err(ResolveError::Decode {
                    image_url: image_url.to_string(),
                    source,
                })
            }
        }
    }

    async fn emit(&self, cache: bool, image_url: &str, subreddit: Option<&str>, error_kind: Option<&str>) {
        if let Some(metrics) = &self.metrics {
            metrics
                .record(MetricsEvent::new(
                    Utc::now(),
                    self.key_id.as_str(),
                    cache,
                    image_url,
                    subreddit,
                    error_kind,
                ))
                .await;
        }
    }
}

fn log_rate_limits(provider: &str, limits: &RateLimits) {
    debug!(
        "{} searches remaining: short {:?}/{:?}, long {:?}/{:?}",
        provider, limits.short_remaining, limits.short_limit, limits.long_remaining, limits.long_limit
    );
    if limits.short_remaining == Some(0) || limits.long_remaining == Some(0) {
        warn!("{} search window exhausted, further lookups will be refused", provider);
    }
}

impl std::fmt::Debug for SauceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SauceResolver")
            .field("key", &self.key_id)
            .field("cache", &self.cache.as_ref().map(|c| c.name()))
            .field("metrics", &self.metrics.is_some())
            .field("found_ttl", &self.found_ttl)
            .field("not_found_ttl", &self.not_found_ttl)
            .finish()
    }
}
