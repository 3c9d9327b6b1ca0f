//! Reverse-image-search provider abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::SauceRecord;

/// Search window counters reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimits {
    pub short_remaining: Option<u32>,
    pub short_limit: Option<u32>,
    pub long_remaining: Option<u32>,
    pub long_limit: Option<u32>,
}

/// What one search produced
///
/// Failures are carried in `record.error_kind()`; rate-limit counters ride
/// alongside and are never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderOutcome {
    pub record: SauceRecord,
    pub rate_limits: Option<RateLimits>,
}

impl ProviderOutcome {
    pub fn new(record: SauceRecord, rate_limits: Option<RateLimits>) -> Self {
        Self {
            record,
            rate_limits,
        }
    }
}

/// A reverse-image-search backend
///
/// `search` issues a single request and always returns an outcome: provider
/// and transport errors are classified into the record's error kind rather
/// than raised.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SauceProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &'static str;

    async fn search(&self, image_url: &str) -> ProviderOutcome;
}
