//! Resolution metrics pushed into hour-bucketed cache lists
//!
//! Every resolution attempt produces one [`MetricsEvent`]. Events are
//! appended as JSON to `metrics_<hour-start-unix-timestamp>` so an external
//! job can aggregate a full hour with one list read. Recording is best
//! effort and never fails the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::CacheStore;

const BUCKET_SECONDS: i64 = 3600;

/// One resolution attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsEvent {
    /// Unix seconds
    pub timestamp: i64,
    /// Fingerprint of the provider key used, never the key itself
    pub key: String,
    /// Answered from the cache without calling the provider
    pub cache: bool,
    pub image_url: String,
    pub subreddit: Option<String>,
    pub error_kind: Option<String>,
}

impl MetricsEvent {
    pub fn new(
        at: DateTime<Utc>,
        key: impl Into<String>,
        cache: bool,
        image_url: impl Into<String>,
        subreddit: Option<&str>,
        error_kind: Option<&str>,
    ) -> Self {
        Self {
            timestamp: at.timestamp(),
            key: key.into(),
            cache,
            image_url: image_url.into(),
            subreddit: subreddit.map(str::to_string),
            error_kind: error_kind.map(str::to_string),
        }
    }

    /// List key of the hour this event falls in
    pub fn bucket_key(&self) -> String {
        bucket_key(self.timestamp)
    }
}

/// `metrics_<start of the hour containing timestamp>`
pub fn bucket_key(timestamp: i64) -> String {
    format!("metrics_{}", timestamp - timestamp.rem_euclid(BUCKET_SECONDS))
}

#[derive(Clone)]
pub struct MetricsRecorder {
    store: Arc<dyn CacheStore>,
}

impl MetricsRecorder {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub async fn record(&self, event: MetricsEvent) {
        let key = event.bucket_key();
        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize metrics event: {}", e);
                return;
            }
        };

        match self.store.push_list(&key, &payload).await {
            Ok(()) => debug!("Recorded metrics event in {}", key),
            Err(e) => warn!("Failed to record metrics event in {}: {}", key, e),
        }
    }
}

impl std::fmt::Debug for MetricsRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRecorder")
            .field("store", &self.store.name())
            .finish()
    }
}
