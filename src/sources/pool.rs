//! Provider clients keyed by API key

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::saucenao::SauceNaoClient;
use super::traits::SauceProvider;
use crate::config::SauceNaoConfig;
use crate::errors::AppResult;

type ProviderFactory = dyn Fn(&str) -> AppResult<Arc<dyn SauceProvider>> + Send + Sync;

/// Hex characters of the key digest kept in logs and metrics
const FINGERPRINT_LEN: usize = 12;

/// Short stable identifier for an API key that is safe to log
pub fn key_fingerprint(api_key: &str) -> String {
    let digest = hex::encode(Sha256::digest(api_key.as_bytes()));
    digest[..FINGERPRINT_LEN].to_string()
}

/// Owns one provider client per API key
///
/// Built once at start-up and shared by reference. Clients are created on
/// first use and reused for every later search with the same key.
pub struct ProviderPool {
    factory: Box<ProviderFactory>,
    clients: RwLock<HashMap<String, Arc<dyn SauceProvider>>>,
}

impl ProviderPool {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&str) -> AppResult<Arc<dyn SauceProvider>> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Pool that builds SauceNAO clients from `config`
    pub fn saucenao(config: SauceNaoConfig) -> Self {
        Self::new(move |api_key| {
            let client: Arc<dyn SauceProvider> = Arc::new(SauceNaoClient::new(&config, api_key)?);
            Ok(client)
        })
    }

    /// Get or create the client for `api_key`
    pub async fn client_for(&self, api_key: &str) -> AppResult<Arc<dyn SauceProvider>> {
        {
            let clients = self.clients.read().await;
            if let Some(client) = clients.get(api_key) {
                return Ok(client.clone());
            }
        }

        let mut clients = self.clients.write().await;
        // Another task may have won the race while we waited for the write lock
        if let Some(client) = clients.get(api_key) {
            return Ok(client.clone());
        }

        let client = (self.factory)(api_key)?;
        info!(
            "Created {} client for key {}",
            client.name(),
            key_fingerprint(api_key)
        );
        clients.insert(api_key.to_string(), client.clone());
        Ok(client)
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }
}

impl std::fmt::Debug for ProviderPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderPool").finish_non_exhaustive()
    }
}
