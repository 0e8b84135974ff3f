use std::sync::Arc;

use common::settings::Settings;
use imagekit::{Credentials, ImageKit, MediaCdn};
use tokio::sync::RwLock;
use tracing::info;

use super::ServiceError;

/// Builds a CDN client from credentials.
pub type CdnFactory = Arc<dyn Fn(Credentials) -> Arc<dyn MediaCdn> + Send + Sync>;

/// Lazily built, shared CDN client.
///
/// The first caller with usable credentials builds the client; everyone after
/// that gets the cached instance until [`ClientAccessor::invalidate`].
pub struct ClientAccessor {
    cache: RwLock<Option<Arc<dyn MediaCdn>>>,
    factory: CdnFactory,
}

impl ClientAccessor {
    pub fn new() -> Self {
        Self::with_factory(Arc::new(|credentials| {
            Arc::new(ImageKit::new(credentials)) as Arc<dyn MediaCdn>
        }))
    }

    pub fn with_factory(factory: CdnFactory) -> Self {
        Self {
            cache: RwLock::new(None),
            factory,
        }
    }

    /// Return the cached client, building it from `settings` on first use.
    pub async fn get_client(&self, settings: &Settings) -> Result<Arc<dyn MediaCdn>, ServiceError> {
        if let Some(client) = self.cache.read().await.as_ref() {
            return Ok(client.clone());
        }

        let missing = settings.missing_credentials();
        if !missing.is_empty() {
            return Err(ServiceError::Configuration { missing });
        }

        let mut cache = self.cache.write().await;
        if let Some(client) = cache.as_ref() {
            return Ok(client.clone());
        }

        let client = (self.factory)(Credentials {
            public_key: settings.public_key.clone(),
            private_key: settings.private_key.clone(),
            url_endpoint: settings.url_endpoint.clone(),
        });
        *cache = Some(client.clone());
        info!(endpoint = %settings.url_endpoint, "ImageKit client initialized");
        Ok(client)
    }

    /// Drop the cached client so the next call rebuilds it.
    pub async fn invalidate(&self) {
        self.cache.write().await.take();
    }

    pub async fn is_initialized(&self) -> bool {
        self.cache.read().await.is_some()
    }
}

impl Default for ClientAccessor {
    fn default() -> Self {
        Self::new()
    }
}
