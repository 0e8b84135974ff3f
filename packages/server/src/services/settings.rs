use std::sync::Arc;

use common::settings::{self, Settings};
use common::store::{KeyValueStore, StoreError};
use imagekit::MediaCdn;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::{ClientAccessor, ServiceError};

/// Key of the persisted settings record inside the plugin's store scope.
pub const SETTINGS_KEY: &str = "config";

/// Resolves the effective settings from the persisted record, the static
/// file config and the built-in defaults, in that order.
pub struct SettingsService {
    store: Arc<dyn KeyValueStore>,
    file_config: Settings,
    client: Arc<ClientAccessor>,
}

impl SettingsService {
    pub fn new(store: Arc<dyn KeyValueStore>, file_config: Settings, client: Arc<ClientAccessor>) -> Self {
        Self {
            store,
            file_config,
            client,
        }
    }

    /// The effective settings. A layer only counts when it carries both keys
    /// and the endpoint; the first such layer wins, merged over defaults.
    #[instrument(skip(self))]
    pub async fn get_settings(&self) -> Result<Settings, ServiceError> {
        if let Some(stored) = self.store.get(SETTINGS_KEY).await? {
            match Settings::from_value(&stored) {
                Ok(settings) if settings.is_usable() => return Ok(settings),
                Ok(_) => debug!("Stored settings lack credentials, falling back"),
                Err(e) => warn!(error = %e, "Stored settings are unreadable, falling back"),
            }
        }

        if self.file_config.is_usable() {
            return Ok(self.file_config.clone());
        }

        Ok(Settings::default())
    }

    /// Persist `value` exactly as given and return the re-resolved settings.
    ///
    /// No defaults are merged on write: a partial object replaces the whole
    /// record, and if it lacks credentials the next read falls back past it.
    #[instrument(skip(self, value))]
    pub async fn update_settings(&self, value: Value) -> Result<Settings, ServiceError> {
        self.store.set(SETTINGS_KEY, value).await?;
        self.client.invalidate().await;
        info!("Settings updated");
        self.get_settings().await
    }

    /// Validate a submitted settings object and persist its normalized form.
    /// Nothing is written when any field is rejected.
    #[instrument(skip(self, payload))]
    pub async fn apply_settings(&self, payload: &Value) -> Result<Settings, ServiceError> {
        let validated = settings::validate(payload).map_err(ServiceError::Validation)?;
        self.update_settings(to_record(&validated)?).await
    }

    /// Replace the stored record with the file config and return it.
    #[instrument(skip(self))]
    pub async fn restore_config(&self) -> Result<Settings, ServiceError> {
        let settings = self.file_config.clone();
        self.store.set(SETTINGS_KEY, to_record(&settings)?).await?;
        self.client.invalidate().await;
        info!("Settings restored from file config");
        Ok(settings)
    }

    /// Store the file config if no record exists yet. Returns whether it did.
    #[instrument(skip(self))]
    pub async fn seed_settings(&self) -> Result<bool, ServiceError> {
        if self.store.get(SETTINGS_KEY).await?.is_some() {
            return Ok(false);
        }
        self.store.set(SETTINGS_KEY, to_record(&self.file_config)?).await?;
        info!("Seeded settings from file config");
        Ok(true)
    }

    /// The CDN client for the current settings.
    pub async fn client(&self) -> Result<Arc<dyn MediaCdn>, ServiceError> {
        let settings = self.get_settings().await?;
        self.client.get_client(&settings).await
    }

    pub fn accessor(&self) -> &Arc<ClientAccessor> {
        &self.client
    }
}

fn to_record(settings: &Settings) -> Result<Value, ServiceError> {
    serde_json::to_value(settings)
        .map_err(|e| StoreError::Backend(format!("failed to encode settings: {e}")).into())
}
