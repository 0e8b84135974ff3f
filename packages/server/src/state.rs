use std::sync::Arc;

use common::hook::HookRegistry;
use common::media::MediaRepository;
use common::storage::{LocalUploadProvider, StorageError, UploadProvider};
use common::store::KeyValueStore;

use crate::config::AppConfig;
use crate::services::{ClientAccessor, ProviderSelector, SettingsService, WebhookService};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub settings: Arc<SettingsService>,
    /// Active upload provider: ImageKit when upload forwarding is on,
    /// the local provider otherwise.
    pub uploads: Arc<dyn UploadProvider>,
    pub media: Arc<dyn MediaRepository>,
    pub webhook: Arc<WebhookService>,
    pub hooks: Arc<HookRegistry>,
}

impl AppState {
    /// Wire the services over the given host collaborators.
    pub async fn build(
        config: AppConfig,
        store: Arc<dyn KeyValueStore>,
        media: Arc<dyn MediaRepository>,
        hooks: HookRegistry,
        client: ClientAccessor,
    ) -> Result<Self, StorageError> {
        let hooks = Arc::new(hooks);
        let settings = Arc::new(SettingsService::new(
            store,
            config.imagekit.clone(),
            Arc::new(client),
        ));

        let local = LocalUploadProvider::new(
            config.storage.public_dir.clone(),
            config.storage.max_upload_size,
        )
        .await?;
        let uploads: Arc<dyn UploadProvider> =
            Arc::new(ProviderSelector::new(Arc::new(local), settings.clone()));

        let webhook = Arc::new(WebhookService::new(
            media.clone(),
            hooks.clone(),
            config.upload.format_names(),
        ));

        Ok(Self {
            config: Arc::new(config),
            settings,
            uploads,
            media,
            webhook,
            hooks,
        })
    }
}
