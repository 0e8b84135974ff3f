use std::sync::Arc;

use async_trait::async_trait;
use common::settings::Settings;
use common::storage::{FileData, StorageError, UploadFile, UploadProvider};
use imagekit::{MediaCdn, UploadBody, UploadRequest, UrlOptions};
use serde_json::json;
use tracing::{debug, error, info, instrument, warn};

use super::{ServiceError, SettingsService};
use crate::utils::filename::join_folder;

/// Provider name recorded on files stored on ImageKit.
pub const IMAGEKIT_PROVIDER: &str = "imagekit";

/// Upload provider backed by ImageKit.
pub struct ImageKitUploadService {
    settings: Arc<SettingsService>,
}

impl ImageKitUploadService {
    pub fn new(settings: Arc<SettingsService>) -> Self {
        Self { settings }
    }

    async fn resolve(&self) -> Result<(Settings, Arc<dyn MediaCdn>), ServiceError> {
        let settings = self.settings.get_settings().await?;
        let client = self.settings.accessor().get_client(&settings).await?;
        Ok((settings, client))
    }

    /// Upload the file and, once ImageKit confirms it, point the file at the
    /// CDN copy. On failure the file keeps its previous url and provider.
    #[instrument(skip(self, file), fields(name = %file.name, hash = %file.hash))]
    pub async fn upload(&self, file: &mut UploadFile) -> Result<(), ServiceError> {
        let (settings, client) = self.resolve().await?;

        let body = match file.data.take() {
            Some(FileData::Buffer(bytes)) => UploadBody::Bytes(bytes),
            Some(FileData::Stream(reader)) => UploadBody::Stream(reader),
            None => return Err(ServiceError::MissingFileData),
        };
        debug!(body = ?body, "Uploading file to ImageKit");

        let options = &settings.upload_options;
        let mut request = UploadRequest::new(body, file.file_name());
        request.mime = Some(file.mime.clone()).filter(|m| !m.is_empty());
        request.use_unique_file_name = false;
        request.is_private_file = options.is_private_file;
        request.tags = options.tags.clone();
        request.folder = join_folder(&options.folder, file.folder_path.as_deref());
        request.checks = Some(options.checks.clone()).filter(|c| !c.is_empty());
        request.overwrite_tags = options.overwrite_tags;
        request.overwrite_custom_metadata = options.overwrite_custom_metadata;

        let uploaded = client.upload(request).await.inspect_err(|e| {
            error!(error = %e, "Error uploading file to ImageKit");
        })?;
        let details = client
            .get_file_details(&uploaded.file_id)
            .await
            .inspect_err(|e| error!(error = %e, "Error fetching uploaded file details"))?;

        info!(file_id = %details.file_id, "File uploaded to ImageKit");
        file.provider = Some(IMAGEKIT_PROVIDER.to_string());
        file.url = Some(details.url);
        file.provider_metadata = Some(json!({ "fileId": details.file_id }));
        Ok(())
    }

    pub async fn upload_stream(&self, file: &mut UploadFile) -> Result<(), ServiceError> {
        self.upload(file).await
    }

    /// Delete the CDN copy. Files without an ImageKit id and files already
    /// gone from ImageKit are treated as deleted.
    #[instrument(skip(self, file), fields(name = %file.name))]
    pub async fn delete(&self, file: &UploadFile) -> Result<(), ServiceError> {
        let Some(file_id) = file.file_id() else {
            debug!("No ImageKit file id, nothing to delete");
            return Ok(());
        };
        let (_, client) = self.resolve().await?;

        match client.get_file_details(file_id).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                warn!(file_id, "File no longer exists on ImageKit");
                return Ok(());
            }
            Err(e) => {
                error!(file_id, error = %e, "Error looking up file before delete");
                return Err(e.into());
            }
        }

        match client.delete_file(file_id).await {
            Ok(()) => {
                info!(file_id, "File deleted from ImageKit");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                warn!(file_id, "File vanished from ImageKit before delete");
                Ok(())
            }
            Err(e) => {
                error!(file_id, error = %e, "Error deleting file from ImageKit");
                Err(e.into())
            }
        }
    }

    pub async fn is_private(&self) -> Result<bool, ServiceError> {
        let settings = self.settings.get_settings().await?;
        Ok(settings.upload_options.is_private_file)
    }

    /// A delivery URL for the file, signed when uploads are private. Falls
    /// back to the stored URL if one cannot be built.
    #[instrument(skip(self, file), fields(name = %file.name))]
    pub async fn get_signed_url(&self, file: &UploadFile) -> Result<Option<String>, ServiceError> {
        let (settings, client) = self.resolve().await?;
        let Some(url) = file.url.as_deref() else {
            return Ok(None);
        };

        let options = UrlOptions::src(url)
            .signed(settings.upload_options.is_private_file)
            .expire_seconds(settings.expire_seconds());
        match client.url(&options) {
            Ok(signed) => Ok(Some(signed)),
            Err(e) => {
                error!(file_id = ?file.file_id(), error = %e, "Error generating signed URL");
                Ok(file.url.clone())
            }
        }
    }
}

/// The host's storage backend selector: ImageKit while uploads are enabled,
/// the native provider otherwise. Settings are resolved on every call.
pub struct ProviderSelector {
    native: Arc<dyn UploadProvider>,
    imagekit: ImageKitUploadService,
    settings: Arc<SettingsService>,
}

impl ProviderSelector {
    pub fn new(native: Arc<dyn UploadProvider>, settings: Arc<SettingsService>) -> Self {
        Self {
            native,
            imagekit: ImageKitUploadService::new(settings.clone()),
            settings,
        }
    }

    async fn use_imagekit(&self) -> Result<bool, StorageError> {
        let settings = self.settings.get_settings().await.map_err(StorageError::from)?;
        Ok(settings.upload_enabled)
    }
}

#[async_trait]
impl UploadProvider for ProviderSelector {
    async fn upload(&self, file: &mut UploadFile) -> Result<(), StorageError> {
        if self.use_imagekit().await? {
            Ok(self.imagekit.upload(file).await?)
        } else {
            self.native.upload(file).await
        }
    }

    async fn upload_stream(&self, file: &mut UploadFile) -> Result<(), StorageError> {
        if self.use_imagekit().await? {
            Ok(self.imagekit.upload_stream(file).await?)
        } else {
            self.native.upload_stream(file).await
        }
    }

    async fn delete(&self, file: &UploadFile) -> Result<(), StorageError> {
        if self.use_imagekit().await? {
            Ok(self.imagekit.delete(file).await?)
        } else {
            self.native.delete(file).await
        }
    }

    async fn is_private(&self) -> Result<bool, StorageError> {
        if self.use_imagekit().await? {
            Ok(self.imagekit.is_private().await?)
        } else {
            self.native.is_private().await
        }
    }

    async fn get_signed_url(&self, file: &UploadFile) -> Result<Option<String>, StorageError> {
        if self.use_imagekit().await? {
            Ok(self.imagekit.get_signed_url(file).await?)
        } else {
            self.native.get_signed_url(file).await
        }
    }
}
