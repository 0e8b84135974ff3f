use std::sync::Arc;

use common::event::MediaCreated;
use common::hook::HookRegistry;
use common::media::{MediaFile, MediaRepository, NewMediaFile, RepositoryError, empty_formats};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, error, info, instrument};

use super::ServiceError;
use super::matcher::{BaseNameMatcher, FormatMatcher, split_format};
use super::upload::IMAGEKIT_PROVIDER;
use crate::utils::filename::{document_id, import_hash, split_ext};

/// The only event type that imports files.
pub const INSERT_EVENT: &str = "INSERT";

/// One file as ImageKit describes it in a webhook.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageKitFile {
    pub file_id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub mime: Option<String>,
    #[serde(default)]
    pub width: Option<i32>,
    #[serde(default)]
    pub height: Option<i32>,
    /// Size in bytes.
    #[serde(default)]
    pub size: f64,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default, rename = "AITags")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub ai_tags: Option<Vec<Value>>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub custom_metadata: Option<Map<String, Value>>,
    #[serde(default)]
    pub is_private_file: bool,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub has_alpha: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl ImageKitFile {
    /// `fileId` plus whichever of tags, AI tags and custom metadata are
    /// non-empty.
    fn provider_metadata(&self) -> Value {
        let mut metadata = Map::new();
        metadata.insert("fileId".into(), json!(self.file_id));
        if let Some(tags) = self.tags.as_ref().filter(|t| !t.is_empty()) {
            metadata.insert("tags".into(), json!(tags));
        }
        if let Some(tags) = self.ai_tags.as_ref().filter(|t| !t.is_empty()) {
            metadata.insert("aiTags".into(), json!(tags));
        }
        if let Some(custom) = self.custom_metadata.as_ref().filter(|m| !m.is_empty()) {
            metadata.insert("customMetadata".into(), Value::Object(custom.clone()));
        }
        Value::Object(metadata)
    }
}

/// Webhook body. Items stay raw so one malformed item cannot reject the
/// whole batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub event_type: String,
    pub data: Vec<Value>,
}

enum Imported {
    Main(MediaFile),
    Variant {
        format: String,
        original_name: String,
        entry: Value,
    },
}

/// Imports files uploaded directly to ImageKit into the media library.
pub struct WebhookService {
    media: Arc<dyn MediaRepository>,
    hooks: Arc<HookRegistry>,
    formats: Vec<String>,
    matcher: Arc<dyn FormatMatcher>,
}

impl WebhookService {
    /// `formats` are the names a variant file may be prefixed with.
    pub fn new(media: Arc<dyn MediaRepository>, hooks: Arc<HookRegistry>, formats: Vec<String>) -> Self {
        Self {
            media,
            hooks,
            formats,
            matcher: Arc::new(BaseNameMatcher),
        }
    }

    pub fn with_matcher(mut self, matcher: Arc<dyn FormatMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    /// Import every item of an `INSERT` event and return the main files
    /// created, with their variants attached. Other events are ignored.
    #[instrument(skip(self, payload), fields(event_type = %payload.event_type, items = payload.data.len()))]
    pub async fn process_webhook(&self, payload: &WebhookPayload) -> Vec<MediaFile> {
        if payload.event_type != INSERT_EVENT {
            info!("Ignoring webhook event type");
            return Vec::new();
        }

        let results = join_all(payload.data.iter().map(|item| self.import_item(item))).await;

        let mut mains = Vec::new();
        let mut variants = Vec::new();
        for result in results {
            match result {
                Ok(Imported::Main(file)) => mains.push(file),
                Ok(Imported::Variant {
                    format,
                    original_name,
                    entry,
                }) => variants.push((format, original_name, entry)),
                Err(e) => error!(error = %e, "Error importing webhook item"),
            }
        }
        info!(
            main_files = mains.len(),
            format_files = variants.len(),
            "Imported webhook items"
        );

        for (format, original_name, entry) in variants {
            let Some(main) = mains
                .iter_mut()
                .find(|m| self.matcher.matches(&format, &original_name, &m.name))
            else {
                debug!(format = %format, name = %original_name, "No main file for variant");
                continue;
            };

            match self.associate(main.id, &format, entry).await {
                Ok(updated) => {
                    info!(format = %format, file = %updated.name, "Associated format with file");
                    *main = updated;
                }
                Err(e) => error!(format = %format, error = %e, "Error associating format with main file"),
            }
        }

        mains
    }

    async fn import_item(&self, item: &Value) -> Result<Imported, ServiceError> {
        let file: ImageKitFile =
            serde_json::from_value(item.clone()).map_err(|e| ServiceError::InvalidItem(e.to_string()))?;

        let (_, ext) = split_ext(&file.name);
        let hash = import_hash(&file.name, &file.file_id);
        let mime = file.mime.clone().unwrap_or_else(|| {
            mime_guess::from_path(&file.name)
                .first_or_octet_stream()
                .to_string()
        });

        if let Some((format, original_name)) = split_format(&file.name, &self.formats) {
            info!(name = %file.name, "Webhook item is a format variant");
            return Ok(Imported::Variant {
                format: format.to_string(),
                original_name: original_name.to_string(),
                entry: json!({
                    "name": file.name,
                    "hash": hash,
                    "ext": ext,
                    "mime": mime,
                    "path": null,
                    "width": file.width,
                    "height": file.height,
                    "size": file.size / 1024.0,
                    "sizeInBytes": file.size,
                    "url": file.url,
                    "provider_metadata": file.provider_metadata(),
                }),
            });
        }

        let created = self
            .media
            .create(NewMediaFile {
                document_id: Some(document_id()),
                name: file.name.clone(),
                alternative_text: None,
                caption: None,
                width: file.width,
                height: file.height,
                formats: empty_formats(),
                hash,
                ext: Some(ext.to_string()).filter(|e| !e.is_empty()),
                mime,
                size: file.size / 1024.0,
                url: file.url.clone(),
                preview_url: file.thumbnail.clone().filter(|t| !t.is_empty()),
                provider: IMAGEKIT_PROVIDER.to_string(),
                provider_metadata: Some(file.provider_metadata()),
                folder_path: "/".to_string(),
                is_url_signed: false,
            })
            .await?;

        self.hooks
            .emit(&MediaCreated {
                media: created.clone(),
            })
            .await;

        info!(id = created.id, name = %created.name, "Created file entry");
        Ok(Imported::Main(created))
    }

    async fn associate(&self, id: i32, format: &str, entry: Value) -> Result<MediaFile, ServiceError> {
        let file = self
            .media
            .find(id)
            .await?
            .ok_or(RepositoryError::NotFound(id))?;

        let mut formats = match file.formats {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        formats.insert(format.to_string(), entry);
        Ok(self.media.update_formats(id, Value::Object(formats)).await?)
    }
}
