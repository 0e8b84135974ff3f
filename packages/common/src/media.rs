use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::RwLock;

/// A media-library file row as the host exposes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    pub id: i32,
    pub document_id: Option<String>,
    #[schema(example = "photo.jpg")]
    pub name: String,
    pub alternative_text: Option<String>,
    pub caption: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    /// Size variants keyed by format name (`thumbnail`, `small`, ...).
    #[schema(value_type = Object)]
    pub formats: Value,
    #[schema(example = "photo_a1b2c3d4")]
    pub hash: String,
    #[schema(example = ".jpg")]
    pub ext: Option<String>,
    #[schema(example = "image/jpeg")]
    pub mime: String,
    /// Size in kilobytes.
    pub size: f64,
    #[schema(example = "/uploads/photo_a1b2c3d4.jpg")]
    pub url: String,
    pub preview_url: Option<String>,
    #[schema(example = "imagekit")]
    pub provider: String,
    #[serde(rename = "provider_metadata")]
    #[schema(value_type = Option<Object>)]
    pub provider_metadata: Option<Value>,
    pub folder_path: String,
    pub is_url_signed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Fields supplied when creating a file row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMediaFile {
    pub document_id: Option<String>,
    pub name: String,
    pub alternative_text: Option<String>,
    pub caption: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub formats: Value,
    pub hash: String,
    pub ext: Option<String>,
    pub mime: String,
    pub size: f64,
    pub url: String,
    pub preview_url: Option<String>,
    pub provider: String,
    #[serde(rename = "provider_metadata")]
    pub provider_metadata: Option<Value>,
    pub folder_path: String,
    pub is_url_signed: bool,
}

impl NewMediaFile {
    /// Materialize the row with the given id; created, updated and published
    /// timestamps are all `now`.
    pub fn into_media_file(self, id: i32, now: DateTime<Utc>) -> MediaFile {
        MediaFile {
            id,
            document_id: self.document_id,
            name: self.name,
            alternative_text: self.alternative_text,
            caption: self.caption,
            width: self.width,
            height: self.height,
            formats: self.formats,
            hash: self.hash,
            ext: self.ext,
            mime: self.mime,
            size: self.size,
            url: self.url,
            preview_url: self.preview_url,
            provider: self.provider,
            provider_metadata: self.provider_metadata,
            folder_path: self.folder_path,
            is_url_signed: self.is_url_signed,
            created_at: now,
            updated_at: now,
            published_at: Some(now),
        }
    }
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("file with id {0} not found")]
    NotFound(i32),
    #[error("repository backend error: {0}")]
    Backend(String),
}

/// The host's database access for the media file entity.
#[async_trait]
pub trait MediaRepository: Send + Sync {
    async fn create(&self, file: NewMediaFile) -> Result<MediaFile, RepositoryError>;

    async fn find(&self, id: i32) -> Result<Option<MediaFile>, RepositoryError>;

    async fn list(&self) -> Result<Vec<MediaFile>, RepositoryError>;

    /// Replace the `formats` map of an existing row.
    async fn update_formats(&self, id: i32, formats: Value) -> Result<MediaFile, RepositoryError>;

    /// Returns `true` if a row was removed.
    async fn delete(&self, id: i32) -> Result<bool, RepositoryError>;
}

/// Process-local repository, used when no database is configured.
pub struct MemoryMediaRepository {
    files: RwLock<BTreeMap<i32, MediaFile>>,
    next_id: AtomicI32,
}

impl MemoryMediaRepository {
    pub fn new() -> Self {
        Self {
            files: RwLock::new(BTreeMap::new()),
            next_id: AtomicI32::new(1),
        }
    }
}

impl Default for MemoryMediaRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaRepository for MemoryMediaRepository {
    async fn create(&self, file: NewMediaFile) -> Result<MediaFile, RepositoryError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let file = file.into_media_file(id, Utc::now());
        self.files.write().await.insert(id, file.clone());
        Ok(file)
    }

    async fn find(&self, id: i32) -> Result<Option<MediaFile>, RepositoryError> {
        Ok(self.files.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<MediaFile>, RepositoryError> {
        Ok(self.files.read().await.values().cloned().collect())
    }

    async fn update_formats(&self, id: i32, formats: Value) -> Result<MediaFile, RepositoryError> {
        let mut files = self.files.write().await;
        let file = files.get_mut(&id).ok_or(RepositoryError::NotFound(id))?;
        file.formats = formats;
        file.updated_at = Utc::now();
        Ok(file.clone())
    }

    async fn delete(&self, id: i32) -> Result<bool, RepositoryError> {
        Ok(self.files.write().await.remove(&id).is_some())
    }
}

/// An empty `formats` value.
pub fn empty_formats() -> Value {
    Value::Object(Map::new())
}
