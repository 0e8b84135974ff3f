use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncRead;

use super::error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send + Sync>;

/// File contents handed to a provider.
pub enum FileData {
    Buffer(Vec<u8>),
    Stream(BoxReader),
}

impl fmt::Debug for FileData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffer(bytes) => write!(f, "Buffer({} bytes)", bytes.len()),
            Self::Stream(_) => write!(f, "Stream"),
        }
    }
}

/// The host's in-flight file object.
///
/// Providers read `data` and fill in `url`, `provider` and
/// `provider_metadata` on success.
#[derive(Debug, Default)]
pub struct UploadFile {
    pub name: String,
    /// Storage key without extension, e.g. `photo_3f2a9c1b7e`.
    pub hash: String,
    /// Extension including the dot, e.g. `.jpg`.
    pub ext: String,
    pub mime: String,
    /// Size in kilobytes.
    pub size: f64,
    /// Media-library folder path, e.g. `/2/7`.
    pub folder_path: Option<String>,
    pub data: Option<FileData>,
    pub url: Option<String>,
    pub provider: Option<String>,
    pub provider_metadata: Option<Value>,
}

impl UploadFile {
    /// Stored object name: hash plus extension.
    pub fn file_name(&self) -> String {
        format!("{}{}", self.hash, self.ext)
    }

    /// CDN file id recorded by a previous upload, if any.
    pub fn file_id(&self) -> Option<&str> {
        self.provider_metadata
            .as_ref()
            .and_then(|m| m.get("fileId"))
            .and_then(Value::as_str)
    }
}

/// The host's storage provider method set.
#[async_trait]
pub trait UploadProvider: Send + Sync {
    /// Store a file whose contents are held in memory.
    async fn upload(&self, file: &mut UploadFile) -> Result<(), StorageError>;

    /// Store a file whose contents arrive as a stream.
    async fn upload_stream(&self, file: &mut UploadFile) -> Result<(), StorageError> {
        self.upload(file).await
    }

    /// Remove a previously stored file. Removing a missing file succeeds.
    async fn delete(&self, file: &UploadFile) -> Result<(), StorageError>;

    /// Whether files from this provider need signed URLs.
    async fn is_private(&self) -> Result<bool, StorageError> {
        Ok(false)
    }

    /// URL to hand out for a private file.
    async fn get_signed_url(&self, file: &UploadFile) -> Result<Option<String>, StorageError> {
        Ok(file.url.clone())
    }
}
