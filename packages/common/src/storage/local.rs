use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::error::StorageError;
use super::traits::{BoxReader, FileData, UploadFile, UploadProvider};

/// Provider name recorded on files stored by [`LocalUploadProvider`].
pub const LOCAL_PROVIDER: &str = "local";

/// The host's native provider: files land under `{public_dir}/uploads/` and
/// are served from `/uploads/{hash}{ext}`.
pub struct LocalUploadProvider {
    public_dir: PathBuf,
    max_size: u64,
}

impl LocalUploadProvider {
    /// Create a new local provider, creating the upload directory.
    pub async fn new(public_dir: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(public_dir.join("uploads")).await?;
        fs::create_dir_all(public_dir.join(".tmp")).await?;
        Ok(Self {
            public_dir,
            max_size,
        })
    }

    fn file_path(&self, file_name: &str) -> PathBuf {
        self.public_dir.join("uploads").join(file_name)
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.public_dir
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    async fn write_buffer(&self, data: &[u8], target: &PathBuf) -> Result<(), StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        self.commit(&temp_path, target).await
    }

    async fn write_stream(&self, mut reader: BoxReader, target: &PathBuf) -> Result<(), StorageError> {
        let temp_path = self.temp_path();
        let mut total_bytes: u64 = 0;

        let mut buf = vec![0u8; 64 * 1024]; // 64KB read buffer
        let mut temp_file = fs::File::create(&temp_path).await?;

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }

            total_bytes += n as u64;
            if total_bytes > self.max_size {
                drop(temp_file);
                let _ = fs::remove_file(&temp_path).await;
                return Err(StorageError::SizeLimitExceeded {
                    actual: total_bytes,
                    limit: self.max_size,
                });
            }

            temp_file.write_all(&buf[..n]).await?;
        }

        temp_file.flush().await?;
        drop(temp_file);

        self.commit(&temp_path, target).await
    }

    async fn commit(&self, temp_path: &PathBuf, target: &PathBuf) -> Result<(), StorageError> {
        if let Err(e) = fs::rename(temp_path, target).await {
            let _ = fs::remove_file(temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl UploadProvider for LocalUploadProvider {
    async fn upload(&self, file: &mut UploadFile) -> Result<(), StorageError> {
        let file_name = file.file_name();
        let target = self.file_path(&file_name);

        match file.data.take() {
            Some(FileData::Buffer(bytes)) => self.write_buffer(&bytes, &target).await?,
            Some(FileData::Stream(reader)) => self.write_stream(reader, &target).await?,
            None => return Err(StorageError::MissingData),
        }

        file.url = Some(format!("/uploads/{file_name}"));
        file.provider = Some(LOCAL_PROVIDER.to_string());
        Ok(())
    }

    async fn delete(&self, file: &UploadFile) -> Result<(), StorageError> {
        match fs::remove_file(self.file_path(&file.file_name())).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
