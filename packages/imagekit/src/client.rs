use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, instrument};

use crate::error::ImageKitError;
use crate::types::{Credentials, FileDetails, UploadBody, UploadRequest, UploadResponse, UrlOptions};
use crate::url::{build_url, now_unix};

const API_BASE: &str = "https://api.imagekit.io/v1";
const UPLOAD_BASE: &str = "https://upload.imagekit.io/api/v1";

/// The CDN operations the plugin relies on.
#[async_trait]
pub trait MediaCdn: Send + Sync {
    async fn upload(&self, request: UploadRequest) -> Result<UploadResponse, ImageKitError>;

    async fn get_file_details(&self, file_id: &str) -> Result<FileDetails, ImageKitError>;

    async fn delete_file(&self, file_id: &str) -> Result<(), ImageKitError>;

    /// Build a delivery URL. Pure, no network access.
    fn url(&self, options: &UrlOptions) -> Result<String, ImageKitError>;
}

/// REST client for one ImageKit account.
#[derive(Debug, Clone)]
pub struct ImageKit {
    http: Client,
    credentials: Credentials,
    api_base: String,
    upload_base: String,
}

impl ImageKit {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            http: Client::new(),
            credentials,
            api_base: API_BASE.to_string(),
            upload_base: UPLOAD_BASE.to_string(),
        }
    }

    /// Point the client at different API hosts.
    pub fn with_base_urls(mut self, api_base: impl Into<String>, upload_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self.upload_base = upload_base.into();
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// [`MediaCdn::url`] against a fixed clock.
    pub fn url_at(&self, options: &UrlOptions, now: u64) -> Result<String, ImageKitError> {
        build_url(&self.credentials, options, now)
    }

    async fn check(response: Response, file_id: &str) -> Result<Response, ImageKitError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ImageKitError::NotFound(file_id.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .unwrap_or(body);
        error!(status = %status, message = %message, "ImageKit API returned error");
        Err(ImageKitError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ImageKitError> {
        response
            .json()
            .await
            .map_err(|e| ImageKitError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl MediaCdn for ImageKit {
    #[instrument(skip(self, request), fields(file_name = %request.file_name))]
    async fn upload(&self, request: UploadRequest) -> Result<UploadResponse, ImageKitError> {
        let part = match request.file {
            UploadBody::Bytes(bytes) => Part::bytes(bytes),
            UploadBody::Stream(reader) => Part::stream(Body::wrap_stream(ReaderStream::new(reader))),
        }
        .file_name(request.file_name.clone());
        let part = match &request.mime {
            Some(mime) => part.mime_str(mime)?,
            None => part,
        };

        let mut form = Form::new()
            .part("file", part)
            .text("fileName", request.file_name.clone())
            .text("useUniqueFileName", request.use_unique_file_name.to_string())
            .text("isPrivateFile", request.is_private_file.to_string())
            .text("overwriteTags", request.overwrite_tags.to_string())
            .text("overwriteCustomMetadata", request.overwrite_custom_metadata.to_string());
        if !request.tags.is_empty() {
            form = form.text("tags", request.tags.join(","));
        }
        if let Some(folder) = request.folder {
            form = form.text("folder", folder);
        }
        if let Some(checks) = request.checks {
            form = form.text("checks", checks);
        }

        debug!("Uploading file to ImageKit");
        let response = self
            .http
            .post(format!("{}/files/upload", self.upload_base))
            .basic_auth(&self.credentials.private_key, Some(""))
            .multipart(form)
            .send()
            .await?;
        let response = Self::check(response, &request.file_name).await?;
        Self::parse(response).await
    }

    #[instrument(skip(self))]
    async fn get_file_details(&self, file_id: &str) -> Result<FileDetails, ImageKitError> {
        let response = self
            .http
            .get(format!("{}/files/{file_id}/details", self.api_base))
            .basic_auth(&self.credentials.private_key, Some(""))
            .send()
            .await?;
        let response = Self::check(response, file_id).await?;
        Self::parse(response).await
    }

    #[instrument(skip(self))]
    async fn delete_file(&self, file_id: &str) -> Result<(), ImageKitError> {
        let response = self
            .http
            .delete(format!("{}/files/{file_id}", self.api_base))
            .basic_auth(&self.credentials.private_key, Some(""))
            .send()
            .await?;
        Self::check(response, file_id).await?;
        Ok(())
    }

    fn url(&self, options: &UrlOptions) -> Result<String, ImageKitError> {
        self.url_at(options, now_unix())
    }
}
