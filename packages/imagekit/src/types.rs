use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::AsyncRead;

/// Account credentials plus the delivery endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub public_key: String,
    pub private_key: String,
    pub url_endpoint: String,
}

/// A single transformation step, rendered as `w-300,h-200`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transformation {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Transformation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.width.is_none() && self.height.is_none()
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(2);
        if let Some(w) = self.width {
            parts.push(format!("w-{w}"));
        }
        if let Some(h) = self.height {
            parts.push(format!("h-{h}"));
        }
        f.write_str(&parts.join(","))
    }
}

/// Where the image lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlSource {
    /// Path relative to the configured endpoint, e.g. `/uploads/a.jpg`.
    Path(String),
    /// A complete URL, usually already under the endpoint.
    Src(String),
}

/// Options for [`crate::MediaCdn::url`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlOptions {
    pub source: UrlSource,
    pub transformation: Vec<Transformation>,
    pub signed: bool,
    pub expire_seconds: Option<u64>,
}

impl UrlOptions {
    pub fn path(path: impl Into<String>) -> Self {
        Self::new(UrlSource::Path(path.into()))
    }

    pub fn src(src: impl Into<String>) -> Self {
        Self::new(UrlSource::Src(src.into()))
    }

    fn new(source: UrlSource) -> Self {
        Self {
            source,
            transformation: Vec::new(),
            signed: false,
            expire_seconds: None,
        }
    }

    pub fn with_transformation(mut self, transformation: Transformation) -> Self {
        if !transformation.is_empty() {
            self.transformation.push(transformation);
        }
        self
    }

    pub fn signed(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }

    pub fn expire_seconds(mut self, expire_seconds: Option<u64>) -> Self {
        self.expire_seconds = expire_seconds;
        self
    }
}

/// File contents for an upload.
pub enum UploadBody {
    Bytes(Vec<u8>),
    Stream(Box<dyn AsyncRead + Unpin + Send + Sync>),
}

impl fmt::Debug for UploadBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            Self::Stream(_) => write!(f, "Stream"),
        }
    }
}

/// Parameters of the upload API call.
#[derive(Debug)]
pub struct UploadRequest {
    pub file: UploadBody,
    pub file_name: String,
    pub mime: Option<String>,
    pub use_unique_file_name: bool,
    pub is_private_file: bool,
    pub tags: Vec<String>,
    pub folder: Option<String>,
    pub checks: Option<String>,
    pub overwrite_tags: bool,
    pub overwrite_custom_metadata: bool,
}

impl UploadRequest {
    pub fn new(file: UploadBody, file_name: impl Into<String>) -> Self {
        Self {
            file,
            file_name: file_name.into(),
            mime: None,
            use_unique_file_name: true,
            is_private_file: false,
            tags: Vec::new(),
            folder: None,
            checks: None,
            overwrite_tags: false,
            overwrite_custom_metadata: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadResponse {
    pub file_id: String,
    pub name: String,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub file_path: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileDetails {
    pub file_id: String,
    pub name: String,
    pub url: String,
    pub thumbnail: Option<String>,
    pub file_path: Option<String>,
    pub file_type: Option<String>,
    pub mime: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub size: Option<u64>,
    pub tags: Option<Vec<String>>,
    pub is_private_file: bool,
    pub custom_metadata: Option<Value>,
}
