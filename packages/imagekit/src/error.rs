use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageKitError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("ImageKit API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to sign URL: {0}")]
    Signing(String),

    #[error("unexpected response: {0}")]
    InvalidResponse(String),

    #[error("invalid URL options: {0}")]
    InvalidUrlOptions(String),
}

impl ImageKitError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
