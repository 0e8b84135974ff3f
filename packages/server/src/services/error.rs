use common::media::RepositoryError;
use common::settings::FieldError;
use common::storage::StorageError;
use common::store::StoreError;
use imagekit::ImageKitError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("ImageKit client is not configured, missing: {}", .missing.join(", "))]
    Configuration { missing: Vec<&'static str> },

    #[error("invalid settings ({} field errors)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("ImageKit request failed: {0}")]
    Upstream(#[from] ImageKitError),

    #[error("file has neither a buffer nor a stream")]
    MissingFileData,

    #[error("invalid webhook item: {0}")]
    InvalidItem(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// The upload forwarder speaks the host provider contract, so its failures
/// surface as storage errors. A CDN 404 reaching this point is an upstream
/// failure; the delete path already absorbs missing files.
impl From<ServiceError> for StorageError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Storage(e) => e,
            ServiceError::MissingFileData => StorageError::MissingData,
            ServiceError::Configuration { .. } => StorageError::Configuration(err.to_string()),
            other => StorageError::Upstream(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cdn_not_found_is_an_upstream_failure() {
        let err = StorageError::from(ServiceError::Upstream(ImageKitError::NotFound("f1".into())));
        assert!(matches!(err, StorageError::Upstream(msg) if msg.contains("f1")));
    }

    #[test]
    fn missing_data_and_configuration_keep_their_kind() {
        assert!(matches!(
            StorageError::from(ServiceError::MissingFileData),
            StorageError::MissingData
        ));
        assert!(matches!(
            StorageError::from(ServiceError::Configuration { missing: vec!["publicKey"] }),
            StorageError::Configuration(msg) if msg.contains("publicKey")
        ));
    }
}
