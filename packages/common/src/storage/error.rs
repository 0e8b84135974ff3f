use std::fmt;

/// Errors that can occur in an upload provider.
#[derive(Debug)]
pub enum StorageError {
    /// The requested file was not found.
    NotFound(String),
    /// An I/O error occurred.
    Io(std::io::Error),
    /// The incoming file carries neither a buffer nor a stream.
    MissingData,
    /// The file exceeds the configured size limit.
    SizeLimitExceeded { actual: u64, limit: u64 },
    /// The provider is not configured well enough to serve the call.
    Configuration(String),
    /// A remote storage backend rejected the call.
    Upstream(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(name) => write!(f, "file not found: {name}"),
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::MissingData => write!(f, "missing file buffer or stream"),
            Self::SizeLimitExceeded { actual, limit } => {
                write!(f, "file exceeds size limit ({actual} > {limit} bytes)")
            }
            Self::Configuration(msg) => write!(f, "storage provider misconfigured: {msg}"),
            Self::Upstream(msg) => write!(f, "remote storage error: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
