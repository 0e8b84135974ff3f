mod error;
mod traits;

pub mod local;

pub use error::StorageError;
pub use local::LocalUploadProvider;
pub use traits::{BoxReader, FileData, UploadFile, UploadProvider};
