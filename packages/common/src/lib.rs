pub mod event;
pub mod hook;
pub mod media;
pub mod permissions;
pub mod settings;
pub mod storage;
pub mod store;

pub use media::{MediaFile, MediaRepository, NewMediaFile};
pub use settings::{FieldError, Settings, UploadOptions};
pub use store::KeyValueStore;
