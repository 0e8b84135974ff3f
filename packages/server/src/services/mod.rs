mod error;

pub mod client;
pub mod matcher;
pub mod settings;
pub mod upload;
pub mod webhook;

pub use client::ClientAccessor;
pub use error::ServiceError;
pub use settings::SettingsService;
pub use upload::{ImageKitUploadService, ProviderSelector};
pub use webhook::WebhookService;
