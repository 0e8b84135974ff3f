//! Thin binding to the ImageKit media CDN.
//!
//! [`MediaCdn`] is the SDK surface the rest of the workspace talks to;
//! [`ImageKit`] implements it over the public REST API.

mod client;
mod error;
mod types;
pub mod url;

pub use client::{ImageKit, MediaCdn};
pub use error::ImageKitError;
pub use types::{
    Credentials, FileDetails, Transformation, UploadBody, UploadRequest, UploadResponse,
    UrlOptions, UrlSource,
};
