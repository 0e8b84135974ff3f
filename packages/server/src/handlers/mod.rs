pub mod media;
pub mod settings;
pub mod webhook;
