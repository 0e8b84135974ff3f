pub mod file;
pub mod plugin_storage;
