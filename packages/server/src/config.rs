use std::collections::BTreeMap;
use std::path::PathBuf;

use common::settings::Settings;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    /// Absent means the process-local stores are used.
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root of the locally served files; uploads land in `{public_dir}/uploads`.
    pub public_dir: PathBuf,
    /// Maximum upload size in bytes.
    pub max_upload_size: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    /// Responsive format names and their widths; variant files are named
    /// `{format}_{original}`.
    pub breakpoints: BTreeMap<String, u32>,
}

impl UploadConfig {
    /// Every name a variant file may be prefixed with.
    pub fn format_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.breakpoints.keys().cloned().collect();
        names.push("thumbnail".to_string());
        names
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
    /// Static `[imagekit]` section, the file-config settings layer.
    #[serde(default)]
    pub imagekit: Settings,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 1337)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("storage.public_dir", "./public")?
            .set_default("storage.max_upload_size", 200 * 1024 * 1024)?
            .set_default("upload.breakpoints.large", 1000)?
            .set_default("upload.breakpoints.medium", 750)?
            .set_default("upload.breakpoints.small", 500)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., IMAGEKIT_PLUGIN__AUTH__JWT_SECRET)
            .add_source(
                Environment::with_prefix("IMAGEKIT_PLUGIN")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .with_list_parse_key("imagekit.upload_options.tags")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
