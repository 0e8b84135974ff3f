/// Plugin identifier, also the persisted settings scope.
pub const PLUGIN_ID: &str = "imagekit";

pub mod settings {
    pub const READ: &str = "settings.read";
    pub const CHANGE: &str = "settings.change";
}

pub mod media_library {
    pub const READ: &str = "media-library.read";
}

/// Host upload plugin actions guarding the media routes.
pub mod upload {
    pub const READ: &str = "plugin::upload.read";
    pub const CREATE: &str = "plugin::upload.assets.create";
    pub const DELETE: &str = "plugin::upload.assets.delete";
}

/// Render a plugin-local action uid into its fully-qualified form,
/// e.g. `settings.read` -> `plugin::imagekit.settings.read`.
pub fn render(uid: &str) -> String {
    format!("plugin::{PLUGIN_ID}.{uid}")
}
