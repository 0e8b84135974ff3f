use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Options forwarded to every CDN upload call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadOptions {
    pub tags: Vec<String>,
    pub folder: String,
    #[serde(alias = "overwrite_tags")]
    pub overwrite_tags: bool,
    #[serde(alias = "overwrite_custom_metadata")]
    pub overwrite_custom_metadata: bool,
    pub checks: String,
    #[serde(alias = "is_private_file")]
    pub is_private_file: bool,
}

/// The plugin's single configuration aggregate.
///
/// Deserialization is lenient: every missing (or `null`) field falls back to
/// its default, so a partial record always completes into a full value.
/// snake_case aliases let the static config file (whose keys the loader
/// lowercases) deserialize into the same type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Master switch for response URL rewriting.
    pub enabled: bool,
    #[schema(example = "public_xxxxxxxxxxxx")]
    #[serde(alias = "public_key")]
    pub public_key: String,
    #[schema(example = "private_xxxxxxxxxxxx")]
    #[serde(alias = "private_key")]
    pub private_key: String,
    #[schema(example = "https://ik.imagekit.io/your_id")]
    #[serde(alias = "url_endpoint")]
    pub url_endpoint: String,
    #[serde(alias = "use_signed_urls")]
    pub use_signed_urls: bool,
    /// Signature validity in seconds, `0` means no expiry.
    pub expiry: u64,
    #[serde(alias = "upload_enabled")]
    pub upload_enabled: bool,
    #[serde(alias = "upload_options")]
    pub upload_options: UploadOptions,
    #[serde(alias = "use_transform_urls")]
    pub use_transform_urls: bool,
}

impl Settings {
    /// Parse a persisted or submitted record, merging it over the defaults.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(strip_nulls(value.clone()))
    }

    /// Names of the credential fields a CDN client needs but this value lacks.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.public_key.is_empty() {
            missing.push("publicKey");
        }
        if self.private_key.is_empty() {
            missing.push("privateKey");
        }
        if self.url_endpoint.is_empty() {
            missing.push("urlEndpoint");
        }
        missing
    }

    /// A settings layer is usable when all credentials and the endpoint are set.
    pub fn is_usable(&self) -> bool {
        self.missing_credentials().is_empty()
    }

    /// Expiry to request on signed URLs; absent when signatures never expire.
    pub fn expire_seconds(&self) -> Option<u64> {
        (self.expiry > 0).then_some(self.expiry)
    }
}

fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        other => other,
    }
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FieldError {
    /// Dotted path of the offending field, e.g. `uploadOptions.tags`.
    #[schema(example = "publicKey")]
    pub path: String,
    #[schema(example = "Public key must start with \"public_\"")]
    pub message: String,
}

impl FieldError {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Validate a submitted settings object.
///
/// Checks shape first (types of every known field), then formats (key
/// prefixes, endpoint URL), then the cross-field rules. Returns the parsed
/// settings, with the credentials and endpoint trimmed, only when the whole
/// object passes.
pub fn validate(payload: &Value) -> Result<Settings, Vec<FieldError>> {
    let Some(obj) = payload.as_object() else {
        return Err(vec![FieldError::new("", "Settings must be a JSON object")]);
    };

    let mut errors = Vec::new();

    let enabled = required_bool(obj, "enabled", &mut errors);
    let upload_enabled = required_bool(obj, "uploadEnabled", &mut errors);
    optional_bool(obj, "useSignedUrls", "", &mut errors);
    optional_bool(obj, "useTransformUrls", "", &mut errors);

    let public_key = optional_string(obj, "publicKey", "", &mut errors);
    let private_key = optional_string(obj, "privateKey", "", &mut errors);
    let url_endpoint = optional_string(obj, "urlEndpoint", "", &mut errors);

    if let Some(expiry) = obj.get("expiry").filter(|v| !v.is_null()) {
        if expiry.as_u64().is_none() {
            errors.push(FieldError::new(
                "expiry",
                "Expiry must be a non-negative whole number of seconds",
            ));
        }
    }

    if let Some(options) = obj.get("uploadOptions").filter(|v| !v.is_null()) {
        match options.as_object() {
            Some(options) => validate_upload_options(options, &mut errors),
            None => errors.push(FieldError::new(
                "uploadOptions",
                "Upload options must be an object",
            )),
        }
    }

    if let Some(key) = public_key.filter(|k| !k.is_empty()) {
        if !has_prefixed_value(key, "public_") {
            errors.push(FieldError::new(
                "publicKey",
                "Public key must start with \"public_\"",
            ));
        }
    }
    if let Some(key) = private_key.filter(|k| !k.is_empty()) {
        if !has_prefixed_value(key, "private_") {
            errors.push(FieldError::new(
                "privateKey",
                "Private key must start with \"private_\"",
            ));
        }
    }
    if let Some(endpoint) = url_endpoint.filter(|e| !e.is_empty()) {
        if !is_http_url(endpoint) {
            errors.push(FieldError::new(
                "urlEndpoint",
                "URL endpoint must be a valid http(s) URL",
            ));
        }
    }

    if enabled == Some(true) && url_endpoint.is_none_or(str::is_empty) {
        errors.push(FieldError::new(
            "urlEndpoint",
            "URL endpoint is required when URL rewriting is enabled",
        ));
    }
    if upload_enabled == Some(true) {
        if public_key.is_none_or(str::is_empty) {
            errors.push(FieldError::new(
                "publicKey",
                "Public key is required when upload is enabled",
            ));
        }
        if private_key.is_none_or(str::is_empty) {
            errors.push(FieldError::new(
                "privateKey",
                "Private key is required when upload is enabled",
            ));
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let mut settings = Settings::from_value(&camel_case_only(obj))
        .map_err(|e| vec![FieldError::new("", e.to_string())])?;
    for field in [
        &mut settings.public_key,
        &mut settings.private_key,
        &mut settings.url_endpoint,
    ] {
        *field = field.trim().to_string();
    }
    Ok(settings)
}

/// Drop snake_case keys: they are only accepted from the static config file,
/// and submitted values under them would skip the checks above.
fn camel_case_only(obj: &Map<String, Value>) -> Value {
    Value::Object(
        obj.iter()
            .filter(|(key, _)| !key.contains('_'))
            .map(|(key, value)| match value {
                Value::Object(inner) => (key.clone(), camel_case_only(inner)),
                other => (key.clone(), other.clone()),
            })
            .collect(),
    )
}

fn validate_upload_options(options: &Map<String, Value>, errors: &mut Vec<FieldError>) {
    const PREFIX: &str = "uploadOptions.";

    if let Some(tags) = options.get("tags").filter(|v| !v.is_null()) {
        let all_strings = tags
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_string));
        if !all_strings {
            errors.push(FieldError::new(
                "uploadOptions.tags",
                "Tags must be a list of strings",
            ));
        }
    }
    optional_string(options, "folder", PREFIX, errors);
    optional_string(options, "checks", PREFIX, errors);
    optional_bool(options, "overwriteTags", PREFIX, errors);
    optional_bool(options, "overwriteCustomMetadata", PREFIX, errors);
    optional_bool(options, "isPrivateFile", PREFIX, errors);
}

fn required_bool(obj: &Map<String, Value>, key: &str, errors: &mut Vec<FieldError>) -> Option<bool> {
    match obj.get(key) {
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::Null) | None => {
            errors.push(FieldError::new(key, format!("{key} is required")));
            None
        }
        Some(_) => {
            errors.push(FieldError::new(key, format!("{key} must be a boolean")));
            None
        }
    }
}

fn optional_bool(
    obj: &Map<String, Value>,
    key: &str,
    prefix: &str,
    errors: &mut Vec<FieldError>,
) -> Option<bool> {
    match obj.get(key) {
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::Null) | None => None,
        Some(_) => {
            errors.push(FieldError::new(
                format!("{prefix}{key}"),
                format!("{key} must be a boolean"),
            ));
            None
        }
    }
}

fn optional_string<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    prefix: &str,
    errors: &mut Vec<FieldError>,
) -> Option<&'a str> {
    match obj.get(key) {
        Some(Value::String(s)) => Some(s.trim()),
        Some(Value::Null) | None => None,
        Some(_) => {
            errors.push(FieldError::new(
                format!("{prefix}{key}"),
                format!("{key} must be a string"),
            ));
            None
        }
    }
}

fn has_prefixed_value(value: &str, prefix: &str) -> bool {
    value.strip_prefix(prefix).is_some_and(|rest| !rest.is_empty())
}

fn is_http_url(value: &str) -> bool {
    url::Url::parse(value)
        .is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
}
