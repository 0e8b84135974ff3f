/// Result of validating a flat filename.
#[derive(Debug)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename contains path separators (`/` or `\`).
    ContainsPathSeparator,
    /// Filename contains path traversal patterns (`..`).
    PathTraversal,
    /// Filename contains null bytes.
    NullByte,
    /// Filename starts with a dot (hidden file).
    Hidden,
    /// Filename contains control characters (CR, LF, etc.).
    ControlCharacter,
}

impl FilenameError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::ContainsPathSeparator => "Invalid filename: path separators are not allowed",
            Self::PathTraversal => "Invalid filename: '..' is not allowed",
            Self::NullByte => "Invalid filename: null bytes are not allowed",
            Self::Hidden => "Invalid filename: hidden files (starting with '.') are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
        }
    }
}

/// Validates a flat filename (no directory components allowed).
pub fn validate_flat_filename(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }

    if trimmed.contains('\0') {
        return Err(FilenameError::NullByte);
    }

    // Reject ASCII control characters to prevent
    // HTTP header injection (e.g. CRLF in Content-Disposition).
    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    if trimmed == ".." {
        return Err(FilenameError::PathTraversal);
    }

    if trimmed.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    Ok(trimmed)
}

/// Split a file name into base name and extension (with the dot).
///
/// A leading dot does not start an extension: `.env` has none.
pub fn split_ext(name: &str) -> (&str, &str) {
    let file = name.rsplit('/').next().unwrap_or(name);
    match file.rfind('.') {
        Some(pos) if pos > 0 => (&file[..pos], &file[pos..]),
        _ => (file, ""),
    }
}

/// File name without directory or extension.
pub fn base_name(name: &str) -> &str {
    split_ext(name).0
}

/// Storage hash of a file imported from the CDN:
/// `{base name, whitespace runs as '_'}_{first 8 chars of the file id}`.
pub fn import_hash(name: &str, file_id: &str) -> String {
    let prefix: String = file_id.chars().take(8).collect();
    format!("{}_{prefix}", underscore_whitespace(base_name(name)))
}

/// Storage hash for a new upload: sanitized base name plus a random suffix.
pub fn upload_hash(name: &str) -> String {
    let suffix: String = uuid::Uuid::new_v4().simple().to_string().chars().take(10).collect();
    let base: String = underscore_whitespace(base_name(name))
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("{base}_{suffix}")
}

/// 24 hex characters, the host's document id shape.
pub fn document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string().chars().take(24).collect()
}

/// Join the configured upload folder with a media-library folder path.
pub fn join_folder(folder: &str, folder_path: Option<&str>) -> Option<String> {
    let segments: Vec<&str> = folder
        .split('/')
        .chain(folder_path.unwrap_or_default().split('/'))
        .filter(|s| !s.is_empty())
        .collect();

    if segments.is_empty() {
        return None;
    }
    let absolute = folder.starts_with('/')
        || (folder.is_empty() && folder_path.is_some_and(|p| p.starts_with('/')));
    let joined = segments.join("/");
    Some(if absolute { format!("/{joined}") } else { joined })
}

fn underscore_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join("_")
}
