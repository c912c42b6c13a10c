//! Path normalization + MIME helpers for photo files.

/// Normalizes user-provided file paths.
///
/// Handles common drag-and-drop shell escaping (`\ `, `\(`, `\)`), strips
/// `file://` prefixes and surrounding quotes, and expands `~/` to the HOME
/// directory when available.
#[must_use]
pub fn normalize_input_path(path: &str) -> std::path::PathBuf {
    let trimmed = path.trim().trim_matches(|c| c == '"' || c == '\'');
    let trimmed = trimmed.strip_prefix("file://").unwrap_or(trimmed);

    let unescaped = trimmed
        .replace("\\ ", " ")
        .replace("\\(", "(")
        .replace("\\)", ")");

    let path = std::path::Path::new(&unescaped);
    if let Some(rest) = path.to_str().and_then(|s| s.strip_prefix("~/"))
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }

    path.to_path_buf()
}

/// Returns MIME type inferred from file extension for supported photo formats.
#[must_use]
pub fn mime_type_for_extension(path: &std::path::Path) -> Option<&'static str> {
    let ext = path.extension().and_then(|e| e.to_str())?;

    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Returns the file extension to use for a response content type.
#[must_use]
pub fn extension_for_mime_type(mime_type: &str) -> Option<&'static str> {
    let essence = mime_type.split(';').next().unwrap_or("").trim();
    match essence.to_ascii_lowercase().as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/avif" => Some("avif"),
        _ => None,
    }
}
