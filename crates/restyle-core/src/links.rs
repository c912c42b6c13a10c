//! Handing result URLs to the outside world: the default URL handler or a file.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::{RestyleError, Result};
use crate::images::path_mime;

/// Opens URLs with whatever the platform has registered for them.
pub trait LinkOpener {
    /// Returns whether a handler is available at all.
    fn can_open(&self, url: &str) -> bool;

    /// # Errors
    /// Returns `RestyleError::LinkOpen` when the handler refuses the URL.
    fn open(&self, url: &str) -> Result<()>;
}

/// Opens links with the system browser via the `open` crate.
///
/// Setting `RESTYLE_NO_BROWSER` disables it, which `can_open` then reports.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl LinkOpener for SystemOpener {
    fn can_open(&self, url: &str) -> bool {
        std::env::var_os("RESTYLE_NO_BROWSER").is_none()
            && (url.starts_with("https://") || url.starts_with("http://"))
    }

    fn open(&self, url: &str) -> Result<()> {
        open::that(url).map_err(|e| RestyleError::LinkOpen(format!("{url}: {e}")))
    }
}

/// Opens a result URL so the user can save it from the browser.
///
/// Returns the confirmation to show the user.
///
/// # Errors
/// Returns `RestyleError::LinkOpen` if no handler accepts the URL.
pub fn open_for_download(opener: &impl LinkOpener, url: &str, label: &str) -> Result<String> {
    if !opener.can_open(url) {
        warn!(%url, "no handler for result URL");
        return Err(RestyleError::LinkOpen(url.to_string()));
    }
    opener.open(url)?;
    Ok(format!("Opening {label} in browser for download."))
}

/// Fetches a result URL and writes it under `out`.
///
/// `out` may be a directory (a timestamped name is chosen) or a file path. The
/// extension follows the response content type when the path has none.
///
/// # Errors
/// Returns an error on a failed request, a non-2xx status, or a write failure.
pub async fn save_url(url: &str, out: &Path, label: &str) -> Result<PathBuf> {
    fetch_to(url, out, label, false).await
}

/// Saves several labelled results under one `out` without name collisions.
///
/// With more than one result, an `out` without an extension is treated as a
/// directory (created if missing) and a file path gets the label slug added to
/// its stem.
///
/// # Errors
/// Stops at the first failed download; earlier files stay on disk.
pub async fn save_all(results: &[(&str, &str)], out: &Path) -> Result<Vec<PathBuf>> {
    let many = results.len() > 1;
    let mut saved = Vec::with_capacity(results.len());
    for (label, url) in results {
        saved.push(fetch_to(url, out, label, many).await?);
    }
    Ok(saved)
}

async fn fetch_to(url: &str, out: &Path, label: &str, many: bool) -> Result<PathBuf> {
    debug!(%url, "fetching result");
    let response = reqwest::get(url).await?.error_for_status()?;
    let ext = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(path_mime::extension_for_mime_type)
        .unwrap_or("jpg");
    let bytes = response.bytes().await?;

    let path = resolve_output_path(out, label, ext, many);
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, &bytes)?;
    Ok(path)
}

fn label_slug(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect()
}

fn resolve_output_path(out: &Path, label: &str, ext: &str, many: bool) -> PathBuf {
    let as_dir = out.is_dir()
        || out.as_os_str().to_string_lossy().ends_with('/')
        || (many && out.extension().is_none());
    if as_dir {
        let ts = Utc::now().format("%Y%m%d-%H%M%S");
        return out.join(format!("{}-{ts}.{ext}", label_slug(label)));
    }

    let ext = out
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or(ext)
        .to_string();
    if !many {
        return out.with_extension(ext);
    }
    let stem = out
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("image");
    out.with_file_name(format!("{stem}-{}.{ext}", label_slug(label)))
}
