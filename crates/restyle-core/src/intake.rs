//! Photo intake: permission check and single-photo selection.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::error::{RestyleError, Result};
use crate::images::path_mime;
use crate::images::prepare::prepare_for_upload;

/// Fixed crop aspect ratio for picked photos.
pub const PICK_ASPECT: (u32, u32) = (1, 1);

/// Outcome of a photo-access request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied(String),
}

/// A user-chosen photo, ready to upload and discarded afterwards.
#[derive(Debug, Clone)]
pub struct SelectedImage {
    pub path: PathBuf,
    /// JPEG payload sent as `upload.jpg`.
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Where photos come from.
pub trait PhotoSource {
    /// Asks once for access. There is no retry.
    fn request_permission(&self) -> Permission;

    /// Lets the user choose one photo. `Ok(None)` means the user cancelled.
    ///
    /// # Errors
    /// Returns an error if the chosen photo cannot be read or prepared.
    fn pick_image(&self) -> Result<Option<SelectedImage>>;
}

/// Picks photos from the local file system.
///
/// With a path the pick is non-interactive. Without one the user is asked for a
/// path on the given reader; an empty answer cancels.
pub struct FileSource<R> {
    path: Option<PathBuf>,
    max_dimension: u32,
    input: Mutex<R>,
}

impl FileSource<std::io::StdinLock<'static>> {
    pub fn stdin(path: Option<PathBuf>, max_dimension: u32) -> Self {
        Self::with_reader(path, max_dimension, std::io::stdin().lock())
    }
}

impl<R: BufRead> FileSource<R> {
    pub fn with_reader(path: Option<PathBuf>, max_dimension: u32, input: R) -> Self {
        Self {
            path,
            max_dimension,
            input: Mutex::new(input),
        }
    }

    fn prompt_for_path(&self) -> Result<Option<PathBuf>> {
        eprint!("Photo path (leave empty to cancel): ");
        std::io::stderr().flush()?;

        let mut line = String::new();
        let mut input = self
            .input
            .lock()
            .map_err(|e| RestyleError::Io(std::io::Error::other(e.to_string())))?;
        input.read_line(&mut line)?;

        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        Ok(Some(path_mime::normalize_input_path(trimmed)))
    }
}

/// Checks that a path points at a readable photo in a supported format.
pub fn check_access(path: &Path) -> Permission {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => return Permission::Denied(format!("{}: {e}", path.display())),
    };
    if !metadata.is_file() {
        return Permission::Denied(format!("{} is not a file", path.display()));
    }
    if path_mime::mime_type_for_extension(path).is_none() {
        return Permission::Denied(format!(
            "{} is not a supported photo (jpg, png, webp)",
            path.display()
        ));
    }
    if let Err(e) = std::fs::File::open(path) {
        return Permission::Denied(format!("{}: {e}", path.display()));
    }
    Permission::Granted
}

impl<R: BufRead> PhotoSource for FileSource<R> {
    fn request_permission(&self) -> Permission {
        // Interactive picks are checked once the user has typed a path.
        match &self.path {
            Some(path) => check_access(path),
            None => Permission::Granted,
        }
    }

    fn pick_image(&self) -> Result<Option<SelectedImage>> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => {
                let Some(path) = self.prompt_for_path()? else {
                    debug!("photo pick cancelled");
                    return Ok(None);
                };
                if let Permission::Denied(reason) = check_access(&path) {
                    return Err(RestyleError::PermissionDenied(reason));
                }
                path
            }
        };

        let prepared = prepare_for_upload(&path, PICK_ASPECT, self.max_dimension)?;
        debug!(
            path = %path.display(),
            width = prepared.width,
            height = prepared.height,
            bytes = prepared.jpeg_bytes.len(),
            "photo prepared"
        );

        Ok(Some(SelectedImage {
            path,
            bytes: prepared.jpeg_bytes,
            width: prepared.width,
            height: prepared.height,
        }))
    }
}
