//! Error taxonomy shared by the session, intake and pipeline modules.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RestyleError {
    /// Photo access was refused; the flow stops before any upload.
    #[error("Permission required to access photos: {0}")]
    PermissionDenied(String),

    /// Any failed upload. Quota, network and validation failures are reported alike.
    #[error("Upload failed: {0}")]
    Upload(String),

    /// Rejected by the identity provider.
    #[error("{code}: {message}")]
    Identity { code: String, message: String },

    #[error("Cannot open image URL: {0}")]
    LinkOpen(String),

    #[error("Not signed in. Run `restyle login` first.")]
    NotSignedIn,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Resize error: {0}")]
    Resize(String),
}

impl RestyleError {
    /// Message shown to the user for identity failures.
    ///
    /// Sign-in surfaces the provider message alone; sign-up prefixes the code.
    pub fn identity_message(&self) -> Option<&str> {
        match self {
            RestyleError::Identity { message, .. } => Some(message),
            _ => None,
        }
    }
}

pub type Result<T, E = RestyleError> = std::result::Result<T, E>;
