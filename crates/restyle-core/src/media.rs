//! Upload client for the media host.
//!
//! One multipart POST per photo with an unsigned upload profile. No retry and no
//! timeout beyond reqwest's defaults.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{RestyleError, Result};
use crate::intake::SelectedImage;

const UPLOAD_FILE_NAME: &str = "upload.jpg";
const UPLOAD_MIME: &str = "image/jpeg";

/// A stored original on the media host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedAsset {
    /// Stable identifier keying every derived URL.
    pub public_id: String,
    /// Canonical URL of the original.
    pub secure_url: String,
}

/// Anything that can turn a selected photo into a stored asset.
pub trait Uploader {
    fn upload(&self, image: &SelectedImage) -> impl Future<Output = Result<UploadedAsset>> + Send;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: Option<String>,
    secure_url: Option<String>,
}

impl UploadResponse {
    fn into_asset(self) -> Result<UploadedAsset> {
        match (self.public_id, self.secure_url) {
            (Some(public_id), Some(secure_url)) if !public_id.is_empty() => Ok(UploadedAsset {
                public_id,
                secure_url,
            }),
            (None | Some(_), Some(_)) => Err(RestyleError::Upload(
                "response is missing public_id".to_string(),
            )),
            (_, None) => Err(RestyleError::Upload(
                "response is missing secure_url".to_string(),
            )),
        }
    }
}

/// reqwest-backed upload client.
#[derive(Debug, Clone)]
pub struct MediaClient {
    http: reqwest::Client,
    upload_url: String,
    upload_preset: String,
}

impl MediaClient {
    pub fn new(upload_url: &str, upload_preset: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            upload_url: upload_url.to_string(),
            upload_preset: upload_preset.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.media.upload_url(), &config.media.upload_preset)
    }

    async fn send(&self, image: &SelectedImage) -> Result<UploadedAsset> {
        let part = reqwest::multipart::Part::bytes(image.bytes.clone())
            .file_name(UPLOAD_FILE_NAME)
            .mime_str(UPLOAD_MIME)?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone());

        debug!(url = %self.upload_url, bytes = image.bytes.len(), "uploading photo");
        let response = self
            .http
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RestyleError::Upload(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(|e| {
                RestyleError::Upload(format!("HTTP {status}: failed to read response body: {e}"))
            })?;
            return Err(RestyleError::Upload(body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RestyleError::Upload(e.to_string()))?;
        let parsed: UploadResponse = serde_json::from_str(&body)
            .map_err(|e| RestyleError::Upload(format!("malformed response: {e}")))?;
        let asset = parsed.into_asset()?;
        info!(public_id = %asset.public_id, "photo uploaded");
        Ok(asset)
    }
}

impl Uploader for MediaClient {
    fn upload(&self, image: &SelectedImage) -> impl Future<Output = Result<UploadedAsset>> + Send {
        self.send(image)
    }
}
