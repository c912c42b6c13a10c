//! The transform studio: in-memory state of one signed-in editing session.
//!
//! Holds the current prompts, the last uploaded asset and the derived URLs.
//! Mutated only from the caller's task, so there is no locking. The busy flag
//! is informational: `upload` holds `&mut self`, so it is only observable after
//! an upload future was dropped mid-flight, and then it reads `false`.

use tracing::{debug, info};

use crate::error::{RestyleError, Result};
use crate::intake::{Permission, PhotoSource, SelectedImage};
use crate::media::{UploadedAsset, Uploader};
use crate::presets::HairstylePreset;
use crate::session::SessionContext;
use crate::transform::{TransformRequest, UrlBuilder};

/// Result of a pick-and-upload attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickOutcome {
    Uploaded,
    /// The user closed the picker; nothing changed.
    Cancelled,
}

/// One labelled image to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultImage<'a> {
    pub label: &'static str,
    pub url: &'a str,
}

/// Clears the busy flag when dropped, including when the upload future is dropped.
struct BusyGuard<'a>(&'a mut bool);

impl<'a> BusyGuard<'a> {
    fn enter(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

pub struct Studio {
    session: SessionContext,
    builder: UrlBuilder,
    request: TransformRequest,
    asset: Option<UploadedAsset>,
    replace_url: Option<String>,
    remove_url: Option<String>,
    busy: bool,
}

impl Studio {
    pub fn new(session: SessionContext, builder: UrlBuilder, request: TransformRequest) -> Self {
        Self {
            session,
            builder,
            request,
            asset: None,
            replace_url: None,
            remove_url: None,
            busy: false,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn request(&self) -> &TransformRequest {
        &self.request
    }

    pub fn set_from(&mut self, from: impl Into<String>) {
        self.request.from = from.into();
    }

    pub fn set_to(&mut self, to: impl Into<String>) {
        self.request.to = to.into();
    }

    /// Takes both prompts from a catalog entry.
    pub fn select_preset(&mut self, preset: &HairstylePreset) {
        self.request = preset.request();
    }

    pub fn asset(&self) -> Option<&UploadedAsset> {
        self.asset.as_ref()
    }

    pub fn replace_url(&self) -> Option<&str> {
        self.replace_url.as_deref()
    }

    pub fn remove_url(&self) -> Option<&str> {
        self.remove_url.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Asks for photo access, lets the user pick, and uploads the pick.
    ///
    /// # Errors
    /// `PermissionDenied` when access is refused (the uploader is never called),
    /// otherwise whatever picking or uploading reports.
    pub async fn pick_and_upload(
        &mut self,
        source: &impl PhotoSource,
        uploader: &impl Uploader,
    ) -> Result<PickOutcome> {
        if let Permission::Denied(reason) = source.request_permission() {
            return Err(RestyleError::PermissionDenied(reason));
        }

        let Some(image) = source.pick_image()? else {
            return Ok(PickOutcome::Cancelled);
        };

        self.upload(uploader, image).await?;
        Ok(PickOutcome::Uploaded)
    }

    /// Uploads a photo and derives the replace URL from the current prompts.
    ///
    /// Previous derived URLs are cleared before the request goes out and stay
    /// cleared if it fails. The selected image is consumed either way.
    ///
    /// # Errors
    /// Returns `RestyleError::Upload` for any failed or malformed upload.
    pub async fn upload(
        &mut self,
        uploader: &impl Uploader,
        image: SelectedImage,
    ) -> Result<&UploadedAsset> {
        self.replace_url = None;
        self.remove_url = None;

        // Busy until the new URL is stored, or until this future is dropped.
        let busy = BusyGuard::enter(&mut self.busy);
        let outcome = uploader.upload(&image).await;
        drop(image);

        let asset = outcome?;
        let url = self.builder.replace_url(&asset.public_id, &self.request);
        debug!(public_id = %asset.public_id, policy = %self.builder.policy(), "replace url built");
        info!(email = %self.session.email, "transform ready");
        self.replace_url = Some(url);
        let asset = self.asset.insert(asset);
        drop(busy);
        Ok(asset)
    }

    /// Derives the remove URL from the stored asset and the `from` prompt.
    ///
    /// Returns `None` and changes nothing when no upload has completed yet.
    pub fn apply_generative_remove(&mut self) -> Option<&str> {
        let asset = self.asset.as_ref()?;
        let url = self.builder.remove_url(&asset.public_id, &self.request.from);
        Some(self.remove_url.insert(url).as_str())
    }

    /// Original and derived images in display order.
    pub fn results(&self) -> Vec<ResultImage<'_>> {
        let mut out = Vec::with_capacity(3);
        if let Some(asset) = &self.asset {
            out.push(ResultImage {
                label: "Original",
                url: &asset.secure_url,
            });
        }
        if let Some(url) = &self.replace_url {
            out.push(ResultImage {
                label: "AI Transform",
                url,
            });
        }
        if let Some(url) = &self.remove_url {
            out.push(ResultImage {
                label: "AI Remove",
                url,
            });
        }
        out
    }
}
