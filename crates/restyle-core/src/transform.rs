//! Transformation URL composition.
//!
//! Derived URLs are never fetched here. The media host runs the generative
//! effect lazily when something later requests the URL, so building one is a
//! pure string operation: identical inputs always give identical bytes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_FROM_PROMPT: &str = "hair";
pub const DEFAULT_TO_PROMPT: &str = "curly hair with bangs";

const MODERATE_MARKER: &str = "same person";
const MODERATE_CLAUSE: &str = "keep same person, preserve face";
const AGGRESSIVE_MARKER: &str = "same face";
const AGGRESSIVE_CLAUSE: &str =
    "same person, same face, same facial features, same skin tone, only change the hairstyle";

/// How strongly the replace prompt is biased toward keeping the subject's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AugmentationPolicy {
    /// Prompt passed through untouched
    None,
    /// Appends a short face-preservation clause
    #[default]
    Moderate,
    /// Appends an explicit list of features that must not change
    Aggressive,
}

impl AugmentationPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            AugmentationPolicy::None => "none",
            AugmentationPolicy::Moderate => "moderate",
            AugmentationPolicy::Aggressive => "aggressive",
        }
    }

    /// Applies the policy to a `to` prompt.
    ///
    /// A prompt that already carries the policy's marker phrase is left alone,
    /// so applying twice is the same as applying once.
    pub fn apply(self, to: &str) -> String {
        let (marker, clause) = match self {
            AugmentationPolicy::None => return to.to_string(),
            AugmentationPolicy::Moderate => (MODERATE_MARKER, MODERATE_CLAUSE),
            AugmentationPolicy::Aggressive => (AGGRESSIVE_MARKER, AGGRESSIVE_CLAUSE),
        };
        if to.contains(marker) {
            to.to_string()
        } else {
            format!("{to}, {clause}")
        }
    }
}

impl fmt::Display for AugmentationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AugmentationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(AugmentationPolicy::None),
            "moderate" => Ok(AugmentationPolicy::Moderate),
            "aggressive" => Ok(AugmentationPolicy::Aggressive),
            other => Err(format!(
                "unknown augmentation policy '{other}' (expected none, moderate or aggressive)"
            )),
        }
    }
}

/// The pair of free-text prompts driving both effects.
///
/// No validation: empty or odd prompts are forwarded as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRequest {
    /// What to target (replace) or erase (remove).
    pub from: String,
    /// Desired replacement description.
    pub to: String,
}

impl TransformRequest {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl Default for TransformRequest {
    fn default() -> Self {
        Self::new(DEFAULT_FROM_PROMPT, DEFAULT_TO_PROMPT)
    }
}

/// Builds delivery URLs for the generative effects of one cloud.
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    delivery_base_url: String,
    cloud_name: String,
    policy: AugmentationPolicy,
    preserve_geometry: bool,
}

impl UrlBuilder {
    pub fn new(delivery_base_url: &str, cloud_name: &str) -> Self {
        Self {
            delivery_base_url: delivery_base_url.trim_end_matches('/').to_string(),
            cloud_name: cloud_name.to_string(),
            policy: AugmentationPolicy::default(),
            preserve_geometry: true,
        }
    }

    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(&config.media.delivery_base_url, &config.media.cloud_name)
            .with_policy(config.prompts.augmentation)
            .with_preserve_geometry(config.prompts.preserve_geometry)
    }

    #[must_use]
    pub fn with_policy(mut self, policy: AugmentationPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_preserve_geometry(mut self, preserve: bool) -> Self {
        self.preserve_geometry = preserve;
        self
    }

    pub fn policy(&self) -> AugmentationPolicy {
        self.policy
    }

    /// URL for the replace effect: swaps `from` for the augmented `to`.
    pub fn replace_url(&self, public_id: &str, request: &TransformRequest) -> String {
        let to = self.policy.apply(&request.to);
        let mut effect = format!(
            "e_gen_replace:from_{};to_{}",
            encode_prompt(&request.from),
            encode_prompt(&to)
        );
        if self.preserve_geometry {
            effect.push_str(";preserve-geometry_true");
        }
        self.delivery_url(&effect, public_id)
    }

    /// URL for the remove effect: erases whatever `prompt` describes.
    pub fn remove_url(&self, public_id: &str, prompt: &str) -> String {
        let effect = format!("e_gen_remove:prompt_{}", encode_prompt(prompt));
        self.delivery_url(&effect, public_id)
    }

    fn delivery_url(&self, effect: &str, public_id: &str) -> String {
        format!(
            "{}/{}/image/upload/{}/{}",
            self.delivery_base_url,
            self.cloud_name,
            effect,
            encode_public_id(public_id)
        )
    }
}

/// Percent-encodes prompt text so separators like `,` `;` `/` stay literal.
fn encode_prompt(prompt: &str) -> String {
    urlencoding::encode(prompt).into_owned()
}

/// Public ids may contain folder separators; those stay as path segments.
fn encode_public_id(public_id: &str) -> String {
    public_id
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> UrlBuilder {
        UrlBuilder::new("https://res.cloudinary.com", "demo")
    }

    #[test]
    fn test_replace_url_format() {
        let url = builder().with_policy(AugmentationPolicy::None).replace_url(
            "abc123",
            &TransformRequest::new("hair", "bald head"),
        );
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/upload/e_gen_replace:from_hair;to_bald%20head;preserve-geometry_true/abc123"
        );
    }

    #[test]
    fn test_replace_url_is_deterministic() {
        let b = builder();
        let request = TransformRequest::new("hat", "red beanie, wool");
        assert_eq!(
            b.replace_url("folder/pic", &request),
            b.replace_url("folder/pic", &request)
        );
    }

    #[test]
    fn test_replace_url_without_geometry_flag() {
        let url = builder()
            .with_preserve_geometry(false)
            .replace_url("abc123", &TransformRequest::default());
        assert!(!url.contains("preserve-geometry"));
    }

    #[test]
    fn test_moderate_policy_appends_clause_once() {
        assert_eq!(
            AugmentationPolicy::Moderate.apply("bald head"),
            "bald head, keep same person, preserve face"
        );
        assert_eq!(
            AugmentationPolicy::Moderate.apply("long hair, same person"),
            "long hair, same person"
        );
        let once = AugmentationPolicy::Moderate.apply("bob haircut");
        assert_eq!(AugmentationPolicy::Moderate.apply(&once), once);
    }

    #[test]
    fn test_aggressive_policy_lists_features() {
        let out = AugmentationPolicy::Aggressive.apply("afro hairstyle");
        assert!(out.starts_with("afro hairstyle, "));
        assert!(out.contains("same facial features"));
        assert_eq!(AugmentationPolicy::Aggressive.apply(&out), out);
    }

    #[test]
    fn test_prompt_commas_are_encoded() {
        let url = builder().replace_url("abc123", &TransformRequest::new("hair", "bald head"));
        assert!(url.contains("to_bald%20head%2C%20keep%20same%20person%2C%20preserve%20face"));
        // Only the effect separators remain literal.
        let effect = url.split('/').nth(6).unwrap();
        assert_eq!(effect.matches(',').count(), 0);
        assert_eq!(effect.matches(';').count(), 2);
    }

    #[test]
    fn test_remove_url_ignores_to_prompt() {
        let b = builder();
        let a = b.remove_url("abc123", "hair");
        let request = TransformRequest::new("hair", "something else entirely");
        assert_eq!(a, b.remove_url("abc123", &request.from));
        assert_eq!(
            a,
            "https://res.cloudinary.com/demo/image/upload/e_gen_remove:prompt_hair/abc123"
        );
    }

    #[test]
    fn test_empty_prompts_pass_through() {
        let url = builder()
            .with_policy(AugmentationPolicy::None)
            .replace_url("abc123", &TransformRequest::new("", ""));
        assert!(url.contains("e_gen_replace:from_;to_;"));
    }

    #[test]
    fn test_public_id_folders_kept() {
        let url = builder().remove_url("users/me pic", "hat");
        assert!(url.ends_with("/users/me%20pic"));
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(
            "Aggressive".parse::<AugmentationPolicy>().unwrap(),
            AugmentationPolicy::Aggressive
        );
        assert_eq!(
            "off".parse::<AugmentationPolicy>().unwrap(),
            AugmentationPolicy::None
        );
        assert!("loud".parse::<AugmentationPolicy>().is_err());
    }

    #[test]
    fn test_trailing_slash_on_base_is_trimmed() {
        let url = UrlBuilder::new("https://cdn.example.com/", "c").remove_url("x", "y");
        assert!(url.starts_with("https://cdn.example.com/c/image/upload/"));
    }
}
