//! Configuration management for restyle.
//!
//! Loads configuration from ${RESTYLE_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::transform::AugmentationPolicy;

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
/// To update, edit default_config.toml directly.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Merges user config values into the default template.
///
/// This ensures new comments/sections from the template are always present,
/// while preserving user's customized values.
fn merge_with_template(user_config: &str) -> Result<String> {
    use toml_edit::DocumentMut;

    let mut doc: DocumentMut = default_config_template()
        .parse()
        .context("Failed to parse default config template")?;

    let user_doc: DocumentMut = user_config.parse().context("Failed to parse user config")?;

    merge_items(doc.as_table_mut(), user_doc.as_table());

    Ok(doc.to_string())
}

/// Recursively merges items from source table into target table.
fn merge_items(target: &mut toml_edit::Table, source: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, value) in source {
        match value {
            Item::Value(v) => {
                target[key] = Item::Value(v.clone());
            }
            Item::Table(src_table) => {
                if let Some(Item::Table(target_table)) = target.get_mut(key) {
                    merge_items(target_table, src_table);
                } else {
                    target[key] = Item::Table(src_table.clone());
                }
            }
            Item::ArrayOfTables(src_arr) => {
                target[key] = Item::ArrayOfTables(src_arr.clone());
            }
            Item::None => {}
        }
    }
}

pub mod paths {
    //! Path resolution for restyle configuration and data directories.
    //!
    //! RESTYLE_HOME resolution order:
    //! 1. RESTYLE_HOME environment variable (if set)
    //! 2. ~/.config/restyle (default)
    //! 3. ./.restyle when no home directory can be determined

    use std::path::PathBuf;

    /// Returns the restyle home directory.
    pub fn restyle_home() -> PathBuf {
        if let Ok(home) = std::env::var("RESTYLE_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".restyle"),
            |h| h.join(".config").join("restyle"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        restyle_home().join("config.toml")
    }

    /// Returns the path to the cached session file.
    pub fn session_path() -> PathBuf {
        restyle_home().join("session.json")
    }

    /// Returns the directory that holds rolling log files.
    pub fn logs_dir() -> PathBuf {
        restyle_home().join("logs")
    }
}

/// Reads a trimmed, non-empty environment variable.
fn env_override(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Identity provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Web API key of the identity project.
    pub api_key: Option<String>,
    /// Identity Toolkit REST base URL.
    pub base_url: String,
    /// Secure token endpoint used for refreshes.
    pub token_url: String,
}

impl IdentityConfig {
    pub const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
    pub const DEFAULT_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1/token";

    /// Returns the API key, preferring `RESTYLE_IDENTITY_API_KEY`.
    pub fn effective_api_key(&self) -> Option<String> {
        env_override("RESTYLE_IDENTITY_API_KEY")
            .or_else(|| non_empty(self.api_key.as_deref()).map(str::to_string))
    }

    /// Returns the REST base URL, preferring `RESTYLE_IDENTITY_BASE_URL`.
    pub fn effective_base_url(&self) -> String {
        env_override("RESTYLE_IDENTITY_BASE_URL")
            .or_else(|| non_empty(Some(&self.base_url)).map(str::to_string))
            .unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string())
    }

    /// Returns the token refresh URL, preferring `RESTYLE_IDENTITY_TOKEN_URL`.
    pub fn effective_token_url(&self) -> String {
        env_override("RESTYLE_IDENTITY_TOKEN_URL")
            .or_else(|| non_empty(Some(&self.token_url)).map(str::to_string))
            .unwrap_or_else(|| Self::DEFAULT_TOKEN_URL.to_string())
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            token_url: Self::DEFAULT_TOKEN_URL.to_string(),
        }
    }
}

/// Media host settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub cloud_name: String,
    /// Unsigned upload profile identifier.
    pub upload_preset: String,
    pub upload_base_url: String,
    pub delivery_base_url: String,
}

impl MediaConfig {
    pub const DEFAULT_CLOUD_NAME: &str = "deh1tsnix";
    pub const DEFAULT_UPLOAD_PRESET: &str = "purisima";
    pub const DEFAULT_UPLOAD_BASE_URL: &str = "https://api.cloudinary.com";
    pub const DEFAULT_DELIVERY_BASE_URL: &str = "https://res.cloudinary.com";

    /// Returns the upload base URL, preferring `RESTYLE_MEDIA_UPLOAD_URL`.
    pub fn effective_upload_base_url(&self) -> String {
        env_override("RESTYLE_MEDIA_UPLOAD_URL")
            .or_else(|| non_empty(Some(&self.upload_base_url)).map(str::to_string))
            .unwrap_or_else(|| Self::DEFAULT_UPLOAD_BASE_URL.to_string())
    }

    /// Full upload endpoint for the configured cloud.
    pub fn upload_url(&self) -> String {
        format!(
            "{}/v1_1/{}/image/upload",
            self.effective_upload_base_url().trim_end_matches('/'),
            self.cloud_name
        )
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            cloud_name: Self::DEFAULT_CLOUD_NAME.to_string(),
            upload_preset: Self::DEFAULT_UPLOAD_PRESET.to_string(),
            upload_base_url: Self::DEFAULT_UPLOAD_BASE_URL.to_string(),
            delivery_base_url: Self::DEFAULT_DELIVERY_BASE_URL.to_string(),
        }
    }
}

/// Prompt defaults and the replace-prompt augmentation policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub from: String,
    pub to: String,
    pub augmentation: AugmentationPolicy,
    pub preserve_geometry: bool,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            from: crate::transform::DEFAULT_FROM_PROMPT.to_string(),
            to: crate::transform::DEFAULT_TO_PROMPT.to_string(),
            augmentation: AugmentationPolicy::default(),
            preserve_geometry: true,
        }
    }
}

/// Photo intake settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Longest side in pixels before a picked photo is downscaled (0 disables).
    pub max_dimension: u32,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_dimension: 4096,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log filter used when RESTYLE_LOG is unset
    pub log_level: String,

    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub media: MediaConfig,

    #[serde(default)]
    pub prompts: PromptsConfig,

    #[serde(default)]
    pub intake: IntakeConfig,
}

impl Config {
    const DEFAULT_LOG_LEVEL: &str = "warn";

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Saves only the `prompts.augmentation` field to a specific config file path.
    ///
    /// Creates the file with default template if it doesn't exist.
    /// If file exists, merges user values into the latest template.
    ///
    /// # Errors
    /// Returns an error if the config cannot be read, merged or written.
    pub fn save_augmentation_to(path: &Path, policy: AugmentationPolicy) -> Result<()> {
        use toml_edit::{DocumentMut, value};

        let contents = if path.exists() {
            let user_config = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            merge_with_template(&user_config)?
        } else {
            default_config_template().to_string()
        };

        let mut doc: DocumentMut = contents
            .parse()
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        doc["prompts"]["augmentation"] = value(policy.as_str());

        Self::write_config(path, &doc.to_string())
    }

    /// Creates a default config file at the given path.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Generates a fresh config TOML from Rust defaults.
    ///
    /// Uses the embedded template for structure/comments and merges
    /// generated values from `Config::default()` into it.
    ///
    /// # Errors
    /// Returns an error if serialization or template parsing fails.
    pub fn generate() -> Result<String> {
        use toml_edit::DocumentMut;

        let config = Config::default();
        let generated_toml =
            toml::to_string(&config).context("Failed to serialize default config to TOML")?;

        let mut doc: DocumentMut = default_config_template()
            .parse()
            .context("Failed to parse default config template")?;

        let generated_doc: DocumentMut = generated_toml
            .parse()
            .context("Failed to parse generated config")?;

        merge_items(doc.as_table_mut(), generated_doc.as_table());

        Ok(doc.to_string())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Self::DEFAULT_LOG_LEVEL.to_string(),
            identity: IdentityConfig::default(),
            media: MediaConfig::default(),
            prompts: PromptsConfig::default(),
            intake: IntakeConfig::default(),
        }
    }
}
