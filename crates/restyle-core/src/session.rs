//! Session gate: email/password auth against the identity provider.
//!
//! Sessions are cached in `<base>/session.json` with restricted permissions (0600).
//! Tokens are never logged or displayed in full.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{Config, paths};
use crate::error::RestyleError;

/// Tokens are treated as expired this long before the provider says so.
const EXPIRY_BUFFER_MS: u64 = 5 * 60 * 1000;

fn now_millis_u64() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|d| u64::try_from(d.as_millis()).ok())
        .unwrap_or(u64::MAX)
}

fn compute_expires_at(expires_in_secs: u64) -> u64 {
    now_millis_u64()
        .saturating_add(expires_in_secs.saturating_mul(1000))
        .saturating_sub(EXPIRY_BUFFER_MS)
}

/// An authenticated identity as issued by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub email: String,
    /// Provider-assigned user id
    pub local_id: String,
    pub id_token: String,
    pub refresh_token: String,
    /// Expiry timestamp in milliseconds since epoch
    pub expires: u64,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        now_millis_u64() >= self.expires
    }

    /// The read-only view handed to components that need to know who is signed in.
    pub fn context(&self) -> SessionContext {
        SessionContext {
            email: self.email.clone(),
            user_id: self.local_id.clone(),
        }
    }
}

/// Who is signed in, passed explicitly instead of read from a global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub email: String,
    pub user_id: String,
}

/// On-disk session cache.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location under RESTYLE_HOME.
    pub fn default_location() -> Self {
        Self::new(paths::session_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the cached session, `None` when signed out.
    ///
    /// # Errors
    /// Returns an error if the cache exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session from {}", self.path.display()))?;

        serde_json::from_str(&contents)
            .map(Some)
            .with_context(|| format!("Failed to parse session from {}", self.path.display()))
    }

    /// Saves the session with restricted permissions (0600).
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(session).context("Failed to serialize session")?;

        #[cfg(unix)]
        {
            use std::fs::OpenOptions;
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        #[cfg(not(unix))]
        {
            let mut file = fs::File::create(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        Ok(())
    }

    /// Removes the cached session. Returns whether one was present.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)
            .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        Ok(true)
    }
}

const MISSING_API_KEY: &str =
    "No identity API key configured. Set RESTYLE_IDENTITY_API_KEY or identity.api_key in config.toml";

/// Thin REST client for the identity provider.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    base_url: String,
    token_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    id_token: String,
    email: Option<String>,
    refresh_token: String,
    expires_in: String,
    local_id: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl IdentityClient {
    pub fn new(base_url: &str, token_url: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token_url: token_url.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Builds a client from config and environment overrides.
    ///
    /// # Errors
    /// Returns an error if no API key is configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.identity.effective_api_key().context(MISSING_API_KEY)?;
        Ok(Self::new(
            &config.identity.effective_base_url(),
            &config.identity.effective_token_url(),
            &api_key,
        ))
    }

    /// Exchanges email and password for a session.
    ///
    /// # Errors
    /// Returns `RestyleError::Identity` when the provider rejects the credentials.
    pub async fn sign_in(&self, email: &str, password: &str) -> crate::error::Result<Session> {
        self.password_call("accounts:signInWithPassword", email, password)
            .await
    }

    /// Creates an identity and returns its first session.
    ///
    /// # Errors
    /// Returns `RestyleError::Identity` when the provider rejects the sign-up.
    pub async fn sign_up(&self, email: &str, password: &str) -> crate::error::Result<Session> {
        self.password_call("accounts:signUp", email, password).await
    }

    /// Trades a refresh token for a fresh id token.
    ///
    /// # Errors
    /// Returns `RestyleError::Identity` when the refresh token is no longer valid.
    pub async fn refresh(&self, session: &Session) -> crate::error::Result<Session> {
        let response = self
            .http
            .post(&self.token_url)
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", session.refresh_token.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(identity_error(response).await);
        }

        let body: RefreshResponse = response.json().await?;
        Ok(Session {
            email: session.email.clone(),
            local_id: body.user_id,
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires: compute_expires_at(body.expires_in.parse().unwrap_or(0)),
        })
    }

    async fn password_call(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> crate::error::Result<Session> {
        let url = format!("{}/{endpoint}", self.base_url);
        debug!(%url, "identity request");

        let response = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(identity_error(response).await);
        }

        let body: AuthResponse = response.json().await?;
        Ok(Session {
            email: body.email.unwrap_or_else(|| email.to_string()),
            local_id: body.local_id,
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires: compute_expires_at(body.expires_in.parse().unwrap_or(0)),
        })
    }
}

async fn identity_error(response: reqwest::Response) -> RestyleError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let raw = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| format!("HTTP {status}: {body}"));
    let (code, message) = map_provider_error(&raw);
    RestyleError::Identity { code, message }
}

/// Splits a raw provider message such as `WEAK_PASSWORD : Password should be at least 6
/// characters` into an `auth/...` code and the provider's own wording.
pub fn map_provider_error(raw: &str) -> (String, String) {
    let (key, detail) = match raw.split_once(" : ") {
        Some((key, detail)) => (key.trim(), Some(detail.trim())),
        None => (raw.trim(), None),
    };

    let is_provider_key =
        !key.is_empty() && key.chars().all(|c| c.is_ascii_uppercase() || c == '_');
    if !is_provider_key {
        return ("auth/error".to_string(), raw.to_string());
    }

    let code = match key {
        "EMAIL_EXISTS" => "auth/email-already-in-use".to_string(),
        "EMAIL_NOT_FOUND" => "auth/user-not-found".to_string(),
        "INVALID_PASSWORD" => "auth/wrong-password".to_string(),
        "INVALID_LOGIN_CREDENTIALS" => "auth/invalid-credential".to_string(),
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "auth/too-many-requests".to_string(),
        "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" => "auth/user-token-expired".to_string(),
        other => format!("auth/{}", other.to_ascii_lowercase().replace('_', "-")),
    };

    (code, detail.unwrap_or(key).to_string())
}

/// Returns a masked version of a token for display (first 12 chars + ...).
pub fn mask_token(token: &str) -> String {
    if token.len() <= 16 {
        return "***".to_string();
    }
    match token.get(..12) {
        Some(prefix) => format!("{prefix}..."),
        None => "***".to_string(),
    }
}

/// Sign-in, sign-up and sign-out over an identity client plus the local cache.
#[derive(Debug, Clone)]
pub struct SessionGate {
    client: IdentityClient,
    store: SessionStore,
}

impl SessionGate {
    pub fn new(client: IdentityClient, store: SessionStore) -> Self {
        Self { client, store }
    }

    /// Signs in and caches the session.
    ///
    /// # Errors
    /// Provider rejections surface as `RestyleError::Identity`; nothing is cached then.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let session = self.client.sign_in(email, password).await?;
        self.store.save(&session)?;
        info!(email = %session.email, token = %mask_token(&session.id_token), "signed in");
        Ok(session)
    }

    /// Registers a new identity and signs it in right away.
    ///
    /// # Errors
    /// Provider rejections surface as `RestyleError::Identity`; nothing is cached then.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session> {
        let session = self.client.sign_up(email, password).await?;
        self.store.save(&session)?;
        info!(email = %session.email, "registered");
        Ok(session)
    }

    /// Drops the cached session. Returns whether a session was present.
    ///
    /// # Errors
    /// Propagates cache removal failures unchanged.
    pub fn sign_out(&self) -> Result<bool> {
        let had_session = self.store.clear()?;
        info!(had_session, "signed out");
        Ok(had_session)
    }

    /// Returns the cached session, refreshing it once if it has expired.
    ///
    /// # Errors
    /// Returns `RestyleError::NotSignedIn` when nothing is cached or the refresh is rejected.
    /// An expired session with no API key configured is an error and stays cached.
    pub async fn current(&self) -> Result<Session> {
        let Some(session) = self.store.load()? else {
            return Err(RestyleError::NotSignedIn.into());
        };
        if !session.is_expired() {
            return Ok(session);
        }

        // Without a key the provider rejects the refresh; keep the session for later.
        if !self.client.has_api_key() {
            anyhow::bail!("Session expired and cannot be refreshed. {MISSING_API_KEY}");
        }

        debug!("session expired, refreshing");
        match self.client.refresh(&session).await {
            Ok(fresh) => {
                self.store.save(&fresh)?;
                Ok(fresh)
            }
            Err(RestyleError::Identity { code, message }) => {
                warn!(%code, %message, "session refresh rejected");
                self.store.clear()?;
                Err(RestyleError::NotSignedIn.into())
            }
            Err(other) => Err(other.into()),
        }
    }
}
