//! Google OAuth state kept under ~/.config/streak/google:
//!   credentials.toml  (OAuth client id and secret, user-provided)
//!   session.toml      (cached tokens, refreshed when they expire)

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use google_calendar::{AccessToken, Client};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::auth::redirect_uri;

/// Refresh this long before Google says the token expires.
const EXPIRY_MARGIN_SECS: i64 = 60;

fn google_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Could not determine config directory")?
        .join("streak")
        .join("google"))
}

/// The user's own OAuth client, registered in the Google Cloud console.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
}

impl Credentials {
    pub fn load() -> Result<Self> {
        Self::load_from(&google_dir()?.join("credentials.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => anyhow::bail!(
                "No Google OAuth client at {}.\n\
                Create one at https://console.cloud.google.com/apis/credentials \
                and save its client_id and client_secret there.",
                path.display()
            ),
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to read {}", path.display()));
            }
        };

        toml::from_str(&contents)
            .with_context(|| format!("Invalid credentials in {}", path.display()))
    }

    /// A calendar client for this OAuth client, holding the given tokens.
    pub fn client(&self, access_token: &str, refresh_token: &str) -> Client {
        Client::new(
            self.client_id.clone(),
            self.client_secret.clone(),
            redirect_uri(),
            access_token.to_string(),
            refresh_token.to_string(),
        )
    }
}

pub struct Session {
    path: PathBuf,
    data: SessionData,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionData {
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl From<&AccessToken> for SessionData {
    fn from(tokens: &AccessToken) -> Self {
        let expires_at = Utc::now() + Duration::seconds(tokens.expires_in);

        SessionData {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            expires_at,
        }
    }
}

impl Session {
    /// ~/.config/streak/google/session.toml
    pub fn default_path() -> Result<PathBuf> {
        Ok(google_dir()?.join("session.toml"))
    }

    pub fn new(path: &Path, data: SessionData) -> Self {
        Session {
            path: path.to_path_buf(),
            data,
        }
    }

    pub fn access_token(&self) -> &str {
        &self.data.access_token
    }

    /// Calendar API client authorized with this session's tokens.
    pub fn client(&self) -> Result<Client> {
        Ok(Credentials::load()?.client(&self.data.access_token, &self.data.refresh_token))
    }

    /// Load a session and refresh it if expired.
    pub async fn load_valid(path: &Path) -> Result<Self> {
        let mut session = Self::load(path)?;

        if session.is_expired() {
            debug!(path = %path.display(), "access token expired, refreshing");
            session.refresh().await?;
        }

        Ok(session)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Google OAuth session not found at {}.\nRun `streak auth` first.",
                path.display()
            );
        }

        let contents = std::fs::read_to_string(path).with_context(|| {
            format!("Failed to read Google OAuth session from {}", path.display())
        })?;

        let data: SessionData = toml::from_str(&contents).with_context(|| {
            format!("Failed to parse Google OAuth session from {}", path.display())
        })?;

        Ok(Session::new(path, data))
    }

    pub fn save(&self) -> Result<()> {
        let contents = toml::to_string_pretty(&self.data).context("Failed to serialize session")?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write session to {}", self.path.display()))?;

        // Set to owner-only (0600) since file contains OAuth tokens:
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to set permissions on {}", self.path.display()))?;
        }

        Ok(())
    }

    fn is_expired(&self) -> bool {
        Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS) >= self.data.expires_at
    }

    async fn refresh(&mut self) -> Result<()> {
        let mut tokens = self
            .client()?
            .refresh_access_token()
            .await
            .context("Failed to refresh token")?;

        // Google typically doesn't return a new refresh_token on refresh
        if tokens.refresh_token.is_empty() {
            tokens.refresh_token = self.data.refresh_token.clone();
        }

        self.data = (&tokens).into();
        self.save()?;

        Ok(())
    }
}
