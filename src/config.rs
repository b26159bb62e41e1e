use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::errors::{ProxyError, Result};
use crate::models::PlayMode;

pub const REQUEST_TIMEOUT_SECONDS: u64 = 10;
pub const TRACK_MATCH_THRESHOLD: u8 = 60;
pub const LISTING_PAGE_SIZE: u32 = 500;
pub const CLIENT_NAME: &str = "sonami";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Per-session settings. Nothing here is process-wide.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub server_url: String,
    #[serde(flatten)]
    pub credentials: Credentials,
    /// Send the password in clear (`p=`) instead of a salted token.
    pub use_legacy_auth: bool,
    pub client_name: String,
    /// Upper bound for every single catalog call; 0 disables it.
    pub request_timeout_secs: u64,
    /// Minimum similarity (exclusive, 0-100) for bare-track fallback matches.
    pub track_match_threshold: u8,
    pub listing_page_size: u32,
    pub play_mode: PlayMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            credentials: Credentials::default(),
            use_legacy_auth: false,
            client_name: CLIENT_NAME.to_string(),
            request_timeout_secs: REQUEST_TIMEOUT_SECONDS,
            track_match_threshold: TRACK_MATCH_THRESHOLD,
            listing_page_size: LISTING_PAGE_SIZE,
            play_mode: PlayMode::Normal,
        }
    }
}

impl SessionConfig {
    pub fn new(server_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            server_url: server_url.into(),
            credentials,
            ..Default::default()
        }
    }

    /// Builds a config from the JSON blob stored for a provider.
    pub fn from_value(config: Value) -> Result<Self> {
        let config: SessionConfig = serde_json::from_value(config)
            .map_err(|e| ProxyError::Config(format!("Malformed session config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.server_url.trim();
        if url.is_empty() {
            return Err(ProxyError::Config("Missing server_url".to_string()));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ProxyError::Config(format!(
                "server_url must be http(s): {}",
                url
            )));
        }
        if self.credentials.username.is_empty() {
            return Err(ProxyError::Config("Missing username".to_string()));
        }
        if self.track_match_threshold > 100 {
            return Err(ProxyError::Config(format!(
                "track_match_threshold must be within 0-100, got {}",
                self.track_match_threshold
            )));
        }
        if self.listing_page_size == 0 {
            return Err(ProxyError::Config(
                "listing_page_size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
