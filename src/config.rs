// Client configuration loaded from environment variables

use std::path::PathBuf;

/// Default location of the persisted session file
pub const DEFAULT_SESSION_FILE: &str = ".session.json";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),

    #[error("{name} is not a valid http(s) URL: {value}")]
    InvalidUrl { name: &'static str, value: String },
}

/// Runtime configuration for the review thread client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the marketplace REST API, without trailing slash
    pub api_base_url: String,
    /// Base URL used to absolutize relative image paths
    pub asset_base_url: String,
    /// Where the session (token, user id, wishlist) is persisted
    pub session_file: PathBuf,
}

impl ClientConfig {
    /// Load configuration from the process environment
    ///
    /// Reads a `.env` file first if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    ///
    /// Variables:
    /// * `REVIEWS_API_BASE_URL` - required
    /// * `REVIEWS_ASSET_BASE_URL` - defaults to the API base URL
    /// * `REVIEWS_SESSION_FILE` - defaults to `.session.json`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("REVIEWS_API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("REVIEWS_API_BASE_URL"))?;
        let api_base_url = normalize_base_url("REVIEWS_API_BASE_URL", &api_base_url)?;

        let asset_base_url = match lookup("REVIEWS_ASSET_BASE_URL").filter(|v| !v.trim().is_empty()) {
            Some(url) => normalize_base_url("REVIEWS_ASSET_BASE_URL", &url)?,
            None => api_base_url.clone(),
        };

        let session_file = lookup("REVIEWS_SESSION_FILE")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_FILE.to_string());

        tracing::debug!("Loaded client configuration for {}", api_base_url);

        Ok(Self {
            api_base_url,
            asset_base_url,
            session_file: PathBuf::from(session_file),
        })
    }
}

fn normalize_base_url(name: &'static str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidUrl {
            name,
            value: value.to_string(),
        });
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}
