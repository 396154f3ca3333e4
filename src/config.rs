//! Client configuration.
//!
//! Configuration is stored in `config.yaml` and includes:
//! - Base URL of the ticket API
//! - Bearer token for the session
//! - Request timeouts and the retry budget for read requests
//!
//! The file lives at `$TICKETBOARD_CONFIG` when set, otherwise in the
//! platform config directory. `TICKETBOARD_API_URL` and `TICKETBOARD_TOKEN`
//! take precedence over the file.

use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BoardError, Result};

pub const CONFIG_ENV: &str = "TICKETBOARD_CONFIG";
pub const API_URL_ENV: &str = "TICKETBOARD_API_URL";
pub const TOKEN_ENV: &str = "TICKETBOARD_TOKEN";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the ticket API, without the `/api` suffix
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Authentication
    #[serde(default)]
    pub auth: AuthConfig,

    /// Total request timeout in seconds (default: 30)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Connect timeout in seconds (default: 10)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Extra attempts for idempotent reads on transient failures (default: 2)
    #[serde(default = "default_retries")]
    pub retries: u32,
}

fn default_api_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_retries() -> u32 {
    2
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            auth: AuthConfig::default(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            retries: default_retries(),
        }
    }
}

/// Authentication configuration
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = env::var(CONFIG_ENV)
            && !path.is_empty()
        {
            return Ok(PathBuf::from(path));
        }

        let dirs = directories::ProjectDirs::from("", "", "ticketboard").ok_or_else(|| {
            BoardError::Config("cannot determine configuration directory".to_string())
        })?;
        Ok(dirs.config_dir().join("config.yaml"))
    }

    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            BoardError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config at {}: {}", path.display(), e),
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml_ng::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                BoardError::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create directory for config at {}: {}",
                        path.display(),
                        e
                    ),
                ))
            })?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(&path, content).map_err(|e| {
            BoardError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write config at {}: {}", path.display(), e),
            ))
        })?;

        // The file holds a bearer token; owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&path, permissions)?;
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.api_url)
            .map_err(|e| BoardError::Config(format!("invalid api_url '{}': {}", self.api_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(BoardError::Config(format!(
                "api_url must be http or https, got '{}'",
                parsed.scheme()
            )));
        }
        Ok(())
    }

    /// API base URL from environment or config file
    pub fn api_url(&self) -> String {
        if let Ok(url) = env::var(API_URL_ENV)
            && !url.is_empty()
        {
            return url;
        }
        self.api_url.clone()
    }

    /// Bearer token from environment or config file
    pub fn token(&self) -> Option<String> {
        if let Ok(token) = env::var(TOKEN_ENV)
            && !token.is_empty()
        {
            return Some(token);
        }
        self.auth.token.clone()
    }

    /// Replace the API base URL, rejecting anything that is not http(s)
    pub fn set_api_url(&mut self, url: &str) -> Result<()> {
        let previous = std::mem::replace(&mut self.api_url, url.trim().to_string());
        if let Err(e) = self.validate() {
            self.api_url = previous;
            return Err(e);
        }
        Ok(())
    }

    pub fn set_token(&mut self, token: String) {
        self.auth.token = Some(token);
    }

    /// Drop the stored token. Returns whether there was one.
    pub fn clear_token(&mut self) -> bool {
        self.auth.token.take().is_some()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}
