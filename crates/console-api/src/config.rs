//! Client configuration.
//!
//! Loaded from environment variables prefixed with `CONSOLE_`:
//! - `CONSOLE_API_BASE_URL`: Default API base URL (default: "http://localhost:8080")
//! - `CONSOLE_AUTH_BASE_URL`, `CONSOLE_AUTHZ_BASE_URL`, `CONSOLE_CMS_BASE_URL`,
//!   `CONSOLE_CMS_PUBLIC_BASE_URL`: Per-service overrides of the base URL
//! - `CONSOLE_ERROR_LOGGING_URL`: Remote error logging endpoint (optional)
//! - `CONSOLE_REFRESH_BUFFER_MS`: How long before expiry to refresh (default: 60000)
//! - `CONSOLE_COOKIE_*`: Cookie attributes for the cookie jar store
//! - `CONSOLE_SESSION_FILE`: Where the file store keeps the session record

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::cookie::{CookieOptions, SameSite};
use crate::error::ClientResult;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Default API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Base URL of the authentication endpoints
    #[serde(default)]
    pub auth_base_url: Option<String>,

    /// Base URL of the role/permission endpoints
    #[serde(default)]
    pub authz_base_url: Option<String>,

    /// Base URL of the administrative CMS endpoints
    #[serde(default)]
    pub cms_base_url: Option<String>,

    /// Base URL of the public CMS endpoints
    #[serde(default)]
    pub cms_public_base_url: Option<String>,

    /// Remote error logging endpoint; remote submission is skipped when unset
    #[serde(default)]
    pub error_logging_url: Option<String>,

    /// Proactive refresh buffer in milliseconds
    #[serde(default = "default_refresh_buffer_ms")]
    pub refresh_buffer_ms: u64,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Cookie `Path` attribute
    #[serde(default = "default_cookie_path")]
    pub cookie_path: String,

    /// Cookie `Domain` attribute
    #[serde(default)]
    pub cookie_domain: Option<String>,

    /// Cookie `SameSite` attribute
    #[serde(default = "default_cookie_same_site")]
    pub cookie_same_site: Option<SameSite>,

    /// Cookie `Secure` attribute
    #[serde(default)]
    pub cookie_secure: bool,

    /// Session record location for the file store
    #[serde(default)]
    pub session_file: Option<PathBuf>,

    /// Production mode (JSON logs, no debug output)
    #[serde(default)]
    pub production: bool,

    /// Where unauthenticated navigation is redirected to
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Login email used by the session binary
    #[serde(default)]
    pub email: Option<String>,

    /// Login password used by the session binary
    #[serde(default)]
    pub password: Option<String>,
}

fn default_api_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_refresh_buffer_ms() -> u64 {
    60_000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_cookie_path() -> String {
    "/".to_string()
}

fn default_cookie_same_site() -> Option<SameSite> {
    Some(SameSite::Lax)
}

fn default_login_path() -> String {
    "/admin/auth/login".to_string()
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables are prefixed with `CONSOLE_`.
    pub fn from_env() -> ClientResult<Self> {
        Ok(envy::prefixed("CONSOLE_").from_env::<ClientConfig>()?)
    }

    /// Configuration pointing every service at one base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn auth_base_url(&self) -> &str {
        self.auth_base_url.as_deref().unwrap_or(&self.api_base_url)
    }

    pub fn authz_base_url(&self) -> &str {
        self.authz_base_url.as_deref().unwrap_or(&self.api_base_url)
    }

    pub fn cms_base_url(&self) -> &str {
        self.cms_base_url.as_deref().unwrap_or(&self.api_base_url)
    }

    pub fn cms_public_base_url(&self) -> &str {
        self.cms_public_base_url
            .as_deref()
            .unwrap_or(&self.api_base_url)
    }

    pub fn refresh_buffer(&self) -> Duration {
        Duration::from_millis(self.refresh_buffer_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Cookie attributes for the cookie jar store.
    pub fn cookie_options(&self) -> CookieOptions {
        CookieOptions {
            path: self.cookie_path.clone(),
            domain: self.cookie_domain.clone(),
            same_site: self.cookie_same_site,
            secure: self.cookie_secure,
        }
    }

    /// Session file location, defaulting to `~/.console/session.json`.
    pub fn session_file_path(&self) -> Option<PathBuf> {
        self.session_file.clone().or_else(|| {
            dirs::home_dir().map(|home| home.join(".console").join("session.json"))
        })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            auth_base_url: None,
            authz_base_url: None,
            cms_base_url: None,
            cms_public_base_url: None,
            error_logging_url: None,
            refresh_buffer_ms: default_refresh_buffer_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            cookie_path: default_cookie_path(),
            cookie_domain: None,
            cookie_same_site: default_cookie_same_site(),
            cookie_secure: false,
            session_file: None,
            production: false,
            login_path: default_login_path(),
            email: None,
            password: None,
        }
    }
}
