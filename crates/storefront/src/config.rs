//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `EMPORIUM_API_URL` - Base URL of the storefront backend (e.g., `http://localhost:5000/`)
//!
//! ## Optional
//! - `EMPORIUM_USER_AGENT` - User agent sent with every request (default: `emporium/<version>`)
//! - `EMPORIUM_EMAIL` - Account email used to open a session
//! - `EMPORIUM_PASSWORD` - Account password (required when `EMPORIUM_EMAIL` is set)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name (default: `development`)

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::api::Credentials;

const DEFAULT_USER_AGENT: &str = concat!("emporium/", env!("CARGO_PKG_VERSION"));

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend connection settings
    pub api: ApiConfig,
    /// Account used to open a session
    pub account: AccountConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: String,
}

/// Backend connection settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every endpoint path is resolved against. Always ends in `/`.
    pub base_url: Url,
    /// User agent sent with every request
    pub user_agent: String,
}

/// Account credentials.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone, Default)]
pub struct AccountConfig {
    pub email: Option<String>,
    pub password: Option<SecretString>,
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api = ApiConfig::from_env()?;
        let account = AccountConfig::from_parts(
            get_optional_env("EMPORIUM_EMAIL"),
            get_optional_env("EMPORIUM_PASSWORD"),
        )?;

        Ok(Self {
            api,
            account,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_env_or_default("SENTRY_ENVIRONMENT", "development"),
        })
    }
}

impl ApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw = get_required_env("EMPORIUM_API_URL")?;
        Ok(Self {
            base_url: parse_base_url(&raw)
                .map_err(|e| ConfigError::InvalidEnvVar("EMPORIUM_API_URL".to_string(), e))?,
            user_agent: get_env_or_default("EMPORIUM_USER_AGENT", DEFAULT_USER_AGENT),
        })
    }

    /// Settings for a backend at `base_url` with the default user agent.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL is not an absolute
    /// http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)
                .map_err(|e| ConfigError::InvalidEnvVar("EMPORIUM_API_URL".to_string(), e))?,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        })
    }
}

impl AccountConfig {
    fn from_parts(email: Option<String>, password: Option<String>) -> Result<Self, ConfigError> {
        let email = email.filter(|e| !e.trim().is_empty());
        let password = password.filter(|p| !p.is_empty());

        if email.is_some() && password.is_none() {
            return Err(ConfigError::MissingEnvVar("EMPORIUM_PASSWORD".to_string()));
        }

        Ok(Self {
            email,
            password: password.map(SecretString::from),
        })
    }

    /// Login credentials, when an account is configured.
    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.email, &self.password) {
            (Some(email), Some(password)) => {
                Some(Credentials::new(email.clone(), password.clone()))
            }
            _ => None,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse the backend base URL.
///
/// Endpoint paths are joined relative to it, so a trailing `/` is added when
/// missing; otherwise the last path segment would be replaced.
fn parse_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.cannot_be_a_base() {
        return Err("URL cannot be used as a base".to_string());
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}
