//! Site configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SITE_DATABASE_URL` - `PostgreSQL` connection string for the session store
//!   (falls back to `DATABASE_URL`)
//! - `SITE_BASE_URL` - Public URL for the site
//! - `SITE_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `BACKEND_API_URL` - Base URL of the backend REST API
//!
//! ## Optional
//! - `SITE_HOST` - Bind address (default: 127.0.0.1)
//! - `SITE_PORT` - Listen port (default: 3000)
//! - `SITE_CONTENT_DIR` - Markdown content root (default: crates/site/content)
//! - `SITE_CONTACT_PHONE` - Phone number shown on the site
//! - `SITE_CONTACT_EMAIL` - Email address shown on the site
//! - `SITE_WHATSAPP_NUMBER` - Number used for WhatsApp handoff (default: contact phone)
//! - `SITE_BACKEND_TIMEOUT_SECS` - Backend request timeout (default: 15)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use aaa_core::secret;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const DEFAULT_CONTACT_PHONE: &str = "+44 (0) 800 011 6197";
const DEFAULT_CONTACT_EMAIL: &str = "info@aaa-as.co.uk";
const DEFAULT_CONTENT_DIR: &str = "crates/site/content";
const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 15;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Site application configuration.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the site
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Backend REST API base URL, always ending in `/`
    pub backend_url: Url,
    /// Per-request backend timeout
    pub backend_timeout: Duration,
    /// Markdown content root
    pub content_dir: PathBuf,
    /// Public contact details
    pub contact: ContactConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Contact details rendered in the header, footer and forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactConfig {
    pub phone: String,
    pub email: String,
    pub whatsapp_number: String,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            phone: DEFAULT_CONTACT_PHONE.to_string(),
            email: DEFAULT_CONTACT_EMAIL.to_string(),
            whatsapp_number: DEFAULT_CONTACT_PHONE.to_string(),
        }
    }
}

impl ContactConfig {
    /// `tel:` link target for the phone number.
    #[must_use]
    pub fn phone_href(&self) -> String {
        let digits: String = self
            .phone
            .replace("(0)", "")
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect();
        format!("tel:{digits}")
    }

    fn from_env() -> Self {
        let defaults = Self::default();
        let phone = get_optional_env("SITE_CONTACT_PHONE").unwrap_or(defaults.phone);
        Self {
            whatsapp_number: get_optional_env("SITE_WHATSAPP_NUMBER")
                .unwrap_or_else(|| phone.clone()),
            email: get_optional_env("SITE_CONTACT_EMAIL").unwrap_or(defaults.email),
            phone,
        }
    }
}

impl SiteConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the session secret fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("SITE_DATABASE_URL")?;
        let host = parse_env("SITE_HOST", "127.0.0.1")?;
        let port = parse_env("SITE_PORT", "3000")?;
        let base_url = get_required_env("SITE_BASE_URL")?;
        let session_secret = get_session_secret("SITE_SESSION_SECRET")?;
        let backend_url = parse_backend_url(&get_required_env("BACKEND_API_URL")?)?;
        let backend_timeout = Duration::from_secs(parse_env(
            "SITE_BACKEND_TIMEOUT_SECS",
            &DEFAULT_BACKEND_TIMEOUT_SECS.to_string(),
        )?);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            backend_url,
            backend_timeout,
            content_dir: get_optional_env("SITE_CONTENT_DIR")
                .map_or_else(|| PathBuf::from(DEFAULT_CONTENT_DIR), PathBuf::from),
            contact: ContactConfig::from_env(),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_optional_env("SENTRY_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            sentry_traces_sample_rate: get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.1),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies should be marked `Secure`.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

/// Parse the backend base URL, adding the trailing slash that `Url::join`
/// needs to keep the last path segment.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if the URL does not parse or is not
/// http(s).
pub fn parse_backend_url(raw: &str) -> Result<Url, ConfigError> {
    let mut base = raw.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    let url = Url::parse(&base)
        .map_err(|e| ConfigError::InvalidEnvVar("BACKEND_API_URL".to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "BACKEND_API_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

// =============================================================================
// Helpers
// =============================================================================

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar(primary_key.to_string()))
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key)
        .unwrap_or_else(|| default.to_string())
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn get_session_secret(key: &str) -> Result<SecretString, ConfigError> {
    let secret = SecretString::from(get_required_env(key)?);
    validate_session_secret(&secret, key)?;
    Ok(secret)
}

fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    secret::check_session_secret(secret.expose_secret())
        .map_err(|e| ConfigError::InsecureSecret(var_name.to_string(), e.to_string()))
}
