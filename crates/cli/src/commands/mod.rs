//! Subcommand implementations.

pub mod admin;
pub mod conversations;
pub mod migrate;

use std::time::Duration;

use aaa_admin::backend::{AuthorizedBackend, BackendClient, BackendError};
use aaa_admin::config::{BackendConfig, ConfigError};
use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 30;

/// Errors shared by the backend-facing commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Backend client authorized with `BACKEND_API_TOKEN`.
///
/// The token is an admin access token issued by the backend; the CLI acts
/// with that admin's permissions.
pub(crate) fn backend_from_env() -> Result<AuthorizedBackend, CommandError> {
    let base_url = std::env::var("BACKEND_API_URL")
        .map_err(|_| CommandError::MissingEnvVar("BACKEND_API_URL"))?;
    let token = std::env::var("BACKEND_API_TOKEN")
        .map_err(|_| CommandError::MissingEnvVar("BACKEND_API_TOKEN"))?;
    let timeout = std::env::var("ADMIN_BACKEND_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_BACKEND_TIMEOUT_SECS);

    let config = BackendConfig::new(&base_url, Duration::from_secs(timeout))?;
    let client = BackendClient::new(&config)?;
    Ok(client.authorized(SecretString::from(token)))
}
