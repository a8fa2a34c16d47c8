//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions. The site keeps
//! nothing but form notices in the session, so expiry is short.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::{ConfigError, SiteConfig};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "aaa_session";

/// Session expiry time in seconds (1 hour).
const SESSION_EXPIRY_SECONDS: i64 = 60 * 60;

/// Build the `PostgreSQL` session store in the `site` schema.
///
/// # Errors
///
/// Returns an error if the schema or table name is rejected by the store.
pub fn session_store(pool: &PgPool) -> Result<PostgresStore, ConfigError> {
    PostgresStore::new(pool.clone())
        .with_schema_name("site")
        .and_then(|store| store.with_table_name("session"))
        .map_err(|e| ConfigError::InvalidEnvVar("session store".to_string(), e.to_string()))
}

/// Wrap any session store in the site's cookie settings.
#[must_use]
pub fn session_layer<S: SessionStore + Clone>(store: S, config: &SiteConfig) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
