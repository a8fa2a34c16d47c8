//! Session middleware configuration for admin.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions with
//! stricter security settings (SameSite=Strict, 24hr expiry).

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use sqlx::PgPool;
use tower_sessions::{Expiry, Session, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::{AdminConfig, ConfigError};
use crate::error::BackendSessionExpired;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "aaa_admin_session";

/// Session expiry time in seconds (24 hours).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Build the `PostgreSQL` session store in the `admin` schema.
///
/// # Errors
///
/// Returns an error if the schema or table name is rejected by the store.
pub fn session_store(pool: &PgPool) -> Result<PostgresStore, ConfigError> {
    PostgresStore::new(pool.clone())
        .with_schema_name("admin")
        .and_then(|store| store.with_table_name("session"))
        .map_err(|e| ConfigError::InvalidEnvVar("session store".to_string(), e.to_string()))
}

/// Wrap any session store in the admin cookie settings.
#[must_use]
pub fn session_layer<S: SessionStore + Clone>(store: S, config: &AdminConfig) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        // SameSite=Strict for admin
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}

/// Sign the admin out when the backend rejected their token.
///
/// Handlers surface a backend 401 as a login redirect tagged with
/// [`BackendSessionExpired`]. This flushes the session and, for HTMX
/// requests, swaps the redirect for an `HX-Redirect` so the whole page
/// navigates instead of the login form landing inside a fragment.
pub async fn expire_backend_session(session: Session, request: Request, next: Next) -> Response {
    let is_htmx = request.headers().contains_key("hx-request");
    let response = next.run(request).await;

    if response.extensions().get::<BackendSessionExpired>().is_none() {
        return response;
    }

    if let Err(e) = session.flush().await {
        tracing::error!(error = %e, "Failed to flush session after backend 401");
    }

    if is_htmx {
        return (StatusCode::OK, [("HX-Redirect", "/auth/login?expired=1")]).into_response();
    }
    response
}
