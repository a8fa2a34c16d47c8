//! Database access for the site.
//!
//! Leads go straight to the backend REST API. The site database holds only
//! the `site.session` table behind tower-sessions, which carries one-shot
//! form notices across the post/redirect/get cycle.

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::middleware::session::session_store;

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Create the session schema and table if they do not exist.
///
/// # Errors
///
/// Returns `sqlx::Error` if the migration fails.
pub async fn migrate_sessions(pool: &PgPool) -> Result<(), sqlx::Error> {
    let store = session_store(pool).map_err(|e| sqlx::Error::Configuration(e.to_string().into()))?;
    store.migrate().await
}

/// Check the pool can serve a query.
///
/// # Errors
///
/// Returns `sqlx::Error` if the database is unreachable.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}
