//! Session store migrations.
//!
//! Business records live behind the backend API; the only tables the web
//! apps own are the tower-sessions tables, one schema per app.
//!
//! # Usage
//!
//! ```bash
//! aaa-cli migrate site
//! aaa-cli migrate admin
//! aaa-cli migrate all
//! ```
//!
//! # Environment Variables
//!
//! - `SITE_DATABASE_URL` - `PostgreSQL` connection string for the site
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string for the admin panel
//!
//! Both fall back to `DATABASE_URL`.

use secrecy::SecretString;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn database_url(key: &'static str) -> Result<SecretString, MigrationError> {
    std::env::var(key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar(key))
}

/// Create the site session table.
pub async fn site() -> Result<(), MigrationError> {
    let url = database_url("SITE_DATABASE_URL")?;

    tracing::info!("Connecting to site database...");
    let pool = aaa_site::db::create_pool(&url).await?;

    tracing::info!("Migrating site session store...");
    aaa_site::db::migrate_sessions(&pool).await?;

    tracing::info!("Site session store ready");
    Ok(())
}

/// Create the admin session table.
pub async fn admin() -> Result<(), MigrationError> {
    let url = database_url("ADMIN_DATABASE_URL")?;

    tracing::info!("Connecting to admin database...");
    let pool = aaa_admin::db::create_pool(&url).await?;

    tracing::info!("Migrating admin session store...");
    aaa_admin::db::migrate_sessions(&pool).await?;

    tracing::info!("Admin session store ready");
    Ok(())
}
