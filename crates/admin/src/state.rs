//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::backend::BackendClient;
use crate::config::{AdminConfig, ViewerConfig};
use crate::services::AdminAccountService;

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    backend: BackendClient,
    accounts: AdminAccountService,
}

impl AppState {
    /// Create application state.
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool, backend: BackendClient) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                backend,
                accounts: AdminAccountService::default(),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Unauthenticated backend client; see [`crate::middleware::AdminBackend`].
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    #[must_use]
    pub fn accounts(&self) -> &AdminAccountService {
        &self.inner.accounts
    }

    #[must_use]
    pub fn viewer_config(&self) -> ViewerConfig {
        self.inner.config.viewer
    }
}
