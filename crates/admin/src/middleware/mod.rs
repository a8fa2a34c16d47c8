//! HTTP middleware stack for admin.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Security headers
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//! 5. Backend session expiry (flush the session on a backend 401)
//!
//! Authentication is enforced per handler through the extractors in [`auth`].

pub mod auth;
pub mod security_headers;
pub mod session;

pub use auth::{
    AdminBackend, OptionalAdminAuth, RequireAdminAuth, RequireSuperAdmin, clear_current_admin,
    set_current_admin,
};
pub use security_headers::security_headers_middleware;
pub use session::{expire_backend_session, session_layer, session_store};
