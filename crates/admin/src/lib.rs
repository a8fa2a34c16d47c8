//! AAA Accident Solutions admin library.
//!
//! The back-office for the marketing site: chatbot conversation review with
//! manual takeover, admin account approval, and summary counts. All records
//! live behind the backend REST API; this crate renders them and forwards
//! admin actions with the logged-in admin's bearer token.
//!
//! Exposed as a library so the binary, the CLI, and the integration tests
//! share one router and one backend client.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, extract::State, http::StatusCode, routing::get};
use tower_sessions::SessionStore;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use config::ConfigError;
use middleware::{expire_backend_session, security_headers_middleware, session_layer};
use state::AppState;

/// Directory static assets are served from, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/admin/static";

/// Build the full application router with its middleware stack.
///
/// Sentry layers are left to the binary so tests run without a client.
///
/// # Errors
///
/// Returns `ConfigError` if the session store cannot be configured.
pub fn app(state: AppState) -> Result<Router, ConfigError> {
    let store = middleware::session_store(state.pool())?;
    Ok(app_with_session_store(state, store))
}

/// Build the router on top of any session store.
pub fn app_with_session_store<S: SessionStore + Clone>(state: AppState, store: S) -> Router {
    let session_layer = session_layer(store, state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(axum::middleware::from_fn(expire_backend_session))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the session database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match db::ping(state.pool()).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
