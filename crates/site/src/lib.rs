//! AAA Accident Solutions site library.
//!
//! The public marketing site: service and legal pages from Markdown, a blog,
//! the FAQ, and the three lead forms (claim, contact, testimonial). Leads are
//! posted to the backend REST API; nothing about a visitor is stored here.
//!
//! Exposed as a library so the binary and the integration tests share one
//! router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, extract::State, http::StatusCode, middleware::from_fn, routing::get};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::SessionStore;
use tracing::Span;

use config::ConfigError;
use middleware::{
    csp_nonce_middleware, request_id_middleware, security_headers_middleware, session_layer,
};
use state::AppState;

/// Directory static assets are served from, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/site/static";

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
        .fallback(routes::not_found)
        // Outermost first: the trace span must exist before the request id
        // is recorded on it, and security headers read the nonce that the
        // inner layer leaves on the response.
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|request: &axum::http::Request<_>| {
                            tracing::info_span!(
                                "http_request",
                                method = %request.method(),
                                uri = %request.uri(),
                                request_id = tracing::field::Empty,
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
                .layer(from_fn(request_id_middleware))
                .layer(from_fn(security_headers_middleware))
                .layer(from_fn(csp_nonce_middleware))
                .layer(session_layer),
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
