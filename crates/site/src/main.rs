//! AAA Accident Solutions site - public marketing site.
//!
//! Serves the site on port 3000.
//!
//! # Architecture
//!
//! - Axum web framework
//! - Askama templates for server-side rendering
//! - Markdown content (services, legal pages, FAQ, blog) loaded at startup
//! - Backend REST API for claims, inquiries and testimonials
//! - `PostgreSQL` for server-side sessions only

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aaa_site::config::SiteConfig;
use aaa_site::content::ContentStore;
use aaa_site::db;
use aaa_site::services::LeadsClient;
use aaa_site::state::AppState;

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &SiteConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            // Claim forms carry names, addresses and policy numbers.
            send_default_pii: false,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "aaa_site=info,tower_http=info".into());

    // JSON lines when deployed, readable text locally
    let deployed = std::env::var("FLY_APP_NAME").is_ok();
    let json_layer = deployed.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!deployed).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let config = SiteConfig::from_env().expect("Failed to load site configuration");

    // Sentry before tracing so the tracing layer has a client to report to
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    // The session table is created by `aaa-cli migrate site`, not here.
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to the session database");

    let content = ContentStore::load(&config.content_dir).expect("Failed to load site content");
    tracing::info!(
        dir = %config.content_dir.display(),
        services = content.services().len(),
        posts = content.get_published_posts().count(),
        "Content loaded"
    );

    let leads = LeadsClient::new(config.backend_url.clone(), config.backend_timeout)
        .expect("Failed to build leads client");
    tracing::info!(backend = %config.backend_url, "Leads client ready");

    let app = aaa_site::app(AppState::new(config.clone(), pool, content, leads))
        .expect("Failed to build site router")
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind site address");
    tracing::info!(%addr, "Site listening");

    // Peer addresses feed the rate limiter when no proxy header is present
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Site server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutting down site");
}
