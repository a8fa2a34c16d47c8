//! AAA Accident Solutions admin - back-office panel.
//!
//! Serves the admin panel on port 3001.
//!
//! # Architecture
//!
//! - Axum web framework
//! - Askama templates with HTMX fragments and SSE for live conversations
//! - Backend REST API for every record (conversations, admins, counts)
//! - `PostgreSQL` for server-side sessions only

#![cfg_attr(not(test), forbid(unsafe_code))]

use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use secrecy::ExposeSecret;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aaa_admin::backend::BackendClient;
use aaa_admin::config::{AdminConfig, TlsConfig};
use aaa_admin::db;
use aaa_admin::state::AppState;

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &AdminConfig) -> Option<sentry::ClientInitGuard> {
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
            // Chat transcripts carry visitor PII; keep it out of Sentry.
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
        .unwrap_or_else(|_| "aaa_admin=info,tower_http=info".into());

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
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let config = AdminConfig::from_env().expect("Failed to load admin configuration");

    // Sentry before tracing so the tracing layer has a client to report to
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    // The session table is created by `aaa-cli migrate admin`, not here.
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to the session database");

    let backend = BackendClient::new(&config.backend).expect("Failed to build backend client");
    tracing::info!(
        backend = %config.backend.base_url,
        poll_interval_ms = config.viewer.poll_interval.as_millis(),
        reply_refetch_delay_ms = config.viewer.reply_refetch_delay.as_millis(),
        "Backend client ready"
    );

    let app = aaa_admin::app(AppState::new(config.clone(), pool, backend))
        .expect("Failed to build admin router")
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    match &config.tls {
        Some(tls) => serve_tls(app, addr, tls).await,
        None => {
            tracing::info!(%addr, "Admin panel listening (http)");
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .expect("Failed to bind admin address");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .expect("Admin server error");
        }
    }
}

/// Serve over TLS, draining open SSE streams for up to 30s on shutdown.
async fn serve_tls(app: axum::Router, addr: std::net::SocketAddr, tls: &TlsConfig) {
    let rustls_config = RustlsConfig::from_pem(
        tls.cert_pem.as_bytes().to_vec(),
        tls.key_pem.expose_secret().as_bytes().to_vec(),
    )
    .await
    .expect("Failed to load TLS certificate and key");

    let handle = Handle::new();
    let drain = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        drain.graceful_shutdown(Some(std::time::Duration::from_secs(30)));
    });

    tracing::info!(%addr, "Admin panel listening (https)");
    axum_server::bind_rustls(addr, rustls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .expect("Admin server error");
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

    tracing::info!("Shutting down admin panel");
}
