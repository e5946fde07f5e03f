//! Axum server setup, shared application state, and graceful shutdown.
//!
//! Contains [`AppState`] (the `Arc`-shared state holding the loaded config,
//! HTTP client, stats, and uptime), [`build_router`] for constructing the
//! Axum router, [`build_http_client`] for the connection-pooled hyper
//! client, and [`shutdown_signal`] for SIGTERM / Ctrl+C handling.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::routing::get;
use axum::Router;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::model::Config;
use crate::config::ConfigVersion;
use crate::health::health_handler;
use crate::proxy;

/// Config is read-only for the life of the process.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    pub version: ConfigVersion,
    pub source_name: String,
    pub loaded_at: Instant,
}

#[derive(Debug)]
pub struct Stats {
    pub rewritten: AtomicU64,
    pub passed_through: AtomicU64,
    pub rejected: AtomicU64,
    pub failed: AtomicU64,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rewritten: AtomicU64::new(0),
            passed_through: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }
}

pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;
pub type HttpClient = Client<HttpsConnector, http_body_util::Full<bytes::Bytes>>;

pub struct AppState {
    pub loaded: LoadedConfig,
    pub http_client: HttpClient,
    pub start_time: Instant,
    pub stats: Stats,
}

impl AppState {
    #[must_use]
    pub fn new(loaded: LoadedConfig) -> Self {
        Self {
            loaded,
            http_client: build_http_client(),
            start_time: Instant::now(),
            stats: Stats::new(),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.loaded.config
    }
}

#[must_use]
pub fn build_http_client() -> HttpClient {
    // More than one rustls crypto provider may be compiled in; pick ring explicitly.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();
    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(30))
        .build(https)
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/boot/{os}/{*path}", get(proxy::boot_handler))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
