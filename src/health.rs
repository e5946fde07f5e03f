//! `GET /health` endpoint handler.
//!
//! Returns a [`HealthResponse`] JSON payload with the server version,
//! uptime, config source metadata, the effective upstream and store URLs,
//! and cumulative request statistics.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::server::AppState;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub config: ConfigHealth,
    pub stats: StatsResponse,
}

#[derive(Serialize, Deserialize)]
pub struct ConfigHealth {
    pub source: String,
    pub version: String,
    pub loaded_ago_seconds: u64,
    pub upstream: String,
    pub store_uri: String,
}

#[derive(Serialize, Deserialize)]
pub struct StatsResponse {
    pub requests_rewritten: u64,
    pub requests_passed_through: u64,
    pub requests_rejected: u64,
    pub requests_failed: u64,
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let loaded = &state.loaded;

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        config: ConfigHealth {
            source: loaded.source_name.clone(),
            version: loaded.version.short().to_string(),
            loaded_ago_seconds: loaded.loaded_at.elapsed().as_secs(),
            upstream: loaded.config.upstream.base_url.clone(),
            store_uri: loaded.config.rewrite.store_uri.clone(),
        },
        stats: StatsResponse {
            requests_rewritten: state.stats.rewritten.load(Ordering::Relaxed),
            requests_passed_through: state.stats.passed_through.load(Ordering::Relaxed),
            requests_rejected: state.stats.rejected.load(Ordering::Relaxed),
            requests_failed: state.stats.failed.load(Ordering::Relaxed),
        },
    })
}
