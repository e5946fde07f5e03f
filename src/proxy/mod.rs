//! Boot configuration rewriting handler.
//!
//! [`boot_handler`] serves `GET /boot/{os}/{*path}`: it validates the
//! request ([`request`]), forwards it to the boot API ([`upstream`]),
//! rewrites the store URLs in the returned document ([`document`],
//! [`webviews`]) and answers with the result. A body that does not decode as
//! a boot document is returned as-is. Every failure is answered per request.

pub mod document;
pub mod headers;
pub mod request;
pub mod upstream;
pub mod webviews;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{RawQuery, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};

use crate::error::BootError;
use crate::server::AppState;
use document::{BootResponse, RewriteTarget};
use request::BootRequest;

pub async fn boot_handler(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    RawQuery(query): RawQuery,
    req_headers: HeaderMap,
) -> Response {
    let correlation_id = headers::correlation_id(&req_headers);

    let mut response = match serve_boot(&state, uri.path(), query.as_deref(), &correlation_id).await {
        Ok(response) => response,
        Err(e) => {
            if e.is_client_error() {
                state.stats.rejected.fetch_add(1, Ordering::Relaxed);
                tracing::info!(
                    correlation_id = %correlation_id,
                    path = %uri.path(),
                    error = %e,
                    "boot request rejected"
                );
            } else {
                state.stats.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    correlation_id = %correlation_id,
                    path = %uri.path(),
                    error = %e,
                    "boot request failed"
                );
            }
            e.into_response()
        }
    };

    if let Ok(val) = HeaderValue::from_str(&correlation_id) {
        response.headers_mut().insert(headers::CORRELATION_ID, val);
    }
    response
}

async fn serve_boot(
    state: &AppState,
    path: &str,
    query: Option<&str>,
    correlation_id: &str,
) -> Result<Response, BootError> {
    let config = state.config();
    let boot = BootRequest::parse(path, query, &config.rewrite.store_uri)?;
    let upstream_url = boot.upstream_url(&config.upstream.base_url);

    tracing::info!(
        correlation_id = %correlation_id,
        os = %boot.platform,
        upstream = %upstream_url,
        store_uri = %boot.store_uri,
        "boot request received"
    );

    let upstream = upstream::fetch(
        &state.http_client,
        &upstream_url,
        Duration::from_millis(config.upstream.timeout),
        correlation_id,
    )
    .await?;

    if upstream.status.is_success() {
        tracing::debug!(
            correlation_id = %correlation_id,
            status = upstream.status.as_u16(),
            latency_ms = upstream.latency_ms,
            "api responded"
        );
    } else {
        tracing::warn!(
            correlation_id = %correlation_id,
            status = upstream.status.as_u16(),
            latency_ms = upstream.latency_ms,
            "api answered with non-success status, carrying on"
        );
    }

    let mut document = match BootResponse::from_slice(&upstream.body) {
        Ok(document) => document,
        Err(e) => {
            tracing::warn!(
                correlation_id = %correlation_id,
                error = %e,
                "could not parse api response, passing it through"
            );
            state.stats.passed_through.fetch_add(1, Ordering::Relaxed);
            let passthrough = headers::passthrough_headers(&upstream.headers);
            return Ok((StatusCode::OK, passthrough, upstream.body).into_response());
        }
    };

    document.rewrite(&RewriteTarget {
        store_uri: boot.store_uri.clone(),
        href: format!("{}{}", config.rewrite.local_boot_uri, boot.inbound_path),
        id: boot.boot_id(),
    });

    let body = document.to_json_bytes()?;
    state.stats.rewritten.fetch_add(1, Ordering::Relaxed);

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response())
}
