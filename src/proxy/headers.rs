//! Header construction for the upstream request and the response.
//!
//! [`build_upstream_headers`] produces the small, fixed header set sent to
//! the boot API (the inbound headers are not forwarded).
//! [`passthrough_headers`] keeps only what describes an unmodified upstream
//! body.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

pub const CORRELATION_ID: HeaderName = HeaderName::from_static("x-correlation-id");

const VIA: &str = "1.1 bootproxy";

/// Reuse the caller's correlation ID or mint a new one.
#[must_use]
pub fn correlation_id(inbound: &HeaderMap) -> String {
    inbound
        .get(&CORRELATION_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from)
}

#[must_use]
pub fn build_upstream_headers(target_url: &url::Url, correlation_id: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();

    if let Some(host) = target_url.host_str() {
        let host_value = target_url
            .port()
            .map_or_else(|| host.to_string(), |port| format!("{host}:{port}"));
        if let Ok(val) = HeaderValue::from_str(&host_value) {
            headers.insert(header::HOST, val);
        }
    }

    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(header::VIA, HeaderValue::from_static(VIA));

    if let Ok(val) = HeaderValue::from_str(correlation_id) {
        headers.insert(CORRELATION_ID, val);
    }

    headers
}

/// Headers kept when the upstream body is returned unmodified.
#[must_use]
pub fn passthrough_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(content_type) = upstream.get(header::CONTENT_TYPE) {
        headers.insert(header::CONTENT_TYPE, content_type.clone());
    }
    headers
}
