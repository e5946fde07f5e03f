//! Single outbound call to the boot API.
//!
//! [`fetch`] sends one GET, follows up to [`MAX_REDIRECTS`] redirects and
//! collects the final body, all under one timeout. Every failure is returned
//! as a [`BootError`]; the status code of a completed exchange is left for
//! the caller to judge.

use std::time::{Duration, Instant};

use axum::http::{header, HeaderMap};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::StatusCode;
use url::Url;

use super::headers::build_upstream_headers;
use crate::error::BootError;
use crate::server::HttpClient;

/// Redirect hops followed before giving up.
pub const MAX_REDIRECTS: usize = 10;

#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub latency_ms: u64,
}

#[allow(clippy::cast_possible_truncation)]
pub async fn fetch(
    client: &HttpClient,
    url: &str,
    timeout: Duration,
    correlation_id: &str,
) -> Result<UpstreamResponse, BootError> {
    let parsed_url = Url::parse(url).map_err(|e| BootError::UpstreamRequest(e.to_string()))?;

    let start = Instant::now();
    let exchange = async {
        let mut target = url.to_string();
        let mut target_url = parsed_url;
        let mut hops = 0;

        let response = loop {
            let req = build_request(&target, &target_url, correlation_id)?;
            let response = client
                .request(req)
                .await
                .map_err(|e| BootError::UpstreamUnavailable {
                    source: Box::new(e),
                })?;

            if !is_redirect(response.status()) {
                break response;
            }
            if hops == MAX_REDIRECTS {
                return Err(BootError::UpstreamRedirect(format!(
                    "stopped after {MAX_REDIRECTS} redirects"
                )));
            }

            let next = redirect_target(&target_url, response.headers())?;
            tracing::debug!(
                correlation_id = %correlation_id,
                status = response.status().as_u16(),
                location = %next,
                "following api redirect"
            );
            target = next.to_string();
            target_url = next;
            hops += 1;
        };

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| BootError::UpstreamRead {
                source: Box::new(e),
            })?
            .to_bytes();

        Ok::<_, BootError>((status, headers, body))
    };

    let timeout_ms = timeout.as_millis() as u64;
    let (status, headers, body) = tokio::time::timeout(timeout, exchange)
        .await
        .map_err(|_| BootError::UpstreamTimeout(timeout_ms))??;

    Ok(UpstreamResponse {
        status,
        headers,
        body,
        latency_ms: start.elapsed().as_millis() as u64,
    })
}

fn build_request(
    target: &str,
    target_url: &Url,
    correlation_id: &str,
) -> Result<hyper::Request<Full<Bytes>>, BootError> {
    let headers = build_upstream_headers(target_url, correlation_id);

    let mut req_builder = hyper::Request::builder()
        .method(hyper::Method::GET)
        .uri(target);
    for (key, value) in &headers {
        req_builder = req_builder.header(key, value);
    }
    req_builder
        .body(Full::new(Bytes::new()))
        .map_err(|e| BootError::UpstreamRequest(e.to_string()))
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

/// Resolve `Location` against the URL that answered with it.
fn redirect_target(current: &Url, headers: &HeaderMap) -> Result<Url, BootError> {
    let location = headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| BootError::UpstreamRedirect("redirect without a usable Location".into()))?;
    current
        .join(location)
        .map_err(|e| BootError::UpstreamRedirect(format!("bad Location '{location}': {e}")))
}
