//! Integration tests for the boot handler against a mock boot API.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use bootproxy::config::model::Config;
use bootproxy::config::ConfigVersion;
use bootproxy::health::HealthResponse;
use bootproxy::server::{self, AppState, LoadedConfig};

const BOOT_JSON: &str = r#"{
    "config": {
        "algolia": {"app_id": "7683OW76EQ", "api_key": "secret", "indexes": {"rock": "rebble-appstore-production"}},
        "authentication": {"token": "https://auth.getpebble.com/oauth/token"},
        "href": "https://boot.getpebble.com/api/config/android/v3/1234",
        "id": "upstream-id",
        "locker": {"get": "https://api2.getpebble.com/v2/locker"},
        "webviews": {
            "support/faq": "https://help.getpebble.com/faq",
            "appstore/watchapps": "https://apps.getpebble.com/watchapps",
            "onboarding/get_some_apps": "https://apps.getpebble.com/onboarding"
        }
    }
}"#;

const NOT_JSON: &str = "<html><body>maintenance</body></html>";

const EXACT_JSON: &str = r#"{"config":{"big":123456789012345678901234567890,"dec":1.10,"exp":1e3,"nested":{"zeta":1,"alpha":2},"webviews":{}}}"#;

#[derive(Default)]
struct MockUpstream {
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, String)>>,
}

impl MockUpstream {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last(&self) -> (String, String) {
        self.seen.lock().unwrap().last().cloned().unwrap()
    }
}

async fn mock_handler(State(mock): State<Arc<MockUpstream>>, uri: Uri) -> Response {
    mock.calls.fetch_add(1, Ordering::SeqCst);
    mock.seen.lock().unwrap().push((
        uri.path().to_string(),
        uri.query().unwrap_or("").to_string(),
    ));

    let path = uri.path();
    if path.ends_with("/not-json") {
        (StatusCode::OK, [(header::CONTENT_TYPE, "text/html")], NOT_JSON).into_response()
    } else if path.ends_with("/degraded") {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::CONTENT_TYPE, "application/json")],
            BOOT_JSON,
        )
            .into_response()
    } else if path.ends_with("/moved") {
        (StatusCode::FOUND, [(header::LOCATION, "/api/config/android/v4")]).into_response()
    } else if path.ends_with("/loop") {
        (StatusCode::FOUND, [(header::LOCATION, path.to_string())]).into_response()
    } else if path.ends_with("/exact") {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            EXACT_JSON,
        )
            .into_response()
    } else if path.ends_with("/slow") {
        tokio::time::sleep(Duration::from_secs(2)).await;
        (StatusCode::OK, BOOT_JSON).into_response()
    } else {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            BOOT_JSON,
        )
            .into_response()
    }
}

async fn start_mock_upstream() -> (SocketAddr, Arc<MockUpstream>) {
    let mock = Arc::new(MockUpstream::default());
    let router = Router::new()
        .route("/api/config/{*rest}", get(mock_handler))
        .with_state(Arc::clone(&mock));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (addr, mock)
}

/// Answers every request with a body shorter than its `content-length`,
/// then closes the connection.
async fn start_truncating_upstream() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut chunk = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&chunk[..n]),
                    }
                }
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 4096\r\n\r\n{\"config\":",
                    )
                    .await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

async fn start_proxy(base_url: String, timeout: u64) -> SocketAddr {
    let mut config = Config::default();
    config.upstream.base_url = base_url;
    config.upstream.timeout = timeout;

    let state = Arc::new(AppState::new(LoadedConfig {
        config,
        version: ConfigVersion::Hash("test-hash".into()),
        source_name: "test".into(),
        loaded_at: Instant::now(),
    }));

    let router = server::build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn setup() -> (SocketAddr, Arc<MockUpstream>) {
    let (upstream_addr, mock) = start_mock_upstream().await;
    let proxy = start_proxy(format!("http://{upstream_addr}/api/config/"), 1000).await;
    (proxy, mock)
}

#[tokio::test]
async fn rewrites_store_webviews_href_and_id() {
    let (proxy, mock) = setup().await;

    let url = format!("http://{proxy}/boot/android/v3/1234?app_version=4.4&store_uri=http://x.test");
    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "application/json");

    let body: Value = resp.json().await.unwrap();
    let config = &body["config"];
    assert_eq!(config["webviews"]["support/faq"], "http://x.test/faq");
    assert_eq!(
        config["webviews"]["appstore/watchapps"],
        "http://x.test/watchapps?pebble_color=$$pebble_color$$&hardware=$$hardware$$&uid=$$user_id$$&mid=$$phone_id$$&pid=$$pebble_id$$&$$extras$$"
    );
    assert_eq!(
        config["webviews"]["onboarding/get_some_apps"],
        "https://apps.getpebble.com/onboarding"
    );
    assert_eq!(config["href"], "http://127.0.0.1:8080/boot/android/v3/1234");
    assert_eq!(config["id"], "android/v3/1234");
    assert_eq!(config["algolia"]["indexes"]["rock"], "rebble-appstore-production");
    assert_eq!(config["locker"]["get"], "https://api2.getpebble.com/v2/locker");

    assert_eq!(mock.calls(), 1);
    let (path, query) = mock.last();
    assert_eq!(path, "/api/config/android/v3/1234");
    assert_eq!(query, "app_version=4.4");
}

#[tokio::test]
async fn response_is_tab_indented() {
    let (proxy, _mock) = setup().await;

    let url = format!("http://{proxy}/boot/ios/v1");
    let text = reqwest::get(&url).await.unwrap().text().await.unwrap();
    assert!(text.starts_with("{\n\t\"config\": {\n\t\t\""));
}

#[tokio::test]
async fn default_store_uri_is_used_without_parameter() {
    let (proxy, mock) = setup().await;

    let url = format!("http://{proxy}/boot/ios/v1?locale=en_US&app_version=4.4");
    let body: Value = reqwest::get(&url).await.unwrap().json().await.unwrap();
    assert_eq!(
        body["config"]["webviews"]["support/faq"],
        "https://store.rebble.io/faq"
    );

    let (path, query) = mock.last();
    assert_eq!(path, "/api/config/ios/v1");
    assert_eq!(query, "locale=en_US&app_version=4.4");
}

#[tokio::test]
async fn empty_store_uri_is_not_forwarded() {
    let (proxy, mock) = setup().await;

    let url = format!("http://{proxy}/boot/ios/v1?store_uri=&locale=en_US");
    let body: Value = reqwest::get(&url).await.unwrap().json().await.unwrap();
    assert_eq!(
        body["config"]["webviews"]["support/faq"],
        "https://store.rebble.io/faq"
    );
    assert_eq!(mock.last().1, "locale=en_US");
}

#[tokio::test]
async fn malformed_store_uri_is_rejected_without_upstream_call() {
    let (proxy, mock) = setup().await;

    let url = format!("http://{proxy}/boot/android/v3?store_uri=http://x.test/%01");
    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.text().await.unwrap(), "Invalid store_uri query");

    let url = format!("http://{proxy}/boot/android/v3?store_uri=not%20a%20url");
    assert_eq!(reqwest::get(&url).await.unwrap().status(), 400);

    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn unknown_os_is_rejected_without_upstream_call() {
    let (proxy, mock) = setup().await;

    let url = format!("http://{proxy}/boot/windows/v3/1234");
    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.text().await.unwrap(), "Invalid OS parameter");
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn non_json_body_is_passed_through_unchanged() {
    let (proxy, mock) = setup().await;

    let url = format!("http://{proxy}/boot/android/not-json?store_uri=http://x.test");
    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "text/html");
    assert_eq!(resp.bytes().await.unwrap(), NOT_JSON.as_bytes());
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn non_success_upstream_status_is_still_rewritten() {
    let (proxy, _mock) = setup().await;

    let url = format!("http://{proxy}/boot/ios/degraded");
    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["config"]["id"], "ios/degraded");
}

#[tokio::test]
async fn unreachable_upstream_returns_bad_gateway() {
    // Reserve a port, then free it so nothing is listening there
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = listener.local_addr().unwrap();
    drop(listener);

    let proxy = start_proxy(format!("http://{dead_addr}/api/config/"), 1000).await;

    let url = format!("http://{proxy}/boot/android/v3");
    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), 502);

    // The process is still serving
    let health = reqwest::get(format!("http://{proxy}/health")).await.unwrap();
    assert_eq!(health.status(), 200);
}

#[tokio::test]
async fn slow_upstream_returns_gateway_timeout() {
    let (upstream_addr, mock) = start_mock_upstream().await;
    let proxy = start_proxy(format!("http://{upstream_addr}/api/config/"), 100).await;

    let url = format!("http://{proxy}/boot/ios/slow");
    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), 504);
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn correlation_id_is_echoed() {
    let (proxy, _mock) = setup().await;

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://{proxy}/boot/windows/v1"))
        .header("x-correlation-id", "trace-42")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-correlation-id"], "trace-42");
}

#[tokio::test]
async fn health_counts_outcomes() {
    let (proxy, _mock) = setup().await;

    reqwest::get(format!("http://{proxy}/boot/ios/v1")).await.unwrap();
    reqwest::get(format!("http://{proxy}/boot/ios/not-json")).await.unwrap();
    reqwest::get(format!("http://{proxy}/boot/bsd/v1")).await.unwrap();

    let health: HealthResponse = reqwest::get(format!("http://{proxy}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health.stats.requests_rewritten, 1);
    assert_eq!(health.stats.requests_passed_through, 1);
    assert_eq!(health.stats.requests_rejected, 1);
    assert_eq!(health.stats.requests_failed, 0);
}

#[tokio::test]
async fn untouched_fields_keep_exact_numbers_and_order() {
    let (proxy, _mock) = setup().await;

    let url = format!("http://{proxy}/boot/android/exact");
    let text = reqwest::get(&url).await.unwrap().text().await.unwrap();
    assert!(text.contains("\"big\": 123456789012345678901234567890"), "{text}");
    assert!(text.contains("\"dec\": 1.10"), "{text}");
    assert!(text.contains("\"exp\": 1e3"), "{text}");
    assert!(text.find("\"zeta\"").unwrap() < text.find("\"alpha\"").unwrap());
}

#[tokio::test]
async fn redirects_are_followed_and_final_document_rewritten() {
    let (proxy, mock) = setup().await;

    let url = format!("http://{proxy}/boot/android/moved?store_uri=http://x.test");
    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["config"]["webviews"]["support/faq"], "http://x.test/faq");
    assert_eq!(body["config"]["id"], "android/moved");

    assert_eq!(mock.calls(), 2);
    assert_eq!(mock.last().0, "/api/config/android/v4");
}

#[tokio::test]
async fn endless_redirects_return_bad_gateway() {
    let (proxy, mock) = setup().await;

    let url = format!("http://{proxy}/boot/ios/loop");
    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), 502);
    assert_eq!(mock.calls(), bootproxy::proxy::upstream::MAX_REDIRECTS + 1);
}

#[tokio::test]
async fn truncated_upstream_body_returns_bad_gateway() {
    let upstream = start_truncating_upstream().await;
    let proxy = start_proxy(format!("http://{upstream}/api/config/"), 1000).await;

    let resp = reqwest::get(format!("http://{proxy}/boot/android/v3")).await.unwrap();
    assert_eq!(resp.status(), 502);

    let health: HealthResponse = reqwest::get(format!("http://{proxy}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health.stats.requests_failed, 1);
    assert_eq!(health.stats.requests_passed_through, 0);
}

#[tokio::test]
async fn href_and_id_use_the_decoded_path() {
    let (proxy, mock) = setup().await;

    let url = format!("http://{proxy}/boot/android/a%20b");
    let body: Value = reqwest::get(&url).await.unwrap().json().await.unwrap();
    assert_eq!(body["config"]["id"], "android/a b");
    assert_eq!(body["config"]["href"], "http://127.0.0.1:8080/boot/android/a b");
    assert_eq!(mock.last().0, "/api/config/android/a%20b");
}
