//! HTTP status source against an in-process status endpoint.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    routing::post,
};
use serde_json::{Value, json};

use charge_runtime::{
    ChargeReference, ChargeStatus, ChargeStatusPoller, HttpStatusConfig, HttpStatusSource,
    MemoryCookieStore, Navigator, PollError, PollerConfig, PollerState, Resolution, StatusSource,
};

#[derive(Clone, Debug)]
struct Seen {
    csrf_token: Option<String>,
    cookie: Option<String>,
    content_type: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct Endpoint {
    replies: Arc<Mutex<VecDeque<(StatusCode, String)>>>,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Endpoint {
    fn replying(replies: Vec<(StatusCode, &str)>) -> Self {
        let endpoint = Self::default();
        endpoint.replies.lock().unwrap().extend(
            replies
                .into_iter()
                .map(|(status, body)| (status, body.to_string())),
        );
        endpoint
    }

    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

fn header_value(headers: &HeaderMap, name: impl header::AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn charge_status(
    State(endpoint): State<Endpoint>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    endpoint.seen.lock().unwrap().push(Seen {
        csrf_token: header_value(&headers, "x-csrftoken"),
        cookie: header_value(&headers, header::COOKIE),
        content_type: header_value(&headers, header::CONTENT_TYPE),
        body: serde_json::from_str(&body).unwrap_or(Value::Null),
    });

    endpoint
        .replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| (StatusCode::OK, r#"{"data":{"status":"pending"}}"#.into()))
}

async fn slow_charge_status() -> (StatusCode, String) {
    tokio::time::sleep(Duration::from_millis(500)).await;
    (StatusCode::OK, r#"{"data":{"status":"successful"}}"#.into())
}

async fn serve(endpoint: Endpoint) -> String {
    let app = Router::new()
        .route("/charge/status/", post(charge_status))
        .route("/charge/slow/", post(slow_charge_status))
        .with_state(endpoint);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}/charge/status/")
}

fn source(url: &str, cookies: &str) -> HttpStatusSource {
    HttpStatusSource::new(
        HttpStatusConfig::new(url).unwrap(),
        Arc::new(MemoryCookieStore::from_header(cookies)),
    )
    .unwrap()
}

fn charge() -> ChargeReference {
    ChargeReference::new("chrg_123").unwrap()
}

#[tokio::test]
async fn test_posts_charge_with_csrf_token() {
    let endpoint = Endpoint::replying(vec![(StatusCode::OK, r#"{"data":{"status":"successful"}}"#)]);
    let url = serve(endpoint.clone()).await;

    let result = source(&url, "csrftoken=tok123; sessionid=s1")
        .fetch_status(&charge())
        .await
        .unwrap();
    assert_eq!(result.into_status().unwrap(), ChargeStatus::Successful);

    let seen = endpoint.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].csrf_token.as_deref(), Some("tok123"));
    assert_eq!(seen[0].body, json!({ "charge": "chrg_123" }));
    assert_eq!(seen[0].content_type.as_deref(), Some("application/json"));
    assert!(seen[0].cookie.as_deref().unwrap().contains("csrftoken=tok123"));
}

#[tokio::test]
async fn test_csrf_token_is_read_on_every_request() {
    let endpoint = Endpoint::default();
    let url = serve(endpoint.clone()).await;

    let cookies = Arc::new(MemoryCookieStore::from_header("csrftoken=tok123"));
    let source =
        HttpStatusSource::new(HttpStatusConfig::new(&url).unwrap(), cookies.clone()).unwrap();

    source.fetch_status(&charge()).await.unwrap();
    cookies.set("csrftoken", "rotated");
    source.fetch_status(&charge()).await.unwrap();

    let tokens: Vec<_> = endpoint
        .seen()
        .into_iter()
        .map(|seen| seen.csrf_token)
        .collect();
    assert_eq!(
        tokens,
        vec![Some("tok123".to_string()), Some("rotated".to_string())]
    );
    assert_eq!(endpoint.seen()[1].cookie.as_deref(), Some("csrftoken=rotated"));
}

#[tokio::test]
async fn test_client_honors_configured_timeout() {
    let url = serve(Endpoint::default())
        .await
        .replace("/charge/status/", "/charge/slow/");

    let config = HttpStatusConfig::new(&url)
        .unwrap()
        .with_timeout(Duration::from_millis(100));
    let source = HttpStatusSource::new(config, Arc::new(MemoryCookieStore::new())).unwrap();

    let err = source.fetch_status(&charge()).await.unwrap_err();
    assert!(matches!(err, PollError::Timeout(t) if t == Duration::from_millis(100)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_missing_csrf_cookie_still_sends_request() {
    let endpoint = Endpoint::default();
    let url = serve(endpoint.clone()).await;

    let result = source(&url, "").fetch_status(&charge()).await.unwrap();
    assert_eq!(result.into_status().unwrap(), ChargeStatus::Pending);

    let seen = endpoint.seen();
    assert_eq!(seen[0].csrf_token, None);
    assert_eq!(seen[0].cookie, None);
}

#[tokio::test]
async fn test_rejected_request_is_http_status_error() {
    let endpoint = Endpoint::replying(vec![(StatusCode::FORBIDDEN, "CSRF verification failed")]);
    let url = serve(endpoint).await;

    let err = source(&url, "").fetch_status(&charge()).await.unwrap_err();
    assert!(matches!(err, PollError::HttpStatus(403)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let endpoint = Endpoint::replying(vec![(StatusCode::OK, "<html>oops</html>")]);
    let url = serve(endpoint).await;

    let err = source(&url, "csrftoken=t").fetch_status(&charge()).await.unwrap_err();
    assert!(matches!(err, PollError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_body_without_status_decodes_but_has_no_status() {
    let endpoint = Endpoint::replying(vec![(StatusCode::OK, r#"{"data":{"id":"chrg_123"}}"#)]);
    let url = serve(endpoint).await;

    let result = source(&url, "csrftoken=t").fetch_status(&charge()).await.unwrap();
    assert!(matches!(result.into_status(), Err(PollError::MalformedResponse(_))));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = format!("http://{addr}/charge/status/");
    let err = source(&url, "csrftoken=t").fetch_status(&charge()).await.unwrap_err();
    assert!(matches!(err, PollError::Network(_)));
    assert!(err.is_retryable());
}

#[derive(Default)]
struct CountingNavigator {
    reloads: AtomicUsize,
}

impl Navigator for CountingNavigator {
    fn reload_current_page(&self, _resolution: &Resolution) {
        self.reloads.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_poller_reloads_once_charge_resolves() {
    let endpoint = Endpoint::replying(vec![
        (StatusCode::OK, r#"{"data":{"status":"pending"}}"#),
        (StatusCode::OK, r#"{"data":{"status":"successful"}}"#),
    ]);
    let url = serve(endpoint.clone()).await;
    let navigator = Arc::new(CountingNavigator::default());

    let poller = ChargeStatusPoller::start(
        charge(),
        PollerConfig::from_millis(50).unwrap(),
        Arc::new(source(&url, "csrftoken=tok123")),
        navigator.clone(),
    )
    .unwrap();

    let state = tokio::time::timeout(Duration::from_secs(5), poller.wait())
        .await
        .unwrap();
    let resolution = state.resolution().unwrap();
    assert_eq!(resolution.status, ChargeStatus::Successful);
    assert_eq!(resolution.tick, 2);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(navigator.reloads.load(Ordering::SeqCst), 1);
    assert_eq!(endpoint.seen().len(), 2);
    assert!(endpoint
        .seen()
        .iter()
        .all(|seen| seen.body == json!({ "charge": "chrg_123" })));
}

#[tokio::test]
async fn test_poller_survives_unreachable_endpoint() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let navigator = Arc::new(CountingNavigator::default());
    let poller = ChargeStatusPoller::start(
        charge(),
        PollerConfig::from_millis(20).unwrap(),
        Arc::new(source(&format!("http://{addr}/charge/status/"), "csrftoken=t")),
        navigator.clone(),
    )
    .unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(poller.state(), PollerState::Polling);
    assert_eq!(navigator.reloads.load(Ordering::SeqCst), 0);

    poller.stop();
    assert_eq!(poller.wait().await, PollerState::Cancelled);
}
