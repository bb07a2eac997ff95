//! Tests for the callback server

use super::*;
use axum::{
    body::Body,
    http::{header, Request},
};
use tower::ServiceExt;
use tracing_test::traced_test;

const REDIRECT_PAGE: &str = "<html>redirect</html>";
const SUCCESS_PAGE: &str = "<html>success</html>";

fn test_state() -> (Arc<CallbackState>, oneshot::Receiver<String>) {
    CallbackState::new(REDIRECT_PAGE.to_string(), SUCCESS_PAGE.to_string())
}

async fn get(state: &Arc<CallbackState>, uri: &str) -> (StatusCode, Option<String>, String) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = router(Arc::clone(state)).oneshot(request).await.unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

async fn bind_local() -> CallbackServer {
    CallbackServer::bind(SocketAddr::from(([127, 0, 0, 1], 0)), "127.0.0.1")
        .await
        .expect("Failed to bind callback server")
}

#[tokio::test]
async fn test_root_and_start_serve_redirect_page() {
    let (state, _rx) = test_state();

    for uri in ["/", "/start"] {
        let (status, content_type, body) = get(&state, uri).await;

        assert_eq!(status, StatusCode::OK, "uri: {}", uri);
        assert_eq!(content_type.as_deref(), Some("text/html; charset=utf-8"));
        assert_eq!(body, REDIRECT_PAGE);
    }
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let (state, _rx) = test_state();

    let (status, _, body) = get(&state, "/favicon.ico").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Not Found");
    assert!(state.captured_code().is_none());
}

#[tokio::test]
async fn test_callback_captures_code() {
    let (state, mut rx) = test_state();

    let (status, _, body) = get(&state, "/callback?code=abc123&state=ignored").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, SUCCESS_PAGE);
    assert_eq!(state.captured_code(), Some("abc123"));
    assert_eq!(rx.try_recv().unwrap(), "abc123");
}

#[tokio::test]
async fn test_callback_decodes_percent_encoded_code() {
    let (state, _rx) = test_state();

    get(&state, "/callback?code=a%2Bb%20c").await;

    assert_eq!(state.captured_code(), Some("a+b c"));
}

#[tokio::test]
async fn test_callback_without_code_is_client_error() {
    let (state, mut rx) = test_state();

    for uri in ["/callback", "/callback?code=", "/callback?state=xyz"] {
        let (status, _, body) = get(&state, uri).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "uri: {}", uri);
        assert_eq!(body, "No code received");
    }
    assert!(state.captured_code().is_none());
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
#[traced_test]
async fn test_second_callback_does_not_overwrite_code() {
    let (state, _rx) = test_state();

    get(&state, "/callback?code=first").await;
    let (status, _, _) = get(&state, "/callback?code=second").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.captured_code(), Some("first"));
    assert!(logs_contain("Ignoring additional callback"));
}

#[tokio::test]
async fn test_bound_server_urls_use_actual_port() {
    let server = CallbackServer::bind(SocketAddr::from(([127, 0, 0, 1], 0)), "localhost")
        .await
        .unwrap();
    let port = server.local_addr().unwrap().port();

    assert_ne!(port, 0);
    assert_eq!(
        server.start_url().as_str(),
        format!("http://localhost:{}/", port)
    );
    assert_eq!(
        server.callback_url().as_str(),
        format!("http://localhost:{}/callback", port)
    );
}

#[tokio::test]
async fn test_bind_fails_when_port_taken() {
    let first = bind_local().await;
    let addr = first.local_addr().unwrap();

    let result = CallbackServer::bind(addr, "localhost").await;

    assert!(matches!(result, Err(SetupError::ServerBind { .. })));
}

#[tokio::test]
async fn test_wait_for_code_returns_code_and_stops_server() {
    let server = bind_local().await;
    let addr = server.local_addr().unwrap();
    let callback_url = format!("{}?code=live-code", server.callback_url());
    let running = server.start(REDIRECT_PAGE.to_string(), SUCCESS_PAGE.to_string());

    let client = tokio::spawn(async move {
        let response = reqwest::get(callback_url).await.unwrap();
        (response.status(), response.text().await.unwrap())
    });

    let code = running
        .wait_for_code(Duration::from_secs(10))
        .await
        .unwrap();

    assert_eq!(code, "live-code");
    let (status, body) = client.await.unwrap();
    assert_eq!(status.as_u16(), 200);
    assert_eq!(body, SUCCESS_PAGE);
    assert!(reqwest::get(format!("http://{}/", addr)).await.is_err());
}

#[tokio::test]
async fn test_wait_for_code_times_out() {
    let server = bind_local().await;
    let addr = server.local_addr().unwrap();
    let running = server.start(REDIRECT_PAGE.to_string(), SUCCESS_PAGE.to_string());

    let result = running.wait_for_code(Duration::from_millis(200)).await;

    assert!(matches!(result, Err(SetupError::CallbackTimeout(d)) if d == Duration::from_millis(200)));
    assert!(std::net::TcpListener::bind(addr).is_ok());
}

#[tokio::test]
async fn test_wait_ignores_callbacks_without_code() {
    let server = bind_local().await;
    let base = server.start_url().clone();
    let running = server.start(REDIRECT_PAGE.to_string(), SUCCESS_PAGE.to_string());

    let client = tokio::spawn(async move {
        let missing = reqwest::get(base.join("callback").unwrap()).await.unwrap();
        let page = reqwest::get(base.clone()).await.unwrap();
        (missing.status().as_u16(), page.status().as_u16())
    });

    let result = running.wait_for_code(Duration::from_millis(500)).await;

    assert_eq!(client.await.unwrap(), (400, 200));
    assert!(matches!(result, Err(SetupError::CallbackTimeout(_))));
}

#[tokio::test]
async fn test_shutdown_without_code() {
    let server = bind_local().await;
    let addr = server.local_addr().unwrap();
    let running = server.start(REDIRECT_PAGE.to_string(), SUCCESS_PAGE.to_string());

    assert!(running.captured_code().is_none());
    running.shutdown().await;

    assert!(std::net::TcpListener::bind(addr).is_ok());
}

#[tokio::test]
async fn test_code_survives_server_stopping_before_wait() {
    for _ in 0..40 {
        let server = bind_local().await;
        let callback_url = format!("{}?code=live-code", server.callback_url());
        let running = server.start(REDIRECT_PAGE.to_string(), SUCCESS_PAGE.to_string());

        let response = reqwest::get(callback_url).await.unwrap();
        assert_eq!(response.status().as_u16(), 200);

        // Give the handler's shutdown request time to stop the serve loop.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(running.captured_code(), Some("live-code"));

        let code = running.wait_for_code(Duration::from_secs(5)).await.unwrap();
        assert_eq!(code, "live-code");
    }
}
