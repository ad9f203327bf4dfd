//! Integration tests for the reqwest transport and the full pipeline against
//! a mock admin backend.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::tempdir;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vigor_application::ports::{Attempt, HttpTransport, PreparedRequest, TransportError};
use vigor_application::{AdminClient, ApplicationError};
use vigor_domain::{ApiRequest, TokenPair};
use vigor_infrastructure::{FileStore, ReqwestTransport, SystemClock};

fn transport(server: &MockServer) -> ReqwestTransport {
    let base = Url::parse(&server.uri()).unwrap();
    ReqwestTransport::new(&base, "v1", "VigorAdmin/test").unwrap()
}

fn prepared(request: ApiRequest, token: Option<&str>, timeout: Duration) -> PreparedRequest {
    PreparedRequest::new(
        Arc::new(request),
        token.map(str::to_string),
        Attempt::FIRST,
        timeout,
    )
}

#[tokio::test]
async fn test_sends_bearer_to_versioned_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/users"))
        .and(query_param("page", "2"))
        .and(header("authorization", "Bearer a1"))
        .and(header("user-agent", "VigorAdmin/test"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Request-Id", "abc")
                .set_body_json(json!({ "status": "success", "message": "ok", "data": [] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = ApiRequest::get("/users").with_query("page", 2);
    let response = transport(&server)
        .execute(&prepared(request, Some("a1"), Duration::from_secs(5)))
        .await
        .unwrap();

    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(response.header("x-request-id"), Some("abc"));
    assert!(response.envelope::<serde_json::Value>().unwrap().is_success());
}

#[tokio::test]
async fn test_sends_json_body_without_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/admin/login"))
        .and(body_json(json!({ "email": "admin@vigor.bike" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "success", "message": "OTP sent" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = ApiRequest::post("/auth/admin/login")
        .with_json(&json!({ "email": "admin@vigor.bike" }))
        .unwrap();
    let response = transport(&server)
        .execute(&prepared(request, None, Duration::from_secs(5)))
        .await
        .unwrap();

    assert_eq!(response.error_message(), "OTP sent");
    let received = server.received_requests().await.unwrap();
    assert!(received[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_error_status_is_a_response() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/orders/9"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "status": "error", "message": "Order not found" })),
        )
        .mount(&server)
        .await;

    let response = transport(&server)
        .execute(&prepared(ApiRequest::delete("/orders/9"), Some("a1"), Duration::from_secs(5)))
        .await
        .unwrap();

    assert_eq!(response.status.as_u16(), 404);
    assert_eq!(response.error_message(), "Order not found");
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/blogs"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let result = transport(&server)
        .execute(&prepared(ApiRequest::get("/blogs"), None, Duration::from_millis(100)))
        .await;

    assert_eq!(result.unwrap_err(), TransportError::Timeout { timeout_ms: 100 });
}

#[tokio::test]
async fn test_unreachable_server_is_connection_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let base = Url::parse(&format!("http://127.0.0.1:{port}")).unwrap();
    let transport = ReqwestTransport::new(&base, "v1", "VigorAdmin/test").unwrap();
    let result = transport
        .execute(&prepared(ApiRequest::get("/users"), None, Duration::from_secs(5)))
        .await;

    assert!(matches!(result, Err(TransportError::ConnectionFailed(_))));
}

#[tokio::test]
async fn test_pipeline_refreshes_and_persists_new_pair() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/orders"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "status": "error", "message": "jwt expired" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/admin/refresh-token"))
        .and(body_json(json!({ "token": "r1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": "Token refreshed",
            "data": { "accessToken": "a2", "refreshToken": "r2" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/orders"))
        .and(header("authorization", "Bearer a2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": "ok",
            "data": [{ "id": "o1" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().expect("Failed to create temp directory");
    let session = dir.path().join("session.json");
    let client = AdminClient::builder(Arc::new(transport(&server)), Arc::new(SystemClock::new()))
        .storage(Arc::new(FileStore::new(&session)))
        .build();
    client.tokens().set_tokens(&TokenPair::new("a1", "r1")).await.unwrap();

    let orders: Vec<serde_json::Value> = client.data(&ApiRequest::get("/orders")).await.unwrap();

    assert_eq!(orders[0]["id"], "o1");
    let content = std::fs::read_to_string(&session).unwrap();
    assert!(content.contains("\"a2\"") && content.contains("\"r2\""));
}

#[tokio::test]
async fn test_pipeline_rejected_refresh_expires_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/settings"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/admin/refresh-token"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "status": "error", "message": "Invalid refresh token" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = AdminClient::builder(Arc::new(transport(&server)), Arc::new(SystemClock::new())).build();
    let mut events = client.subscribe();
    client.tokens().set_tokens(&TokenPair::new("a1", "r1")).await.unwrap();

    let err = client.send(&ApiRequest::get("/settings")).await.unwrap_err();

    assert!(matches!(err, ApplicationError::SessionExpired(_)));
    assert!(client.tokens().tokens().await.is_none());
    assert!(events.recv().await.unwrap().is_expired());
}
