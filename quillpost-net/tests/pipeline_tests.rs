//! End-to-end pipeline tests against a scripted transport.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quillpost_core::{ApiError, ClientConfig, Endpoint, RefreshError, RequestEnvelope};
use quillpost_net::{
    ApiClient, IntoMultipart, MultipartField, RequestBody, TokenSource, Transport, TransportError,
    TransportRequest, TransportResponse,
};
use serde::{Deserialize, Serialize};
use url::Url;

// ============================================================================
// Test doubles
// ============================================================================

/// Scripted transport that records every request it sees.
struct MockTransport {
    responses: Mutex<Vec<Result<TransportResponse, TransportError>>>,
    requests: Mutex<Vec<TransportRequest>>,
    calls: AtomicU32,
}

impl MockTransport {
    fn new(responses: Vec<Result<TransportResponse, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
        })
    }

    fn ok(status: u16, body: &str) -> Result<TransportResponse, TransportError> {
        Ok(TransportResponse {
            status,
            body: body.as_bytes().to_vec(),
        })
    }

    fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn recorded(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(TransportError::Other("script exhausted".into()));
        }
        responses.remove(0)
    }
}

/// Token source with a fixed token and a scripted refresh outcome.
struct FakeTokenSource {
    token: Option<String>,
    refreshed: Option<Result<String, RefreshError>>,
    refresh_calls: AtomicU32,
}

impl FakeTokenSource {
    fn with_token(token: &str) -> Arc<Self> {
        Arc::new(Self {
            token: Some(token.to_string()),
            refreshed: None,
            refresh_calls: AtomicU32::new(0),
        })
    }

    fn empty() -> Arc<Self> {
        Arc::new(Self {
            token: None,
            refreshed: None,
            refresh_calls: AtomicU32::new(0),
        })
    }

    fn refreshable(token: &str, refreshed: Result<String, RefreshError>) -> Arc<Self> {
        Arc::new(Self {
            token: Some(token.to_string()),
            refreshed: Some(refreshed),
            refresh_calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl TokenSource for FakeTokenSource {
    async fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }

    async fn refresh(&self) -> Result<String, RefreshError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.refreshed
            .clone()
            .unwrap_or(Err(RefreshError::NoRefreshCredential))
    }
}

fn client(transport: Arc<MockTransport>) -> ApiClient {
    let config = ClientConfig::new(Url::parse("https://api.quillpost.dev").unwrap());
    ApiClient::with_transport(config, transport)
}

// ============================================================================
// Wire types used by the scenarios
// ============================================================================

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    expires_at: String,
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn login_round_trip_decodes_typed_response() {
    let transport = MockTransport::new(vec![MockTransport::ok(
        200,
        r#"{"token":"abc","expires_at":"2025-01-01 00:00:00"}"#,
    )]);
    let client = client(transport.clone());

    let endpoint: Endpoint<LoginRequest, LoginResponse> = Endpoint::post("/users/login");
    let response = client
        .send(RequestEnvelope::new(endpoint).with_body(LoginRequest {
            email: "a@b.com".into(),
            password: "x".into(),
        }))
        .await
        .unwrap();

    assert_eq!(response.token, "abc");
    assert_eq!(response.expires_at, "2025-01-01 00:00:00");

    // The wire body matches the typed input.
    let recorded = transport.recorded();
    assert_eq!(recorded.len(), 1);
    let RequestBody::Json(ref bytes) = recorded[0].body else {
        panic!("expected JSON body");
    };
    let round_tripped: LoginRequest = serde_json::from_slice(bytes).unwrap();
    assert_eq!(
        round_tripped,
        LoginRequest {
            email: "a@b.com".into(),
            password: "x".into(),
        }
    );
}

#[tokio::test]
async fn auth_endpoint_without_token_makes_no_transport_call() {
    let transport = MockTransport::new(vec![MockTransport::ok(200, "{}")]);
    let client = client(transport.clone()).with_token_source(FakeTokenSource::empty());

    let endpoint: Endpoint<(), serde_json::Value> = Endpoint::get("/user").with_auth();
    let result = client.send(RequestEnvelope::new(endpoint)).await;

    assert!(matches!(result, Err(ApiError::Unauthorized)));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn auth_endpoint_without_source_makes_no_transport_call() {
    let transport = MockTransport::new(vec![MockTransport::ok(200, "{}")]);
    let client = client(transport.clone());

    let endpoint: Endpoint<(), serde_json::Value> = Endpoint::get("/user").with_auth();
    let result = client.send(RequestEnvelope::new(endpoint)).await;

    assert!(matches!(result, Err(ApiError::Unauthorized)));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn bearer_header_is_injected() {
    let transport = MockTransport::new(vec![MockTransport::ok(200, r#"{"ok":true}"#)]);
    let client = client(transport.clone()).with_token_source(FakeTokenSource::with_token("tok-1"));

    let endpoint: Endpoint<(), serde_json::Value> = Endpoint::get("/user").with_auth();
    client.send(RequestEnvelope::new(endpoint)).await.unwrap();

    let recorded = transport.recorded();
    let auth = recorded[0]
        .headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case("authorization"))
        .map(|(_, v)| v.clone());
    assert_eq!(auth.as_deref(), Some("Bearer tok-1"));
}

#[tokio::test]
async fn explicit_token_overrides_source() {
    let transport = MockTransport::new(vec![MockTransport::ok(200, r#"{"ok":true}"#)]);
    let client = client(transport.clone()).with_token_source(FakeTokenSource::with_token("stored"));

    let endpoint: Endpoint<(), serde_json::Value> = Endpoint::get("/user").with_auth();
    client
        .send(RequestEnvelope::new(endpoint).with_token("explicit"))
        .await
        .unwrap();

    let recorded = transport.recorded();
    let auth = recorded[0]
        .headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case("authorization"))
        .map(|(_, v)| v.clone());
    assert_eq!(auth.as_deref(), Some("Bearer explicit"));
}

#[tokio::test]
async fn unauthorized_status_maps_to_typed_error() {
    let transport = MockTransport::new(vec![MockTransport::ok(401, "")]);
    let client = client(transport.clone()).with_token_source(FakeTokenSource::with_token("stale"));

    let endpoint: Endpoint<(), serde_json::Value> = Endpoint::get("/user").with_auth();
    let result = client.send(RequestEnvelope::new(endpoint)).await;

    assert!(matches!(result, Err(ApiError::Unauthorized)));
    // Refresh was not possible, so exactly one call went out.
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn refresh_then_retry_exactly_once_on_unauthorized() {
    let transport = MockTransport::new(vec![
        MockTransport::ok(401, ""),
        MockTransport::ok(200, r#"{"name":"jane"}"#),
    ]);
    let source = FakeTokenSource::refreshable("stale", Ok("fresh".to_string()));
    let client = client(transport.clone()).with_token_source(source.clone());

    let endpoint: Endpoint<(), serde_json::Value> = Endpoint::get("/user").with_auth();
    let value = client.send(RequestEnvelope::new(endpoint)).await.unwrap();

    assert_eq!(value["name"], "jane");
    assert_eq!(transport.call_count(), 2);
    assert_eq!(source.refresh_calls.load(Ordering::SeqCst), 1);

    let recorded = transport.recorded();
    let second_auth = recorded[1]
        .headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case("authorization"))
        .map(|(_, v)| v.clone());
    assert_eq!(second_auth.as_deref(), Some("Bearer fresh"));
}

#[tokio::test]
async fn refresh_retry_does_not_loop_on_repeated_unauthorized() {
    let transport = MockTransport::new(vec![MockTransport::ok(401, ""), MockTransport::ok(401, "")]);
    let source = FakeTokenSource::refreshable("stale", Ok("fresh".to_string()));
    let client = client(transport.clone()).with_token_source(source.clone());

    let endpoint: Endpoint<(), serde_json::Value> = Endpoint::get("/user").with_auth();
    let result = client.send(RequestEnvelope::new(endpoint)).await;

    assert!(matches!(result, Err(ApiError::Unauthorized)));
    assert_eq!(transport.call_count(), 2);
    assert_eq!(source.refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_refresh_surfaces_refresh_error() {
    let transport = MockTransport::new(vec![MockTransport::ok(401, "")]);
    let source = FakeTokenSource::refreshable(
        "stale",
        Err(RefreshError::RefreshFailed("upstream 500".into())),
    );
    let client = client(transport.clone()).with_token_source(source);

    let endpoint: Endpoint<(), serde_json::Value> = Endpoint::get("/user").with_auth();
    let result = client.send(RequestEnvelope::new(endpoint)).await;

    assert!(matches!(result, Err(ApiError::Refresh(_))));
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn explicit_token_skips_refresh_on_unauthorized() {
    let transport = MockTransport::new(vec![MockTransport::ok(401, "")]);
    let source = FakeTokenSource::refreshable("stored", Ok("fresh".to_string()));
    let client = client(transport.clone()).with_token_source(source.clone());

    let endpoint: Endpoint<(), serde_json::Value> = Endpoint::get("/user").with_auth();
    let result = client
        .send(RequestEnvelope::new(endpoint).with_token("explicit"))
        .await;

    assert!(matches!(result, Err(ApiError::Unauthorized)));
    assert_eq!(source.refresh_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn server_error_envelope_maps_to_api_error() {
    let transport = MockTransport::new(vec![MockTransport::ok(500, r#"{"error":"db down"}"#)]);
    let client = client(transport);

    let endpoint: Endpoint<(), serde_json::Value> = Endpoint::get("/articles");
    let result = client.send(RequestEnvelope::new(endpoint)).await;

    match result {
        Err(ApiError::Api { message, status }) => {
            assert_eq!(message, "db down");
            assert_eq!(status, 500);
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn transport_failures_are_retried_immediately() {
    let transport = MockTransport::new(vec![
        Err(TransportError::Timeout),
        Err(TransportError::Connect("refused".into())),
        MockTransport::ok(200, r#"{"ok":true}"#),
    ]);
    let client = client(transport.clone());

    let endpoint: Endpoint<(), serde_json::Value> = Endpoint::get("/articles");
    let value = client.send(RequestEnvelope::new(endpoint)).await.unwrap();

    assert_eq!(value["ok"], true);
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test]
async fn transport_failures_exhaust_the_retry_bound() {
    let transport = MockTransport::new(vec![
        Err(TransportError::Timeout),
        Err(TransportError::Timeout),
        Err(TransportError::Timeout),
        MockTransport::ok(200, "{}"),
    ]);
    let client = client(transport.clone());

    let endpoint: Endpoint<(), serde_json::Value> = Endpoint::get("/articles");
    let result = client.send(RequestEnvelope::new(endpoint)).await;

    match result {
        Err(ApiError::Server { status, .. }) => assert!(status.is_none()),
        other => panic!("unexpected: {other:?}"),
    }
    // Default bound is three total attempts.
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test]
async fn status_failures_are_never_retried() {
    let transport = MockTransport::new(vec![MockTransport::ok(503, "")]);
    let client = client(transport.clone());

    let endpoint: Endpoint<(), serde_json::Value> = Endpoint::get("/articles");
    let result = client.send(RequestEnvelope::new(endpoint)).await;

    assert!(matches!(result, Err(ApiError::Server { .. })));
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn invalid_path_fails_before_transport() {
    let transport = MockTransport::new(vec![]);
    let client = client(transport.clone());

    // A scheme-relative path that cannot be joined.
    let endpoint: Endpoint<(), serde_json::Value> = Endpoint::get("https://");
    let result = client.send(RequestEnvelope::new(endpoint)).await;

    assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn multipart_payload_reaches_transport_as_fields() {
    struct Upload {
        title: String,
        data: Vec<u8>,
    }

    impl IntoMultipart for Upload {
        fn into_fields(self) -> Vec<MultipartField> {
            vec![
                MultipartField::text("title", self.title),
                MultipartField::bytes("image", "photo.jpg", "image/jpeg", self.data),
            ]
        }
    }

    let transport = MockTransport::new(vec![MockTransport::ok(200, r#"{"id":"img-1"}"#)]);
    let client = client(transport.clone());

    let base = Url::parse("https://img.example.com").unwrap();
    let endpoint: Endpoint<Upload, serde_json::Value> = Endpoint::post("/3/image")
        .with_base_url(base)
        .with_encoding(quillpost_core::BodyEncoding::Multipart)
        .with_header("Client-ID", "anon-123");

    let value = client
        .send_multipart(RequestEnvelope::new(endpoint).with_body(Upload {
            title: "sunset".into(),
            data: vec![0xFF, 0xD8],
        }))
        .await
        .unwrap();

    assert_eq!(value["id"], "img-1");

    let recorded = transport.recorded();
    assert_eq!(recorded[0].url.as_str(), "https://img.example.com/3/image");
    let RequestBody::Multipart(ref fields) = recorded[0].body else {
        panic!("expected multipart body");
    };
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0], MultipartField::text("title", "sunset"));
}
