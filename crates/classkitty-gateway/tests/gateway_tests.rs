// SPDX-FileCopyrightText: 2026 Classkitty Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Route-level façade tests driving the router against a mock transport.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use classkitty_core::types::TransportEvent;
use classkitty_gateway::{AuthConfig, GatewayState, router};
use classkitty_test_utils::{MemoryCredentialStore, MockTransport};
use classkitty_whatsapp::manager::{ManagerSettings, WhatsAppManager};
use classkitty_whatsapp::ratelimit::{LimitPolicy, RateLimiter};

struct Fixture {
    app: Router,
    transport: MockTransport,
}

fn fixture(bearer_token: Option<&str>) -> Fixture {
    fixture_with(bearer_token, default_limiter())
}

fn default_limiter() -> RateLimiter {
    RateLimiter::new(
        LimitPolicy {
            max: 3,
            window: Duration::from_secs(3600),
        },
        LimitPolicy {
            max: 5,
            window: Duration::from_secs(1800),
        },
    )
}

fn fixture_with(bearer_token: Option<&str>, limiter: RateLimiter) -> Fixture {
    let transport = MockTransport::new();
    let manager = WhatsAppManager::new(
        Arc::new(MemoryCredentialStore::new()),
        Arc::new(transport.clone()),
        limiter,
        ManagerSettings {
            broadcast_delay: Duration::from_secs(2),
            qr_ttl: Duration::from_secs(60),
            reconnect_pause: Duration::from_millis(100),
        },
    );
    let state = GatewayState::new(
        manager,
        AuthConfig {
            bearer_token: bearer_token.map(str::to_string),
        },
        "kas-kelas-7b".to_string(),
    );
    Fixture {
        app: router(state),
        transport,
    }
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, token: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn health_is_public_and_reports_the_service() {
    let f = fixture(Some("secret"));

    let response = f.app.oneshot(get("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "kas-kelas-7b");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn api_routes_require_the_bearer_token() {
    let f = fixture(Some("secret"));

    let denied = f
        .app
        .clone()
        .oneshot(get("/v1/whatsapp/status", None))
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

    let wrong = f
        .app
        .clone()
        .oneshot(get("/v1/whatsapp/status", Some("guess")))
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let allowed = f
        .app
        .oneshot(get("/v1/whatsapp/status", Some("secret")))
        .await
        .unwrap();
    assert_eq!(allowed.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_token_config_disables_auth() {
    let f = fixture(None);

    let response = f.app.oneshot(get("/v1/whatsapp/status", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn connect_then_status_exposes_the_qr() {
    let f = fixture(Some("secret"));

    let response = f
        .app
        .clone()
        .oneshot(post("/v1/whatsapp/connect", Some("secret"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "started");
    assert_eq!(body["connection_state"], "connecting");

    f.transport
        .emit(TransportEvent::PairingCode("2@abc,def,1".into()))
        .await;
    settle().await;

    let response = f
        .app
        .oneshot(get("/v1/whatsapp/status", Some("secret")))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["connection_state"], "connecting");
    assert_eq!(body["is_ready"], false);
    assert!(
        body["qr_code"]
            .as_str()
            .unwrap()
            .starts_with("data:image/svg+xml;base64,")
    );
}

#[tokio::test]
async fn send_without_a_session_is_conflict() {
    let f = fixture(Some("secret"));

    let response = f
        .app
        .oneshot(post(
            "/v1/whatsapp/send",
            Some("secret"),
            Some(serde_json::json!({"to": "628111@s.whatsapp.net", "text": "halo"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("not connected"));
    assert_eq!(f.transport.sent_count().await, 0);
}

#[tokio::test]
async fn send_on_an_open_session_reports_the_provider_verdict() {
    let f = fixture(Some("secret"));
    f.app
        .clone()
        .oneshot(post("/v1/whatsapp/connect", Some("secret"), None))
        .await
        .unwrap();
    f.transport.emit(TransportEvent::Connected).await;
    settle().await;
    f.transport.fail_sends_to("628000@s.whatsapp.net").await;

    let ok = f
        .app
        .clone()
        .oneshot(post(
            "/v1/whatsapp/send",
            Some("secret"),
            Some(serde_json::json!({"to": "628111@s.whatsapp.net", "text": "iuran kas"})),
        ))
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(json_body(ok).await["sent"], true);

    let rejected = f
        .app
        .oneshot(post(
            "/v1/whatsapp/send",
            Some("secret"),
            Some(serde_json::json!({"to": "628000@s.whatsapp.net", "text": "iuran kas"})),
        ))
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::OK);
    assert_eq!(json_body(rejected).await["sent"], false);
}

#[tokio::test(start_paused = true)]
async fn broadcast_reports_per_destination_counts() {
    let f = fixture(Some("secret"));
    f.app
        .clone()
        .oneshot(post("/v1/whatsapp/connect", Some("secret"), None))
        .await
        .unwrap();
    f.transport.emit(TransportEvent::Connected).await;
    settle().await;
    f.transport.fail_sends_to("628222@s.whatsapp.net").await;

    let response = f
        .app
        .oneshot(post(
            "/v1/whatsapp/broadcast",
            Some("secret"),
            Some(serde_json::json!({
                "to": [
                    "628111@s.whatsapp.net",
                    "628222@s.whatsapp.net",
                    "628333@s.whatsapp.net"
                ],
                "text": "rapat kas besok"
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], 2);
    assert_eq!(body["failed"], 1);
}

#[tokio::test]
async fn restore_without_stored_credentials_reports_false() {
    let f = fixture(Some("secret"));

    let response = f
        .app
        .oneshot(post("/v1/whatsapp/restore", Some("secret"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["restored"], false);
    assert_eq!(f.transport.start_count(), 0);
}

#[tokio::test]
async fn disconnect_is_idempotent() {
    let f = fixture(Some("secret"));

    for _ in 0..2 {
        let response = f
            .app
            .clone()
            .oneshot(post("/v1/whatsapp/disconnect", Some("secret"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["connection_state"], "closed");
    }
}

#[tokio::test(start_paused = true)]
async fn connect_is_rate_limited_with_retry_after() {
    let limiter = RateLimiter::new(
        LimitPolicy {
            max: 3,
            window: Duration::from_secs(3600),
        },
        LimitPolicy {
            max: 1,
            window: Duration::from_secs(1800),
        },
    );
    let f = fixture_with(Some("secret"), limiter);

    let first = f
        .app
        .clone()
        .oneshot(post("/v1/whatsapp/connect", Some("secret"), None))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    f.app
        .clone()
        .oneshot(post("/v1/whatsapp/disconnect", Some("secret"), None))
        .await
        .unwrap();

    let denied = f
        .app
        .oneshot(post("/v1/whatsapp/connect", Some("secret"), None))
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = json_body(denied).await;
    assert!(body["retry_after_secs"].as_u64().unwrap() > 0);
}

#[tokio::test(start_paused = true)]
async fn reset_starts_fresh_pairing() {
    let f = fixture(Some("secret"));
    f.app
        .clone()
        .oneshot(post("/v1/whatsapp/connect", Some("secret"), None))
        .await
        .unwrap();
    f.transport.emit(TransportEvent::Connected).await;
    settle().await;

    let response = f
        .app
        .oneshot(post("/v1/whatsapp/reset", Some("secret"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "started");
    assert_eq!(body["connection_state"], "connecting");
    assert_eq!(f.transport.start_count(), 2);
    assert!(f.transport.start_creds().await.last().unwrap().is_none());
}

#[tokio::test]
async fn bridge_failure_maps_to_bad_gateway() {
    let f = fixture(Some("secret"));
    f.transport.fail_next_start();

    let response = f
        .app
        .oneshot(post("/v1/whatsapp/connect", Some("secret"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("bridge"));
}
