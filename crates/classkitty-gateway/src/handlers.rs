// SPDX-FileCopyrightText: 2026 Classkitty Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the façade REST API.
//!
//! Every handler is a thin mapping from the connection manager's
//! operations to status codes: rate limiting becomes 429, a send without
//! an open session becomes 409, a bridge that will not come up becomes
//! 502. Bodies are structured JSON on both the success and error paths.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use classkitty_core::error::ClasskittyError;
use classkitty_core::types::ConnectionState;
use classkitty_whatsapp::ConnectOutcome;

use crate::server::GatewayState;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// Response body for POST /v1/whatsapp/connect and /reset.
#[derive(Debug, Serialize)]
pub struct ConnectResponse {
    /// "started" or "in_progress".
    pub status: String,
    pub connection_state: ConnectionState,
}

/// Response body for rate-limited requests (429).
#[derive(Debug, Serialize)]
pub struct RateLimitedResponse {
    pub error: String,
    /// Seconds until the limit window resets.
    pub retry_after_secs: u64,
}

/// Response body for GET /v1/whatsapp/status.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Current pairing QR as a data URI, when one is live.
    pub qr_code: Option<String>,
    pub connection_state: ConnectionState,
    pub is_ready: bool,
}

/// Request body for POST /v1/whatsapp/send.
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    /// Destination JID or phone number.
    pub to: String,
    /// Message text.
    pub text: String,
}

/// Response body for POST /v1/whatsapp/send.
#[derive(Debug, Serialize)]
pub struct SendResponse {
    /// Whether the provider accepted the message.
    pub sent: bool,
}

/// Request body for POST /v1/whatsapp/broadcast.
#[derive(Debug, Deserialize)]
pub struct BroadcastRequest {
    /// Destination JIDs or phone numbers, sent in order.
    pub to: Vec<String>,
    /// Message text sent to every destination.
    pub text: String,
}

/// Response body for POST /v1/whatsapp/broadcast.
#[derive(Debug, Serialize)]
pub struct BroadcastResponse {
    pub success: usize,
    pub failed: usize,
}

/// Response body for POST /v1/whatsapp/restore.
#[derive(Debug, Serialize)]
pub struct RestoreResponse {
    /// Whether stored credentials existed and a restore was started.
    pub restored: bool,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Deployment name (the class this instance serves).
    pub service: String,
    pub version: String,
    pub uptime_secs: u64,
}

fn connect_outcome_response(outcome: ConnectOutcome, state: &GatewayState) -> Response {
    match outcome {
        ConnectOutcome::Started => (
            StatusCode::OK,
            Json(ConnectResponse {
                status: "started".to_string(),
                connection_state: state.manager.state(),
            }),
        )
            .into_response(),
        ConnectOutcome::InProgress => (
            StatusCode::OK,
            Json(ConnectResponse {
                status: "in_progress".to_string(),
                connection_state: state.manager.state(),
            }),
        )
            .into_response(),
        ConnectOutcome::RateLimited { retry_after } => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(RateLimitedResponse {
                error: "too many connection requests".to_string(),
                retry_after_secs: retry_after.as_secs(),
            }),
        )
            .into_response(),
        ConnectOutcome::Failed => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: "could not reach the whatsapp bridge".to_string(),
            }),
        )
            .into_response(),
    }
}

fn not_connected() -> Response {
    (
        StatusCode::CONFLICT,
        Json(ErrorResponse {
            error: "whatsapp session is not connected".to_string(),
        }),
    )
        .into_response()
}

fn internal_error(error: &ClasskittyError) -> Response {
    tracing::error!(%error, "unexpected handler error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "internal error".to_string(),
        }),
    )
        .into_response()
}

/// POST /v1/whatsapp/connect
///
/// Starts (or restarts) a provider connection. Poll `/status` for the QR.
pub async fn post_connect(State(state): State<GatewayState>) -> Response {
    let outcome = state.manager.initialize().await;
    connect_outcome_response(outcome, &state)
}

/// GET /v1/whatsapp/status
pub async fn get_status(State(state): State<GatewayState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        qr_code: state.manager.qr(),
        connection_state: state.manager.state(),
        is_ready: state.manager.is_ready(),
    })
}

/// POST /v1/whatsapp/send
pub async fn post_send(
    State(state): State<GatewayState>,
    Json(body): Json<SendRequest>,
) -> Response {
    match state.manager.send_message(&body.to, &body.text).await {
        Ok(sent) => (StatusCode::OK, Json(SendResponse { sent })).into_response(),
        Err(ClasskittyError::NotConnected) => not_connected(),
        Err(error) => internal_error(&error),
    }
}

/// POST /v1/whatsapp/broadcast
pub async fn post_broadcast(
    State(state): State<GatewayState>,
    Json(body): Json<BroadcastRequest>,
) -> Response {
    match state.manager.broadcast_message(&body.to, &body.text).await {
        Ok(report) => (
            StatusCode::OK,
            Json(BroadcastResponse {
                success: report.success,
                failed: report.failed,
            }),
        )
            .into_response(),
        Err(ClasskittyError::NotConnected) => not_connected(),
        Err(error) => internal_error(&error),
    }
}

/// POST /v1/whatsapp/restore
pub async fn post_restore(State(state): State<GatewayState>) -> Json<RestoreResponse> {
    let restored = state.manager.restore_session().await;
    Json(RestoreResponse { restored })
}

/// POST /v1/whatsapp/disconnect
///
/// Closes the session, keeping stored credentials. Idempotent.
pub async fn post_disconnect(State(state): State<GatewayState>) -> Json<StatusResponse> {
    state.manager.logout().await;
    Json(StatusResponse {
        qr_code: None,
        connection_state: state.manager.state(),
        is_ready: false,
    })
}

/// POST /v1/whatsapp/reset
///
/// Wipes credentials and starts fresh QR pairing.
pub async fn post_reset(State(state): State<GatewayState>) -> Response {
    let outcome = state.manager.clear_auth_and_reconnect().await;
    connect_outcome_response(outcome, &state)
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: state.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_request_deserializes() {
        let json = r#"{"to": "628111@s.whatsapp.net", "text": "iuran kas"}"#;
        let req: SendRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.to, "628111@s.whatsapp.net");
        assert_eq!(req.text, "iuran kas");
    }

    #[test]
    fn broadcast_request_deserializes_destination_list() {
        let json = r#"{"to": ["a@s.whatsapp.net", "b@s.whatsapp.net"], "text": "rapat"}"#;
        let req: BroadcastRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.to.len(), 2);
    }

    #[test]
    fn status_response_serializes_state_snake_case() {
        let resp = StatusResponse {
            qr_code: None,
            connection_state: ConnectionState::Connecting,
            is_ready: false,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"connection_state\":\"connecting\""));
        assert!(json.contains("\"qr_code\":null"));
    }

    #[test]
    fn rate_limited_response_serializes() {
        let resp = RateLimitedResponse {
            error: "too many connection requests".to_string(),
            retry_after_secs: 1740,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"retry_after_secs\":1740"));
    }

    #[test]
    fn error_response_serializes() {
        let resp = ErrorResponse {
            error: "something went wrong".to_string(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("something went wrong"));
    }
}
