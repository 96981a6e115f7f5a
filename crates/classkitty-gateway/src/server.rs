// SPDX-FileCopyrightText: 2026 Classkitty Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Façade HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state.

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use classkitty_config::GatewayConfig;
use classkitty_core::error::ClasskittyError;
use classkitty_whatsapp::WhatsAppManager;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// The process-wide connection manager.
    pub manager: WhatsAppManager,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// Deployment name reported by `/health`.
    pub service_name: String,
    /// Process start time for uptime reporting.
    pub start_time: std::time::Instant,
}

impl GatewayState {
    pub fn new(manager: WhatsAppManager, auth: AuthConfig, service_name: String) -> Self {
        Self {
            manager,
            auth,
            service_name,
            start_time: std::time::Instant::now(),
        }
    }
}

/// Build the façade router.
///
/// `/health` is public; everything under `/v1` goes through bearer auth.
pub fn router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/v1/whatsapp/connect", post(handlers::post_connect))
        .route("/v1/whatsapp/status", get(handlers::get_status))
        .route("/v1/whatsapp/send", post(handlers::post_send))
        .route("/v1/whatsapp/broadcast", post(handlers::post_broadcast))
        .route("/v1/whatsapp/restore", post(handlers::post_restore))
        .route("/v1/whatsapp/disconnect", post(handlers::post_disconnect))
        .route("/v1/whatsapp/reset", post(handlers::post_reset))
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(CorsLayer::permissive())
}

/// Start the façade HTTP server and serve until the process exits.
pub async fn start_server(
    config: &GatewayConfig,
    state: GatewayState,
) -> Result<(), ClasskittyError> {
    if state.auth.bearer_token.is_none() {
        tracing::warn!("gateway auth is disabled; bind only to trusted interfaces");
    }

    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ClasskittyError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| ClasskittyError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use classkitty_test_utils::{MemoryCredentialStore, MockTransport};
    use classkitty_whatsapp::manager::ManagerSettings;
    use classkitty_whatsapp::ratelimit::RateLimiter;

    #[test]
    fn gateway_state_is_clone() {
        let manager = WhatsAppManager::new(
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(MockTransport::new()),
            RateLimiter::from_config(&classkitty_config::WhatsAppConfig::default()),
            ManagerSettings::default(),
        );
        let state = GatewayState::new(
            manager,
            AuthConfig { bearer_token: None },
            "classkitty".to_string(),
        );
        let _cloned = state.clone();
    }
}
