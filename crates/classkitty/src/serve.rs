// SPDX-FileCopyrightText: 2026 Classkitty Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service wiring: build the manager, attempt a session restore, and run
//! the HTTP façade until the process exits.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use classkitty_config::ClasskittyConfig;
use classkitty_core::error::ClasskittyError;
use classkitty_gateway::{AuthConfig, GatewayState};
use classkitty_whatsapp::{
    BridgeTransport, FsCredentialStore, ManagerEvent, ManagerSettings, RateLimiter,
    WhatsAppManager,
};

pub async fn run(config: ClasskittyConfig) -> Result<(), ClasskittyError> {
    let whatsapp = &config.whatsapp;
    let manager = WhatsAppManager::new(
        Arc::new(FsCredentialStore::new(&whatsapp.session_dir)),
        Arc::new(BridgeTransport::new(whatsapp.bridge_addr.clone())),
        RateLimiter::from_config(whatsapp),
        ManagerSettings::from(whatsapp),
    );

    spawn_event_logger(&manager);

    if manager.restore_session().await {
        info!("stored session found; restore started");
    } else {
        info!("no stored session; pair via the gateway connect endpoint");
    }

    let state = GatewayState::new(
        manager,
        AuthConfig {
            bearer_token: config.gateway.bearer_token.clone(),
        },
        config.service.name.clone(),
    );
    classkitty_gateway::start_server(&config.gateway, state).await
}

/// Mirror manager events into the service log. The gateway is a polling
/// façade, so this is the only always-on subscriber.
fn spawn_event_logger(manager: &WhatsAppManager) {
    let mut events = manager.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ManagerEvent::ConnectionChanged(state)) => {
                    info!(%state, "whatsapp connection state changed");
                }
                Ok(ManagerEvent::QrUpdated(Some(_))) => {
                    info!("pairing QR available; scan it from the admin page");
                }
                Ok(ManagerEvent::QrUpdated(None)) => {
                    info!("pairing QR cleared");
                }
                Ok(ManagerEvent::MessageReceived(notice)) => {
                    info!(from = %notice.from, "inbound whatsapp message");
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event logger lagged behind the manager");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}
