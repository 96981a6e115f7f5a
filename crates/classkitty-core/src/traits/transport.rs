// SPDX-FileCopyrightText: 2026 Classkitty Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport trait for the WhatsApp provider connection.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::ClasskittyError;
use crate::types::{SessionCredentials, TransportEvent};

/// A live provider connection created by [`WhatsAppTransport::start`].
///
/// Dropping the event receiver does not close the socket; the manager
/// calls [`TransportHandle::close`] for that.
pub struct TransportSession {
    /// Events from the provider, in arrival order.
    pub events: mpsc::Receiver<TransportEvent>,
    /// Handle for outbound operations on this session.
    pub handle: Arc<dyn TransportHandle>,
}

/// Outbound operations on a live session.
#[async_trait]
pub trait TransportHandle: Send + Sync {
    /// Send a text message.
    ///
    /// `Ok(false)` is a provider-level rejection (invalid JID, temporary
    /// failure); `Err` is reserved for transport breakage.
    async fn send_text(&self, to: &str, text: &str) -> Result<bool, ClasskittyError>;

    /// Close the underlying socket. Idempotent.
    async fn close(&self);
}

/// Factory for provider connections.
///
/// Exactly one session should be live per process; enforcing that is the
/// connection manager's job, not the transport's.
#[async_trait]
pub trait WhatsAppTransport: Send + Sync + 'static {
    /// Open a connection bound to stored credentials, or begin fresh
    /// QR-based pairing when `creds` is `None`.
    async fn start(
        &self,
        creds: Option<SessionCredentials>,
    ) -> Result<TransportSession, ClasskittyError>;
}
