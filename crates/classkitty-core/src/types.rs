// SPDX-FileCopyrightText: 2026 Classkitty Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared between the connection manager, transport, and façade.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle state of the single WhatsApp session owned by this process.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, Default,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No live socket. Initial state, and where every disconnect lands.
    #[default]
    Closed,
    /// Socket is being established or a pairing code is pending scan.
    Connecting,
    /// Authenticated session, ready to send.
    Open,
}

/// Opaque multi-device session credentials.
///
/// The provider owns the internal structure; the manager only moves the
/// blob between the transport and the credential store and never inspects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCredentials {
    pub blob: serde_json::Value,
}

impl SessionCredentials {
    pub fn new(blob: serde_json::Value) -> Self {
        Self { blob }
    }
}

/// Aggregated result of a broadcast send loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    /// Destinations the provider accepted the message for.
    pub success: usize,
    /// Destinations where the send failed (counted, never aborting the loop).
    pub failed: usize,
}

/// A notify-only record of an inbound WhatsApp message.
///
/// The manager does not reply to these; it surfaces them to subscribers
/// so the treasury app can log them or follow up out of band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundNotice {
    /// Sender JID or phone number.
    pub from: String,
    /// Text content, empty for non-text messages.
    pub text: String,
    /// Provider timestamp, RFC 3339.
    pub timestamp: String,
}

/// Why the provider closed the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The account was unlinked from the phone. Terminal for the session.
    LoggedOut,
    /// Stream conflict: the same session was opened elsewhere. Treated
    /// like a transient drop (manual reconnect required).
    Replaced,
    /// Network drop or any other provider-side close.
    Transient,
}

/// Events emitted by a running transport session.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A fresh pairing payload to be rendered as a QR code.
    PairingCode(String),
    /// The provider rotated session keys; must be persisted write-through.
    CredentialsUpdate(SessionCredentials),
    /// Authentication confirmed; the session is open.
    Connected,
    /// The socket closed.
    Disconnected { reason: DisconnectReason },
    /// An inbound message arrived.
    Message(InboundNotice),
}
