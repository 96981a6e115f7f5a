// SPDX-FileCopyrightText: 2026 Classkitty Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Classkitty treasury service.
//!
//! Provides the error type, shared types, and the adapter traits the
//! WhatsApp connection manager is built against. Concrete implementations
//! (filesystem credential store, bridge transport) live in
//! `classkitty-whatsapp`.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ClasskittyError;
pub use types::{
    BroadcastReport, ConnectionState, DisconnectReason, InboundNotice, SessionCredentials,
    TransportEvent,
};

pub use traits::{CredentialStore, TransportHandle, TransportSession, WhatsAppTransport};
