// SPDX-FileCopyrightText: 2026 Classkitty Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits at the seams of the connection manager.
//!
//! The manager is constructed against these traits so tests can substitute
//! an in-memory credential store and a scripted transport.

pub mod credentials;
pub mod transport;

pub use credentials::CredentialStore;
pub use transport::{TransportHandle, TransportSession, WhatsAppTransport};
