// SPDX-FileCopyrightText: 2026 Classkitty Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp session management for the Classkitty treasury service.
//!
//! The [`WhatsAppManager`] owns the one provider session this process may
//! hold and drives its lifecycle: QR pairing, credential persistence,
//! rate-limited connection attempts, paced broadcasts, and manual
//! reconnect semantics. The provider itself sits behind the
//! [`WhatsAppTransport`](classkitty_core::traits::WhatsAppTransport)
//! trait; production wiring uses [`BridgeTransport`] against a local
//! WhatsApp Web bridge process.

pub mod creds;
pub mod manager;
pub mod qr;
pub mod ratelimit;
pub mod transport;

pub use creds::FsCredentialStore;
pub use manager::{ConnectOutcome, ManagerEvent, ManagerSettings, WhatsAppManager};
pub use ratelimit::{DEFAULT_IDENTIFIER, LimitPolicy, RateLimiter};
pub use transport::BridgeTransport;
