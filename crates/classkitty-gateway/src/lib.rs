// SPDX-FileCopyrightText: 2026 Classkitty Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP façade for the Classkitty WhatsApp connection manager.
//!
//! Exposes the manager's operations as a small REST API for the treasury
//! web app: connect, status (with the live pairing QR), send, broadcast,
//! restore, disconnect, and full reset, plus an unauthenticated `/health`.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use server::{GatewayState, router, start_server};
