// SPDX-FileCopyrightText: 2026 Classkitty Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Classkitty integration tests.
//!
//! Provides a scripted [`MockTransport`] standing in for the WhatsApp
//! provider connection and an in-memory [`MemoryCredentialStore`], so the
//! connection manager can be driven deterministically without a network.

pub mod memory_store;
pub mod mock_transport;

pub use memory_store::MemoryCredentialStore;
pub use mock_transport::MockTransport;
