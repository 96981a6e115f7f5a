// SPDX-FileCopyrightText: 2026 Classkitty Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable storage of opaque session credentials.

use async_trait::async_trait;

use crate::error::ClasskittyError;
use crate::types::SessionCredentials;

/// Persistence of multi-device session credentials.
///
/// The store is exclusively owned by this process. Credentials are written
/// through on every provider update so that on-disk state reflects the
/// latest in-memory state before any send is attempted after a restart.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Load stored credentials.
    ///
    /// A missing or unreadable store means "no prior session" and returns
    /// `None`; this never fails the caller.
    async fn load(&self) -> Option<SessionCredentials>;

    /// Persist credentials. Must complete before the in-memory state is
    /// considered authoritative.
    async fn save(&self, creds: &SessionCredentials) -> Result<(), ClasskittyError>;

    /// Delete all stored material. Idempotent: absent material is not an error.
    async fn clear(&self) -> Result<(), ClasskittyError>;
}
