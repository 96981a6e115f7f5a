// SPDX-FileCopyrightText: 2026 Classkitty Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory credential store for tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use classkitty_core::error::ClasskittyError;
use classkitty_core::traits::CredentialStore;
use classkitty_core::types::SessionCredentials;

/// A credential store backed by process memory.
///
/// Cloning shares the stored blob, so tests can hold a controller clone
/// while the manager owns another behind `Arc<dyn CredentialStore>`.
#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    creds: Mutex<Option<SessionCredentials>>,
    save_count: AtomicUsize,
    clear_count: AtomicUsize,
    fail_next_clear: AtomicBool,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with prior-session credentials.
    pub async fn with_credentials(creds: SessionCredentials) -> Self {
        let store = Self::new();
        *store.inner.creds.lock().await = Some(creds);
        store
    }

    /// The currently stored credentials, if any.
    pub async fn stored(&self) -> Option<SessionCredentials> {
        self.inner.creds.lock().await.clone()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.creds.lock().await.is_none()
    }

    pub fn save_count(&self) -> usize {
        self.inner.save_count.load(Ordering::SeqCst)
    }

    pub fn clear_count(&self) -> usize {
        self.inner.clear_count.load(Ordering::SeqCst)
    }

    /// Make the next `clear()` call fail, leaving the blob in place.
    pub fn fail_next_clear(&self) {
        self.inner.fail_next_clear.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Option<SessionCredentials> {
        self.inner.creds.lock().await.clone()
    }

    async fn save(&self, creds: &SessionCredentials) -> Result<(), ClasskittyError> {
        *self.inner.creds.lock().await = Some(creds.clone());
        self.inner.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn clear(&self) -> Result<(), ClasskittyError> {
        if self.inner.fail_next_clear.swap(false, Ordering::SeqCst) {
            return Err(ClasskittyError::Credential {
                source: Box::new(std::io::Error::other("mock clear failure")),
            });
        }
        *self.inner.creds.lock().await = None;
        self.inner.clear_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_returns_none_when_empty() {
        let store = MemoryCredentialStore::new();
        assert!(store.load().await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = MemoryCredentialStore::new();
        let creds = SessionCredentials::new(serde_json::json!({"device": 7}));
        store.save(&creds).await.unwrap();

        assert_eq!(store.load().await, Some(creds));
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn fail_next_clear_fails_once_and_keeps_the_blob() {
        let store =
            MemoryCredentialStore::with_credentials(SessionCredentials::new(serde_json::json!({})))
                .await;
        store.fail_next_clear();

        assert!(store.clear().await.is_err());
        assert!(!store.is_empty().await);
        assert_eq!(store.clear_count(), 0);

        store.clear().await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let store =
            MemoryCredentialStore::with_credentials(SessionCredentials::new(serde_json::json!({})))
                .await;
        store.clear().await.unwrap();
        store.clear().await.unwrap();

        assert!(store.is_empty().await);
        assert_eq!(store.clear_count(), 2);
    }
}
