// SPDX-FileCopyrightText: 2026 Classkitty Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock WhatsApp transport for deterministic testing.
//!
//! `MockTransport` implements `WhatsAppTransport` with scripted behavior:
//! tests emit provider events into the live session and inspect the
//! messages the manager tried to send.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use classkitty_core::error::ClasskittyError;
use classkitty_core::traits::{TransportHandle, TransportSession, WhatsAppTransport};
use classkitty_core::types::{SessionCredentials, TransportEvent};

/// A scripted provider transport for tests.
///
/// Cloning shares the underlying state, so a test can keep one clone as a
/// controller while the manager owns another behind `Arc<dyn WhatsAppTransport>`.
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    start_count: AtomicUsize,
    close_count: AtomicUsize,
    fail_next_start: AtomicBool,
    /// Artificial delay before `start()` completes, in milliseconds.
    /// Lets tests hold the manager in its initializing window.
    start_delay_ms: AtomicUsize,
    /// Credentials passed to each `start()` call, in order.
    start_creds: Mutex<Vec<Option<SessionCredentials>>>,
    /// Event sender for the most recent session.
    event_tx: Mutex<Option<mpsc::Sender<TransportEvent>>>,
    /// `(to, text)` pairs captured from `send_text`.
    sent: Mutex<Vec<(String, String)>>,
    /// Destinations for which `send_text` reports a provider-level failure.
    failing: Mutex<HashSet<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `start()` was called.
    pub fn start_count(&self) -> usize {
        self.inner.start_count.load(Ordering::SeqCst)
    }

    /// Number of times a session handle was closed.
    pub fn close_count(&self) -> usize {
        self.inner.close_count.load(Ordering::SeqCst)
    }

    /// The credentials each `start()` call received, in call order.
    pub async fn start_creds(&self) -> Vec<Option<SessionCredentials>> {
        self.inner.start_creds.lock().await.clone()
    }

    /// Make the next `start()` call fail with a channel error.
    pub fn fail_next_start(&self) {
        self.inner.fail_next_start.store(true, Ordering::SeqCst);
    }

    /// Delay every `start()` call by the given duration.
    pub fn set_start_delay(&self, delay: std::time::Duration) {
        self.inner
            .start_delay_ms
            .store(delay.as_millis() as usize, Ordering::SeqCst);
    }

    /// Emit a provider event into the most recent session.
    ///
    /// Panics if no session has been started; tests should call `start`
    /// through the manager first.
    pub async fn emit(&self, event: TransportEvent) {
        let tx = self
            .inner
            .event_tx
            .lock()
            .await
            .clone()
            .expect("emit called before any session was started");
        // The manager may have torn the session down; a closed receiver is
        // fine for teardown-race tests.
        let _ = tx.send(event).await;
    }

    /// All `(to, text)` pairs passed to `send_text`, in order.
    pub async fn sent_messages(&self) -> Vec<(String, String)> {
        self.inner.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.inner.sent.lock().await.len()
    }

    /// Make `send_text` report `false` for this destination.
    pub async fn fail_sends_to(&self, destination: &str) {
        self.inner.failing.lock().await.insert(destination.to_string());
    }
}

#[async_trait]
impl WhatsAppTransport for MockTransport {
    async fn start(
        &self,
        creds: Option<SessionCredentials>,
    ) -> Result<TransportSession, ClasskittyError> {
        let delay_ms = self.inner.start_delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay_ms as u64)).await;
        }

        if self.inner.fail_next_start.swap(false, Ordering::SeqCst) {
            return Err(ClasskittyError::Channel {
                message: "mock transport start failure".into(),
                source: None,
            });
        }

        let (tx, rx) = mpsc::channel(32);
        *self.inner.event_tx.lock().await = Some(tx);
        self.inner.start_creds.lock().await.push(creds);
        self.inner.start_count.fetch_add(1, Ordering::SeqCst);

        Ok(TransportSession {
            events: rx,
            handle: Arc::new(MockHandle {
                inner: self.inner.clone(),
            }),
        })
    }
}

struct MockHandle {
    inner: Arc<Inner>,
}

#[async_trait]
impl TransportHandle for MockHandle {
    async fn send_text(&self, to: &str, text: &str) -> Result<bool, ClasskittyError> {
        self.inner
            .sent
            .lock()
            .await
            .push((to.to_string(), text.to_string()));
        let ok = !self.inner.failing.lock().await.contains(to);
        Ok(ok)
    }

    async fn close(&self) {
        self.inner.close_count.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classkitty_core::types::DisconnectReason;

    #[tokio::test]
    async fn start_records_credentials_and_count() {
        let transport = MockTransport::new();
        let creds = SessionCredentials::new(serde_json::json!({"k": 1}));

        let _session = transport.start(Some(creds.clone())).await.unwrap();
        let _session = transport.start(None).await.unwrap();

        assert_eq!(transport.start_count(), 2);
        let seen = transport.start_creds().await;
        assert_eq!(seen[0].as_ref(), Some(&creds));
        assert!(seen[1].is_none());
    }

    #[tokio::test]
    async fn emitted_events_reach_the_session() {
        let transport = MockTransport::new();
        let mut session = transport.start(None).await.unwrap();

        transport
            .emit(TransportEvent::PairingCode("2@abc".into()))
            .await;
        transport
            .emit(TransportEvent::Disconnected {
                reason: DisconnectReason::Transient,
            })
            .await;

        assert!(matches!(
            session.events.recv().await,
            Some(TransportEvent::PairingCode(_))
        ));
        assert!(matches!(
            session.events.recv().await,
            Some(TransportEvent::Disconnected { .. })
        ));
    }

    #[tokio::test]
    async fn send_text_captures_and_honors_failures() {
        let transport = MockTransport::new();
        let session = transport.start(None).await.unwrap();
        transport.fail_sends_to("628000@s.whatsapp.net").await;

        let ok = session.handle.send_text("628111@s.whatsapp.net", "hi").await;
        let failed = session.handle.send_text("628000@s.whatsapp.net", "hi").await;

        assert_eq!(ok.unwrap(), true);
        assert_eq!(failed.unwrap(), false);
        assert_eq!(transport.sent_count().await, 2);
    }

    #[tokio::test]
    async fn fail_next_start_fails_once() {
        let transport = MockTransport::new();
        transport.fail_next_start();
        assert!(transport.start(None).await.is_err());
        assert!(transport.start(None).await.is_ok());
    }
}
