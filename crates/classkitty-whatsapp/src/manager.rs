// SPDX-FileCopyrightText: 2026 Classkitty Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The WhatsApp connection manager.
//!
//! Owns the single provider session for the process and exposes the
//! operations the treasury façade needs: initialize, send, broadcast,
//! restore, logout, and full reset. State changes, QR updates, and inbound
//! messages fan out to subscribers over a broadcast channel.
//!
//! Reconnection policy is deliberately manual: a transient drop lands the
//! manager in `Closed` and stays there until an operator (or the startup
//! restore path) asks for a new connection.

use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use classkitty_config::WhatsAppConfig;
use classkitty_core::error::ClasskittyError;
use classkitty_core::traits::{CredentialStore, TransportHandle, WhatsAppTransport};
use classkitty_core::types::{
    BroadcastReport, ConnectionState, DisconnectReason, InboundNotice, TransportEvent,
};

use crate::qr;
use crate::ratelimit::{DEFAULT_IDENTIFIER, RateLimiter};

const EVENT_FANOUT_CAPACITY: usize = 32;

/// Notifications fanned out to manager subscribers.
#[derive(Debug, Clone)]
pub enum ManagerEvent {
    /// The current QR data URI changed. `None` means expired or consumed.
    QrUpdated(Option<String>),
    /// The connection state changed.
    ConnectionChanged(ConnectionState),
    /// An inbound message arrived (notify-only).
    MessageReceived(InboundNotice),
}

/// Result of a connection request.
///
/// `initialize` reports failure through this enum instead of an error:
/// a connect attempt that does not come up is an operational condition,
/// not a caller bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// A fresh connection attempt was started.
    Started,
    /// Another initialize was already in flight; this call did nothing.
    InProgress,
    /// Denied by the rate limiter.
    RateLimited { retry_after: Duration },
    /// The transport failed to start; the manager is back in `Closed`.
    Failed,
}

/// Timing knobs for the manager, taken from [`WhatsAppConfig`].
#[derive(Debug, Clone, Copy)]
pub struct ManagerSettings {
    /// Pause between consecutive broadcast sends.
    pub broadcast_delay: Duration,
    /// How long a rendered QR stays available before expiring.
    pub qr_ttl: Duration,
    /// Pause between credential wipe and re-initialize in a full reset.
    pub reconnect_pause: Duration,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self::from(&WhatsAppConfig::default())
    }
}

impl From<&WhatsAppConfig> for ManagerSettings {
    fn from(config: &WhatsAppConfig) -> Self {
        Self {
            broadcast_delay: Duration::from_millis(config.broadcast_delay_ms),
            qr_ttl: Duration::from_secs(config.qr_ttl_secs),
            reconnect_pause: Duration::from_millis(config.reconnect_pause_ms),
        }
    }
}

/// The connection manager. Cheap to clone; all clones share one session.
#[derive(Clone)]
pub struct WhatsAppManager {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn CredentialStore>,
    transport: Arc<dyn WhatsAppTransport>,
    limiter: RateLimiter,
    settings: ManagerSettings,
    state: StdMutex<ConnectionState>,
    /// Current pairing QR as a data URI, if one is live.
    qr: StdMutex<Option<String>>,
    /// Expiry task for the current QR. Replaced, never left running stale.
    qr_timer: StdMutex<Option<JoinHandle<()>>>,
    /// The live session, if any: provider handle plus its event pump.
    live: Mutex<Option<Live>>,
    initializing: AtomicBool,
    resetting: AtomicBool,
    events: broadcast::Sender<ManagerEvent>,
}

struct Live {
    handle: Arc<dyn TransportHandle>,
    pump: JoinHandle<()>,
}

impl WhatsAppManager {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        transport: Arc<dyn WhatsAppTransport>,
        limiter: RateLimiter,
        settings: ManagerSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_FANOUT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                store,
                transport,
                limiter,
                settings,
                state: StdMutex::new(ConnectionState::Closed),
                qr: StdMutex::new(None),
                qr_timer: StdMutex::new(None),
                live: Mutex::new(None),
                initializing: AtomicBool::new(false),
                resetting: AtomicBool::new(false),
                events,
            }),
        }
    }

    /// Subscribe to manager events. Every subscriber sees every event;
    /// slow subscribers lag rather than block the manager.
    pub fn subscribe(&self) -> broadcast::Receiver<ManagerEvent> {
        self.inner.events.subscribe()
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.lock().unwrap()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// The current pairing QR data URI, if one is live and unexpired.
    pub fn qr(&self) -> Option<String> {
        self.inner.qr.lock().unwrap().clone()
    }

    /// Time until the QR rate limit window resets.
    pub fn qr_retry_after(&self) -> Duration {
        self.inner.limiter.qr_remaining(DEFAULT_IDENTIFIER)
    }

    /// Time until the connect rate limit window resets.
    pub fn connect_retry_after(&self) -> Duration {
        self.inner.limiter.connect_remaining(DEFAULT_IDENTIFIER)
    }

    /// Start (or restart) a provider connection.
    ///
    /// Idempotent while an attempt is in flight: concurrent calls get
    /// [`ConnectOutcome::InProgress`] and exactly one client is started.
    /// A repeat call while a pairing QR is pending counts against the QR
    /// policy (the operator is asking for a fresh code); calls from
    /// `Closed` or `Open` count against the connect policy.
    pub async fn initialize(&self) -> ConnectOutcome {
        let regenerating_qr = self.state() == ConnectionState::Connecting;
        let allowed = if regenerating_qr {
            self.inner.limiter.check_qr_generation(DEFAULT_IDENTIFIER)
        } else {
            self.inner
                .limiter
                .check_connection_attempt(DEFAULT_IDENTIFIER)
        };
        if !allowed {
            let retry_after = if regenerating_qr {
                self.inner.limiter.qr_remaining(DEFAULT_IDENTIFIER)
            } else {
                self.inner.limiter.connect_remaining(DEFAULT_IDENTIFIER)
            };
            warn!(?retry_after, "connection request rate limited");
            return ConnectOutcome::RateLimited { retry_after };
        }

        if self.inner.initializing.swap(true, Ordering::SeqCst) {
            debug!("initialize already in flight; ignoring");
            return ConnectOutcome::InProgress;
        }
        let outcome = self.initialize_inner().await;
        self.inner.initializing.store(false, Ordering::SeqCst);
        outcome
    }

    async fn initialize_inner(&self) -> ConnectOutcome {
        self.teardown_live().await;
        Inner::set_state(&self.inner, ConnectionState::Connecting);

        let creds = self.inner.store.load().await;
        let restoring = creds.is_some();
        match self.inner.transport.start(creds).await {
            Ok(session) => {
                let pump = tokio::spawn(run_pump(self.inner.clone(), session.events));
                *self.inner.live.lock().await = Some(Live {
                    handle: session.handle,
                    pump,
                });
                info!(restoring, "whatsapp connection attempt started");
                ConnectOutcome::Started
            }
            Err(error) => {
                error!(%error, "failed to start whatsapp transport");
                Inner::set_state(&self.inner, ConnectionState::Closed);
                ConnectOutcome::Failed
            }
        }
    }

    /// Send one text message. Requires an open session.
    ///
    /// Returns `Ok(false)` when the provider rejects the message; the only
    /// error is [`ClasskittyError::NotConnected`].
    pub async fn send_message(&self, to: &str, text: &str) -> Result<bool, ClasskittyError> {
        let handle = {
            let live = self.inner.live.lock().await;
            match live.as_ref() {
                Some(live) if self.is_ready() => live.handle.clone(),
                _ => return Err(ClasskittyError::NotConnected),
            }
        };

        match handle.send_text(to, text).await {
            Ok(ok) => {
                if !ok {
                    debug!(to, "provider rejected the message");
                }
                Ok(ok)
            }
            Err(error) => {
                warn!(%error, to, "send failed");
                Ok(false)
            }
        }
    }

    /// Send the same text to each destination sequentially with a fixed
    /// pause between consecutive sends (a primitive anti-ban measure).
    /// Individual failures are counted, never aborting the loop.
    pub async fn broadcast_message(
        &self,
        destinations: &[String],
        text: &str,
    ) -> Result<BroadcastReport, ClasskittyError> {
        if !self.is_ready() {
            return Err(ClasskittyError::NotConnected);
        }

        let mut report = BroadcastReport::default();
        for (i, destination) in destinations.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.inner.settings.broadcast_delay).await;
            }
            match self.send_message(destination, text).await {
                Ok(true) => report.success += 1,
                // A session dropping mid-broadcast counts the rest as
                // failed instead of erroring half-done work.
                Ok(false) | Err(_) => report.failed += 1,
            }
        }

        info!(
            success = report.success,
            failed = report.failed,
            "broadcast finished"
        );
        Ok(report)
    }

    /// Attempt to resume the stored session at startup.
    ///
    /// Returns `false` without touching the network when no credentials
    /// are stored.
    pub async fn restore_session(&self) -> bool {
        if self.inner.store.load().await.is_none() {
            debug!("no stored session to restore");
            return false;
        }
        info!("restoring stored whatsapp session");
        self.initialize().await;
        true
    }

    /// Close the live session, keeping stored credentials for a later
    /// restore.
    pub async fn logout(&self) {
        info!("logout requested");
        self.teardown_live().await;
        Inner::set_state(&self.inner, ConnectionState::Closed);
    }

    /// Full reset: close the session, wipe stored credentials, clear rate
    /// limit windows, and start fresh QR pairing after a short pause.
    ///
    /// A failed wipe aborts the reset: reconnecting would reload the
    /// surviving credentials and restore the session the operator asked
    /// to destroy.
    pub async fn clear_auth_and_reconnect(&self) -> ConnectOutcome {
        if self.inner.resetting.swap(true, Ordering::SeqCst) {
            debug!("reset already in flight; ignoring");
            return ConnectOutcome::InProgress;
        }
        info!("full reset requested: wiping credentials and re-pairing");

        self.teardown_live().await;
        Inner::set_state(&self.inner, ConnectionState::Closed);

        if let Err(error) = self.inner.store.clear().await {
            error!(%error, "failed to clear stored credentials; aborting reset");
            self.inner.resetting.store(false, Ordering::SeqCst);
            return ConnectOutcome::Failed;
        }
        // A deliberate reset should not be blocked by earlier attempts.
        self.inner.limiter.reset(None);

        tokio::time::sleep(self.inner.settings.reconnect_pause).await;
        let outcome = self.initialize().await;
        self.inner.resetting.store(false, Ordering::SeqCst);
        outcome
    }

    /// Abort the event pump, close the provider socket, and drop the QR.
    async fn teardown_live(&self) {
        if let Some(live) = self.inner.live.lock().await.take() {
            live.pump.abort();
            live.handle.close().await;
        }
        Inner::clear_qr(&self.inner);
    }
}

impl Inner {
    fn set_state(inner: &Arc<Inner>, next: ConnectionState) {
        let changed = {
            let mut state = inner.state.lock().unwrap();
            let changed = *state != next;
            *state = next;
            changed
        };
        if changed {
            debug!(state = %next, "connection state changed");
            let _ = inner.events.send(ManagerEvent::ConnectionChanged(next));
        }
    }

    /// Store a fresh QR and (re)arm its expiry timer.
    fn set_qr(inner: &Arc<Inner>, uri: String) {
        *inner.qr.lock().unwrap() = Some(uri.clone());
        Self::arm_qr_timer(inner);
        let _ = inner.events.send(ManagerEvent::QrUpdated(Some(uri)));
    }

    /// Drop the current QR (if any) and cancel its expiry timer.
    fn clear_qr(inner: &Arc<Inner>) {
        if let Some(timer) = inner.qr_timer.lock().unwrap().take() {
            timer.abort();
        }
        let had_qr = inner.qr.lock().unwrap().take().is_some();
        if had_qr {
            let _ = inner.events.send(ManagerEvent::QrUpdated(None));
        }
    }

    fn arm_qr_timer(inner: &Arc<Inner>) {
        let mut timer = inner.qr_timer.lock().unwrap();
        if let Some(previous) = timer.take() {
            previous.abort();
        }

        let ttl = inner.settings.qr_ttl;
        let weak = Arc::downgrade(inner);
        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let expired = inner.qr.lock().unwrap().take().is_some();
            if expired {
                info!("pairing QR expired; a new connection request is required");
                let _ = inner.events.send(ManagerEvent::QrUpdated(None));
            }
        }));
    }
}

/// Per-session event pump: translates transport events into manager state.
/// Ends when the session disconnects or is torn down.
async fn run_pump(inner: Arc<Inner>, mut events: mpsc::Receiver<TransportEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            TransportEvent::PairingCode(payload) => match qr::render_data_uri(&payload) {
                Some(uri) => {
                    info!("new pairing code received; QR refreshed");
                    Inner::set_qr(&inner, uri);
                }
                None => {
                    // Keep connecting; the provider will rotate the code.
                    Inner::clear_qr(&inner);
                }
            },
            TransportEvent::CredentialsUpdate(creds) => {
                if let Err(error) = inner.store.save(&creds).await {
                    error!(%error, "failed to persist rotated session credentials");
                }
            }
            TransportEvent::Connected => {
                Inner::clear_qr(&inner);
                Inner::set_state(&inner, ConnectionState::Open);
                info!("whatsapp session open");
            }
            TransportEvent::Disconnected { reason } => {
                Inner::clear_qr(&inner);
                Inner::set_state(&inner, ConnectionState::Closed);
                match reason {
                    DisconnectReason::LoggedOut => {
                        info!("provider reported logout; clearing stored credentials");
                        if let Err(error) = inner.store.clear().await {
                            error!(%error, "failed to clear credentials after logout");
                        }
                    }
                    DisconnectReason::Replaced => {
                        warn!("session was replaced elsewhere; manual reconnect required");
                    }
                    DisconnectReason::Transient => {
                        warn!("connection dropped; waiting for a manual reconnect");
                    }
                }
                break;
            }
            TransportEvent::Message(notice) => {
                debug!(from = %notice.from, "inbound message");
                let _ = inner.events.send(ManagerEvent::MessageReceived(notice));
            }
        }
    }
}
