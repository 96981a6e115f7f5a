// SPDX-FileCopyrightText: 2026 Classkitty Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport over a local WhatsApp Web bridge process.
//!
//! The bridge speaks newline-delimited JSON over TCP: Classkitty writes
//! command objects, the bridge streams event objects back on the same
//! socket. Send results are correlated by a per-command UUID through a
//! pending-ack map; everything else is forwarded to the manager as
//! [`TransportEvent`]s in arrival order.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{debug, warn};
use uuid::Uuid;

use classkitty_core::error::ClasskittyError;
use classkitty_core::traits::{TransportHandle, TransportSession, WhatsAppTransport};
use classkitty_core::types::{
    DisconnectReason, InboundNotice, SessionCredentials, TransportEvent,
};

const EVENT_CHANNEL_CAPACITY: usize = 64;
const SEND_ACK_TIMEOUT: Duration = Duration::from_secs(30);

/// Commands written to the bridge, one JSON object per line.
#[derive(Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum BridgeCommand<'a> {
    /// Open a provider connection. `creds: null` requests fresh pairing.
    Start { creds: Option<&'a serde_json::Value> },
    Send { id: &'a str, to: &'a str, text: &'a str },
    Close,
}

/// Events read from the bridge, one JSON object per line.
#[derive(Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum BridgeEvent {
    Pairing {
        code: String,
    },
    Creds {
        blob: serde_json::Value,
    },
    Open,
    Closed {
        #[serde(default)]
        reason: String,
    },
    Message {
        from: String,
        #[serde(default)]
        text: String,
        #[serde(default)]
        timestamp: String,
    },
    SendResult {
        id: String,
        ok: bool,
    },
}

/// Factory connecting to the bridge at a fixed address.
pub struct BridgeTransport {
    addr: String,
}

impl BridgeTransport {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

#[async_trait]
impl WhatsAppTransport for BridgeTransport {
    async fn start(
        &self,
        creds: Option<SessionCredentials>,
    ) -> Result<TransportSession, ClasskittyError> {
        let stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|e| ClasskittyError::Channel {
                message: format!("failed to connect to bridge at {}", self.addr),
                source: Some(e.into()),
            })?;
        let (read_half, write_half) = stream.into_split();

        let writer = Arc::new(Mutex::new(write_half));
        let pending: Arc<DashMap<String, oneshot::Sender<bool>>> = Arc::new(DashMap::new());

        let start = BridgeCommand::Start {
            creds: creds.as_ref().map(|c| &c.blob),
        };
        write_command(&writer, &start).await?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        tokio::spawn(read_events(read_half, tx, pending.clone()));

        Ok(TransportSession {
            events: rx,
            handle: Arc::new(BridgeHandle { writer, pending }),
        })
    }
}

struct BridgeHandle {
    writer: Arc<Mutex<OwnedWriteHalf>>,
    pending: Arc<DashMap<String, oneshot::Sender<bool>>>,
}

#[async_trait]
impl TransportHandle for BridgeHandle {
    async fn send_text(&self, to: &str, text: &str) -> Result<bool, ClasskittyError> {
        let id = Uuid::new_v4().to_string();
        let (ack_tx, ack_rx) = oneshot::channel();
        self.pending.insert(id.clone(), ack_tx);

        let command = BridgeCommand::Send {
            id: &id,
            to,
            text,
        };
        if let Err(error) = write_command(&self.writer, &command).await {
            self.pending.remove(&id);
            return Err(error);
        }

        match tokio::time::timeout(SEND_ACK_TIMEOUT, ack_rx).await {
            Ok(Ok(ok)) => Ok(ok),
            // Reader task gone: the socket died before the ack arrived.
            Ok(Err(_)) => Ok(false),
            Err(_) => {
                self.pending.remove(&id);
                Err(ClasskittyError::Timeout {
                    duration: SEND_ACK_TIMEOUT,
                })
            }
        }
    }

    async fn close(&self) {
        // Best effort: the bridge may already be gone.
        if let Err(error) = write_command(&self.writer, &BridgeCommand::Close).await {
            debug!(%error, "close command not delivered");
        }
        let _ = self.writer.lock().await.shutdown().await;
    }
}

async fn write_command(
    writer: &Mutex<OwnedWriteHalf>,
    command: &BridgeCommand<'_>,
) -> Result<(), ClasskittyError> {
    let mut line = serde_json::to_vec(command).map_err(|e| ClasskittyError::Channel {
        message: "failed to encode bridge command".into(),
        source: Some(e.into()),
    })?;
    line.push(b'\n');

    let mut guard = writer.lock().await;
    guard
        .write_all(&line)
        .await
        .map_err(|e| ClasskittyError::Channel {
            message: "bridge socket write failed".into(),
            source: Some(e.into()),
        })
}

async fn read_events(
    read_half: OwnedReadHalf,
    tx: mpsc::Sender<TransportEvent>,
    pending: Arc<DashMap<String, oneshot::Sender<bool>>>,
) {
    let mut lines = BufReader::new(read_half).lines();
    let mut saw_closed = false;

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(error) => {
                warn!(%error, "bridge socket read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let event: BridgeEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(error) => {
                warn!(%error, "skipping unparseable bridge event");
                continue;
            }
        };

        match event {
            BridgeEvent::Pairing { code } => {
                let _ = tx.send(TransportEvent::PairingCode(code)).await;
            }
            BridgeEvent::Creds { blob } => {
                let _ = tx
                    .send(TransportEvent::CredentialsUpdate(SessionCredentials::new(
                        blob,
                    )))
                    .await;
            }
            BridgeEvent::Open => {
                let _ = tx.send(TransportEvent::Connected).await;
            }
            BridgeEvent::Closed { reason } => {
                saw_closed = true;
                let _ = tx
                    .send(TransportEvent::Disconnected {
                        reason: parse_reason(&reason),
                    })
                    .await;
            }
            BridgeEvent::Message {
                from,
                text,
                timestamp,
            } => {
                let _ = tx
                    .send(TransportEvent::Message(InboundNotice {
                        from,
                        text,
                        timestamp,
                    }))
                    .await;
            }
            BridgeEvent::SendResult { id, ok } => {
                match pending.remove(&id) {
                    Some((_, ack)) => {
                        let _ = ack.send(ok);
                    }
                    None => debug!(%id, "send result for unknown or timed-out command"),
                }
            }
        }
    }

    // A socket that dies without a closed event is still a disconnect as
    // far as the manager is concerned.
    if !saw_closed {
        let _ = tx
            .send(TransportEvent::Disconnected {
                reason: DisconnectReason::Transient,
            })
            .await;
    }
}

fn parse_reason(reason: &str) -> DisconnectReason {
    match reason {
        "logged_out" => DisconnectReason::LoggedOut,
        "replaced" | "stream_conflict" => DisconnectReason::Replaced,
        _ => DisconnectReason::Transient,
    }
}
