// SPDX-FileCopyrightText: 2026 Classkitty Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-window rate limiting for pairing and connection attempts.
//!
//! Windows are keyed by `operation:identifier`. The first request in a
//! window (or the first after the previous window elapsed) resets the
//! counter; once the counter exceeds the policy maximum, requests are
//! denied until the window ends. No background sweeper runs; stale
//! entries are overwritten on the next request for the same key.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use classkitty_config::WhatsAppConfig;

/// Identifier used when the caller has no per-client identity, which is
/// the normal case for a single-operator deployment.
pub const DEFAULT_IDENTIFIER: &str = "default";

const QR_OP: &str = "qr";
const CONNECT_OP: &str = "connect";

/// Maximum requests per fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitPolicy {
    pub max: u32,
    pub window: Duration,
}

struct WindowEntry {
    count: u32,
    reset_at: Instant,
}

/// Fixed-window limiter guarding QR regeneration and connection attempts.
pub struct RateLimiter {
    qr: LimitPolicy,
    connect: LimitPolicy,
    windows: Mutex<HashMap<String, WindowEntry>>,
}

impl RateLimiter {
    pub fn new(qr: LimitPolicy, connect: LimitPolicy) -> Self {
        Self {
            qr,
            connect,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &WhatsAppConfig) -> Self {
        Self::new(
            LimitPolicy {
                max: config.qr_limit_max,
                window: Duration::from_secs(config.qr_limit_window_secs),
            },
            LimitPolicy {
                max: config.connect_limit_max,
                window: Duration::from_secs(config.connect_limit_window_secs),
            },
        )
    }

    /// Record a QR regeneration request. Returns `true` when allowed.
    pub fn check_qr_generation(&self, identifier: &str) -> bool {
        self.check(QR_OP, identifier, self.qr)
    }

    /// Record a connection attempt. Returns `true` when allowed.
    pub fn check_connection_attempt(&self, identifier: &str) -> bool {
        self.check(CONNECT_OP, identifier, self.connect)
    }

    /// Time until the QR window for `identifier` resets. Zero when no
    /// window is active.
    pub fn qr_remaining(&self, identifier: &str) -> Duration {
        self.remaining(QR_OP, identifier)
    }

    /// Time until the connect window for `identifier` resets.
    pub fn connect_remaining(&self, identifier: &str) -> Duration {
        self.remaining(CONNECT_OP, identifier)
    }

    /// Drop windows for one identifier, or every window when `None`.
    pub fn reset(&self, identifier: Option<&str>) {
        let mut windows = self.windows.lock().unwrap();
        match identifier {
            Some(id) => {
                windows.retain(|key, _| {
                    key != &entry_key(QR_OP, id) && key != &entry_key(CONNECT_OP, id)
                });
            }
            None => windows.clear(),
        }
    }

    fn check(&self, op: &str, identifier: &str, policy: LimitPolicy) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap();
        let entry = windows
            .entry(entry_key(op, identifier))
            .or_insert_with(|| WindowEntry {
                count: 0,
                reset_at: now + policy.window,
            });

        if now >= entry.reset_at {
            entry.count = 0;
            entry.reset_at = now + policy.window;
        }

        entry.count += 1;
        entry.count <= policy.max
    }

    fn remaining(&self, op: &str, identifier: &str) -> Duration {
        let now = Instant::now();
        let windows = self.windows.lock().unwrap();
        match windows.get(&entry_key(op, identifier)) {
            Some(entry) if entry.reset_at > now => entry.reset_at - now,
            _ => Duration::ZERO,
        }
    }
}

fn entry_key(op: &str, identifier: &str) -> String {
    format!("{op}:{identifier}")
}
