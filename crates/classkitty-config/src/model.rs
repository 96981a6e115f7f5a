// SPDX-FileCopyrightText: 2026 Classkitty Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Classkitty treasury service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so unrecognized keys are
//! rejected at startup with an actionable error message.

use serde::{Deserialize, Serialize};

/// Top-level Classkitty configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClasskittyConfig {
    /// Service identity and logging settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// WhatsApp session manager settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// HTTP façade settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name of the deployment (e.g. the class it serves).
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "classkitty".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// WhatsApp connection manager configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Directory holding the multi-device session credentials.
    /// Exclusively owned by this process.
    #[serde(default = "default_session_dir")]
    pub session_dir: String,

    /// Address of the local WhatsApp Web bridge process (host:port).
    #[serde(default = "default_bridge_addr")]
    pub bridge_addr: String,

    /// Fixed delay between consecutive broadcast sends, in milliseconds.
    /// This pacing is a primitive anti-ban measure; see validation floor.
    #[serde(default = "default_broadcast_delay_ms")]
    pub broadcast_delay_ms: u64,

    /// How long a pairing QR stays valid before it is considered expired.
    #[serde(default = "default_qr_ttl_secs")]
    pub qr_ttl_secs: u64,

    /// Pause between credential wipe and re-initialize during a full reset,
    /// in milliseconds.
    #[serde(default = "default_reconnect_pause_ms")]
    pub reconnect_pause_ms: u64,

    /// QR generation rate limit: allowed requests per window.
    #[serde(default = "default_qr_limit_max")]
    pub qr_limit_max: u32,

    /// QR generation rate limit window, in seconds.
    #[serde(default = "default_qr_limit_window_secs")]
    pub qr_limit_window_secs: u64,

    /// Connection attempt rate limit: allowed attempts per window.
    #[serde(default = "default_connect_limit_max")]
    pub connect_limit_max: u32,

    /// Connection attempt rate limit window, in seconds.
    #[serde(default = "default_connect_limit_window_secs")]
    pub connect_limit_window_secs: u64,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            session_dir: default_session_dir(),
            bridge_addr: default_bridge_addr(),
            broadcast_delay_ms: default_broadcast_delay_ms(),
            qr_ttl_secs: default_qr_ttl_secs(),
            reconnect_pause_ms: default_reconnect_pause_ms(),
            qr_limit_max: default_qr_limit_max(),
            qr_limit_window_secs: default_qr_limit_window_secs(),
            connect_limit_max: default_connect_limit_max(),
            connect_limit_window_secs: default_connect_limit_window_secs(),
        }
    }
}

fn default_session_dir() -> String {
    "./whatsapp-session".to_string()
}

fn default_bridge_addr() -> String {
    "127.0.0.1:7070".to_string()
}

fn default_broadcast_delay_ms() -> u64 {
    2000
}

fn default_qr_ttl_secs() -> u64 {
    60
}

fn default_reconnect_pause_ms() -> u64 {
    1000
}

fn default_qr_limit_max() -> u32 {
    3
}

fn default_qr_limit_window_secs() -> u64 {
    3600
}

fn default_connect_limit_max() -> u32 {
    5
}

fn default_connect_limit_window_secs() -> u64 {
    1800
}

/// HTTP façade configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bearer token for the façade. `None` disables auth (single-operator
    /// deployments on a trusted network).
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            bearer_token: None,
        }
    }
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    3100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_anti_ban_policy() {
        let config = WhatsAppConfig::default();
        assert_eq!(config.broadcast_delay_ms, 2000);
        assert_eq!(config.qr_ttl_secs, 60);
        assert_eq!(config.qr_limit_max, 3);
        assert_eq!(config.qr_limit_window_secs, 3600);
        assert_eq!(config.connect_limit_max, 5);
        assert_eq!(config.connect_limit_window_secs, 1800);
    }

    #[test]
    fn gateway_defaults_to_localhost() {
        let config = GatewayConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3100);
        assert!(config.bearer_token.is_none());
    }
}
