// SPDX-FileCopyrightText: 2026 Classkitty Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as the broadcast pacing floor and valid bind addresses.

use crate::diagnostic::ConfigError;
use crate::model::ClasskittyConfig;

/// Floor for the inter-broadcast delay. Dropping below this materially
/// increases provider-side ban risk.
const MIN_BROADCAST_DELAY_MS: u64 = 1000;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ClasskittyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.whatsapp.session_dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "whatsapp.session_dir must not be empty".to_string(),
        });
    }

    if config.whatsapp.bridge_addr.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "whatsapp.bridge_addr must not be empty".to_string(),
        });
    }

    if config.whatsapp.broadcast_delay_ms < MIN_BROADCAST_DELAY_MS {
        errors.push(ConfigError::Validation {
            message: format!(
                "whatsapp.broadcast_delay_ms must be at least {MIN_BROADCAST_DELAY_MS}, got {}",
                config.whatsapp.broadcast_delay_ms
            ),
        });
    }

    if config.whatsapp.qr_ttl_secs < 10 {
        errors.push(ConfigError::Validation {
            message: format!(
                "whatsapp.qr_ttl_secs must be at least 10, got {}",
                config.whatsapp.qr_ttl_secs
            ),
        });
    }

    if config.whatsapp.qr_limit_max == 0 || config.whatsapp.connect_limit_max == 0 {
        errors.push(ConfigError::Validation {
            message: "rate limit maximums must be at least 1".to_string(),
        });
    }

    // Validate gateway host looks like a valid IP or hostname
    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("gateway.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.gateway.port == 0 {
        errors.push(ConfigError::Validation {
            message: "gateway.port must not be 0".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = ClasskittyConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_session_dir_fails_validation() {
        let mut config = ClasskittyConfig::default();
        config.whatsapp.session_dir = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("session_dir"))
        ));
    }

    #[test]
    fn broadcast_delay_below_floor_fails_validation() {
        let mut config = ClasskittyConfig::default();
        config.whatsapp.broadcast_delay_ms = 250;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("broadcast_delay_ms"))
        ));
    }

    #[test]
    fn zero_port_fails_validation() {
        let mut config = ClasskittyConfig::default();
        config.gateway.port = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("gateway.port"))
        ));
    }

    #[test]
    fn garbage_host_fails_validation() {
        let mut config = ClasskittyConfig::default();
        config.gateway.host = "not a host!".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("gateway.host"))
        ));
    }

    #[test]
    fn valid_custom_config_passes() {
        let mut config = ClasskittyConfig::default();
        config.gateway.host = "0.0.0.0".to_string();
        config.whatsapp.broadcast_delay_ms = 3000;
        config.whatsapp.session_dir = "/var/lib/classkitty/session".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
