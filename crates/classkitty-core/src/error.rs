// SPDX-FileCopyrightText: 2026 Classkitty Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Classkitty treasury service.

use thiserror::Error;

/// The primary error type used across the Classkitty crates.
#[derive(Debug, Error)]
pub enum ClasskittyError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Credential store errors (directory creation, write, delete failures).
    #[error("credential store error: {source}")]
    Credential {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// WhatsApp transport errors (bridge unreachable, socket failure, protocol violation).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A send was attempted while the session is not open.
    ///
    /// This is the one expected error across the manager's public boundary;
    /// callers are supposed to check `is_ready()` first or treat it as a
    /// normal failure path.
    #[error("whatsapp session is not connected")]
    NotConnected,

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_variants_render_messages() {
        let not_connected = ClasskittyError::NotConnected;
        assert!(not_connected.to_string().contains("not connected"));

        let channel = ClasskittyError::Channel {
            message: "bridge closed the socket".into(),
            source: None,
        };
        assert!(channel.to_string().contains("bridge closed"));

        let timeout = ClasskittyError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        assert!(timeout.to_string().contains("30"));
    }

    #[test]
    fn credential_error_wraps_io_source() {
        let err = ClasskittyError::Credential {
            source: Box::new(std::io::Error::other("disk full")),
        };
        assert!(err.to_string().contains("disk full"));
    }
}
