// SPDX-FileCopyrightText: 2026 Classkitty Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./classkitty.toml` > `~/.config/classkitty/classkitty.toml`
//! > `/etc/classkitty/classkitty.toml`, with environment variable overrides
//! via the `CLASSKITTY_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ClasskittyConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/classkitty/classkitty.toml` (system-wide)
/// 3. `~/.config/classkitty/classkitty.toml` (user XDG config)
/// 4. `./classkitty.toml` (local directory)
/// 5. `CLASSKITTY_*` environment variables
pub fn load_config() -> Result<ClasskittyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ClasskittyConfig::default()))
        .merge(Toml::file("/etc/classkitty/classkitty.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("classkitty/classkitty.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("classkitty.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from an inline TOML string (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<ClasskittyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ClasskittyConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ClasskittyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ClasskittyConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `CLASSKITTY_GATEWAY_BEARER_TOKEN` must
/// map to `gateway.bearer_token`, not `gateway.bearer.token`.
fn env_provider() -> Env {
    Env::prefixed("CLASSKITTY_").map(|key| {
        // `key` is the env var name with prefix stripped; lowercase it here
        // since figment preserves the original (uppercase) casing.
        // Example: CLASSKITTY_WHATSAPP_SESSION_DIR -> "whatsapp_session_dir"
        let key_str = key.as_str().to_lowercase();
        let mapped = key_str
            .replacen("service_", "service.", 1)
            .replacen("whatsapp_", "whatsapp.", 1)
            .replacen("gateway_", "gateway.", 1);
        mapped.into()
    })
}
