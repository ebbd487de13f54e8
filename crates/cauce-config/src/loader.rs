// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./cauce.toml` > `~/.config/cauce/cauce.toml` > `/etc/cauce/cauce.toml`
//! with environment variable overrides via `CAUCE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::CauceConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/cauce/cauce.toml` (system-wide)
/// 3. `~/.config/cauce/cauce.toml` (user XDG config)
/// 4. `./cauce.toml` (local directory)
/// 5. `CAUCE_*` environment variables
pub fn load_config() -> Result<CauceConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CauceConfig::default()))
        .merge(Toml::file("/etc/cauce/cauce.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("cauce/cauce.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("cauce.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<CauceConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CauceConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CauceConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CauceConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `CAUCE_GATE_GRACE_PERIOD_DAYS`
/// must map to `gate.grace_period_days`, not `gate.grace.period.days`.
fn env_provider() -> Env {
    Env::prefixed("CAUCE_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: CAUCE_OPENAI_API_KEY -> "openai_api_key"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("gateway_", "gateway.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("openai_", "openai.", 1)
            .replacen("gate_", "gate.", 1);
        mapped.into()
    })
}
