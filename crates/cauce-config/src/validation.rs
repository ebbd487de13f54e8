// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation of configuration values.
//!
//! Figment catches type errors and unknown keys; this module checks value
//! constraints that serde cannot express (non-zero windows, non-empty marker).

use thiserror::Error;

use crate::model::CauceConfig;

/// A single configuration validation failure.
#[derive(Debug, Error)]
#[error("config key `{key}`: {message}")]
pub struct ConfigError {
    /// Dotted config key path, e.g. `gate.referral_marker`.
    pub key: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl ConfigError {
    fn new(key: &str, message: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Validate a deserialized config. Returns all failures, not just the first.
pub fn validate_config(config: &CauceConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        errors.push(ConfigError::new(
            "agent.log_level",
            format!(
                "must be one of {LOG_LEVELS:?}, got `{}`",
                config.agent.log_level
            ),
        ));
    }

    if config.gateway.port == 0 {
        errors.push(ConfigError::new("gateway.port", "must be non-zero"));
    }

    if config.storage.database_path.is_empty() {
        errors.push(ConfigError::new("storage.database_path", "must not be empty"));
    }

    if config.gate.rate_limit_max_requests == 0 {
        errors.push(ConfigError::new(
            "gate.rate_limit_max_requests",
            "must be at least 1",
        ));
    }

    if config.gate.rate_limit_window_secs == 0 {
        errors.push(ConfigError::new(
            "gate.rate_limit_window_secs",
            "must be at least 1",
        ));
    }

    if config.gate.grace_period_days < 0 {
        errors.push(ConfigError::new(
            "gate.grace_period_days",
            "must not be negative",
        ));
    }

    if config.gate.block_duration_days <= 0 {
        errors.push(ConfigError::new(
            "gate.block_duration_days",
            "must be at least 1",
        ));
    }

    if config.gate.referral_marker.trim().is_empty() {
        errors.push(ConfigError::new(
            "gate.referral_marker",
            "must not be empty -- the stream filter needs a marker to strip",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Render validation errors to stderr, one per line.
pub fn render_errors(errors: &[ConfigError]) {
    for error in errors {
        eprintln!("error: {error}");
    }
}
