// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Cauce safety gateway.

use thiserror::Error;

/// The primary error type used across all Cauce components.
#[derive(Debug, Error)]
pub enum CauceError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    ///
    /// A storage error during a gating read is distinct from "no record found":
    /// the billing and IP gates must fail closed on it, never collapse it to
    /// "not blocked".
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Gateway errors (bind failure, malformed request, response routing).
    #[error("gateway error: {message}")]
    Gateway {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// LLM provider errors (API failure, stream failure, model not found).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
