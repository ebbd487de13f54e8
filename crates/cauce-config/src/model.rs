// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Cauce safety gateway.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Cauce configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CauceConfig {
    /// Assistant identity and prompt settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// OpenAI API settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Safety-gating settings (rate limits, grace period, block duration, marker).
    #[serde(default)]
    pub gate: GateConfig,
}

/// Assistant identity and prompt configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the assistant.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Inline system prompt string. Overridden by `system_prompt_file` if both set.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Path to a markdown file containing the system prompt.
    /// Takes precedence over `system_prompt` if both are set.
    #[serde(default)]
    pub system_prompt_file: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            system_prompt: None,
            system_prompt_file: None,
        }
    }
}

fn default_agent_name() -> String {
    "cauce".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token for the chat endpoint. When set, unauthenticated chat
    /// requests receive an `authRequired` response.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bearer_token: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3900
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|d| d.join("cauce/cauce.db").display().to_string())
        .unwrap_or_else(|| "cauce.db".to_string())
}

/// OpenAI API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// API key. Usually provided via `CAUCE_OPENAI_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// API base URL (override for proxies and tests).
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model identifier.
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Maximum tokens to generate per response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

/// Safety-gating configuration.
///
/// The client IP that keys the rate limiter and the referral state machine
/// comes from forwarding headers, which a direct client controls. These gates
/// are best-effort abuse deterrence, not an auth boundary.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GateConfig {
    /// Maximum chat requests per rate-limit window per IP.
    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: u32,

    /// Rate-limit window length in seconds.
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,

    /// Interval between rate-limit map sweeps, in seconds.
    #[serde(default = "default_rate_limit_sweep_secs")]
    pub rate_limit_sweep_secs: u64,

    /// Days of chat access after a referral before the IP is blocked.
    #[serde(default = "default_grace_period_days")]
    pub grace_period_days: i64,

    /// Days an IP block lasts once the grace period is exhausted.
    #[serde(default = "default_block_duration_days")]
    pub block_duration_days: i64,

    /// Control marker the model appends when recommending a human referral.
    /// Stripped from the response stream before it reaches the client.
    #[serde(default = "default_referral_marker")]
    pub referral_marker: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            rate_limit_max_requests: default_rate_limit_max_requests(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
            rate_limit_sweep_secs: default_rate_limit_sweep_secs(),
            grace_period_days: default_grace_period_days(),
            block_duration_days: default_block_duration_days(),
            referral_marker: default_referral_marker(),
        }
    }
}

fn default_rate_limit_max_requests() -> u32 {
    30
}

fn default_rate_limit_window_secs() -> u64 {
    60 * 60
}

fn default_rate_limit_sweep_secs() -> u64 {
    5 * 60
}

fn default_grace_period_days() -> i64 {
    2
}

fn default_block_duration_days() -> i64 {
    90
}

fn default_referral_marker() -> String {
    "[DERIVAR_PROFESIONAL]".to_string()
}
