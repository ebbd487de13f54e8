// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `cauce serve` command implementation.
//!
//! Wires the storage layer, the safety gates, the OpenAI provider, and the
//! HTTP gateway together, then serves until a shutdown signal arrives.

use std::sync::Arc;
use std::time::Duration;

use cauce_config::model::{AgentConfig, CauceConfig};
use cauce_core::{CauceError, ProviderAdapter};
use cauce_gate::{BillingGate, IpGate, RateLimiter};
use cauce_gateway::prompt::DEFAULT_SYSTEM_PROMPT;
use cauce_gateway::{start_server, AppState, ChatSettings};
use cauce_openai::OpenAiProvider;
use cauce_storage::Database;
use tracing::info;

/// Runs the `cauce serve` command.
pub async fn run_serve(config: CauceConfig) -> Result<(), CauceError> {
    init_tracing(&config.agent.log_level);

    info!("starting cauce serve");

    let system_prompt = resolve_system_prompt(&config.agent)?;

    if let Some(parent) = std::path::Path::new(&config.storage.database_path).parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            CauceError::Config(format!(
                "cannot create data directory {}: {e}",
                parent.display()
            ))
        })?;
    }
    let db = Database::open(&config.storage.database_path).await?;

    let provider: Arc<dyn ProviderAdapter> = Arc::new(OpenAiProvider::new(&config.openai)?);

    let rate_limiter = Arc::new(RateLimiter::new(
        config.gate.rate_limit_max_requests,
        Duration::from_secs(config.gate.rate_limit_window_secs),
    ));
    rate_limiter.spawn_sweeper(Duration::from_secs(config.gate.rate_limit_sweep_secs));

    let state = AppState {
        db: db.clone(),
        provider,
        rate_limiter: Arc::clone(&rate_limiter),
        ip_gate: IpGate::new(
            db.clone(),
            config.gate.grace_period_days,
            config.gate.block_duration_days,
        ),
        billing_gate: BillingGate::new(db.clone()),
        settings: Arc::new(ChatSettings {
            system_prompt,
            model: config.openai.model.clone(),
            max_tokens: config.openai.max_tokens,
        }),
        marker: config.gate.referral_marker.clone(),
    };

    tokio::select! {
        result = start_server(&config.gateway, state) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    rate_limiter.shutdown();
    db.close().await?;
    info!("cauce serve shutdown complete");
    Ok(())
}

/// System prompt precedence: file > inline config > built-in default.
fn resolve_system_prompt(agent: &AgentConfig) -> Result<String, CauceError> {
    if let Some(path) = &agent.system_prompt_file {
        return std::fs::read_to_string(path).map_err(|e| {
            CauceError::Config(format!("failed to read system_prompt_file {path}: {e}"))
        });
    }
    if let Some(prompt) = &agent.system_prompt {
        return Ok(prompt.clone());
    }
    Ok(DEFAULT_SYSTEM_PROMPT.to_string())
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cauce={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
