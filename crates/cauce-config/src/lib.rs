// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Cauce safety gateway.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, environment variable
//! overrides, and post-deserialization value checks.
//!
//! # Usage
//!
//! ```no_run
//! use cauce_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Listening on port {}", config.gateway.port);
//! ```

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    AgentConfig, CauceConfig, GateConfig, GatewayConfig, OpenAiConfig, StorageConfig,
};
pub use validation::{render_errors, ConfigError};

/// Load configuration from the XDG hierarchy and validate it.
///
/// Returns either a valid `CauceConfig` or the list of validation errors.
pub fn load_and_validate() -> Result<CauceConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(vec![ConfigError {
            key: err
                .path
                .first()
                .cloned()
                .unwrap_or_else(|| "<config>".to_string()),
            message: err.to_string(),
        }]),
    }
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<CauceConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(vec![ConfigError {
            key: err
                .path
                .first()
                .cloned()
                .unwrap_or_else(|| "<config>".to_string()),
            message: err.to_string(),
        }]),
    }
}
