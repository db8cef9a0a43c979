// Copyright 2025 areagraph developers
// SPDX-License-Identifier: Apache-2.0

//! # areagraph Configuration System
//!
//! Type-safe configuration loader for areagraph sweeps with support for:
//! - TOML file parsing (`areagraph.toml`)
//! - Environment variable overrides (`AREAGRAPH_*`)
//! - CLI argument overrides
//!
//! ## Usage
//!
//! ```rust,no_run
//! use areagraph_config::{load_config, validate_config};
//!
//! let config = load_config(None, None).expect("Failed to load config");
//! validate_config(&config).expect("Invalid config");
//!
//! println!("Simulation root: {}", config.simulation.root.display());
//! println!("Steps: {:?}", config.sweep.steps());
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{apply_cli_overrides, apply_environment_overrides, find_config_file, load_config};
pub use types::*;
pub use validation::{validate_config, ConfigValidationError};

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found. Searched: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax: {0}")]
    ParseError(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let config = AreagraphConfig::default();
        let text = toml::to_string(&config).unwrap();
        let back: AreagraphConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.sweep.interval, config.sweep.interval);
        assert_eq!(back.aggregation.mode, config.aggregation.mode);
    }

    #[test]
    fn test_toml_errors_become_parse_errors() {
        let err = toml::from_str::<AreagraphConfig>("[sweep]\nend = \"soon\"")
            .map_err(ConfigError::from)
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
