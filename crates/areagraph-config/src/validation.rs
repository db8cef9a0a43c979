//! Configuration validation
//!
//! Checks that values are within range and consistent with each other. All problems are
//! collected and reported together.

use crate::{AreagraphConfig, ConfigError, ConfigResult};
use std::collections::HashSet;

const MODES: [&str; 2] = ["directed", "undirected"];
const DIRECTIONS: [&str; 2] = ["in", "out"];
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 2] = ["text", "json"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigValidationError {
    ConfigValidationError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - A non-empty simulation root
/// - A usable step range
/// - Known aggregation mode and edge file directions
/// - Tracked pairs that fit the aggregation mode
/// - Known log level and format
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &AreagraphConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_simulation(config, &mut errors);
    validate_sweep(config, &mut errors);
    validate_aggregation(config, &mut errors);
    validate_tracked(config, &mut errors);
    validate_logging(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_simulation(config: &AreagraphConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.simulation.root.as_os_str().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "simulation.root".to_string(),
        });
    }
    if config.simulation.monitor_sample_interval == 0 {
        errors.push(invalid("simulation.monitor_sample_interval", "must be positive"));
    }
}

fn validate_sweep(config: &AreagraphConfig, errors: &mut Vec<ConfigValidationError>) {
    let sweep = &config.sweep;
    if sweep.interval == 0 {
        errors.push(invalid("sweep.interval", "must be positive"));
    }
    if sweep.end < sweep.start {
        errors.push(invalid(
            "sweep.end",
            format!("{} is before sweep.start ({})", sweep.end, sweep.start),
        ));
    }

    if sweep.directions.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "sweep.directions".to_string(),
        });
    }
    let mut seen = HashSet::new();
    for direction in &sweep.directions {
        let normalized = direction.trim().to_lowercase();
        if !DIRECTIONS.contains(&normalized.as_str()) {
            errors.push(invalid(
                "sweep.directions",
                format!("'{}' is not one of 'in', 'out'", direction),
            ));
        } else if !seen.insert(normalized) {
            errors.push(invalid(
                "sweep.directions",
                format!("'{}' is listed more than once", direction),
            ));
        }
    }
}

fn validate_aggregation(config: &AreagraphConfig, errors: &mut Vec<ConfigValidationError>) {
    let mode = config.aggregation.mode.trim().to_lowercase();
    if !MODES.contains(&mode.as_str()) {
        errors.push(invalid(
            "aggregation.mode",
            format!("'{}' must be 'directed' or 'undirected'", config.aggregation.mode),
        ));
    }
}

fn validate_tracked(config: &AreagraphConfig, errors: &mut Vec<ConfigValidationError>) {
    let undirected = config.aggregation.mode.trim().eq_ignore_ascii_case("undirected");
    for [first, second] in &config.tracked.pairs {
        if undirected && first > second {
            errors.push(invalid(
                "tracked.pairs",
                format!(
                    "[{}, {}] must list the lower area first in undirected mode",
                    first, second
                ),
            ));
        }
        if first == second && !config.aggregation.include_self_pairs {
            errors.push(invalid(
                "tracked.pairs",
                format!(
                    "[{}, {}] is a self pair but aggregation.include_self_pairs is false",
                    first, second
                ),
            ));
        }
    }
}

fn validate_logging(config: &AreagraphConfig, errors: &mut Vec<ConfigValidationError>) {
    let level = config.logging.level.trim().to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(invalid(
            "logging.level",
            format!("'{}' must be one of {}", config.logging.level, LOG_LEVELS.join(", ")),
        ));
    }
    let format = config.logging.format.trim().to_lowercase();
    if !LOG_FORMATS.contains(&format.as_str()) {
        errors.push(invalid(
            "logging.format",
            format!("'{}' must be 'text' or 'json'", config.logging.format),
        ));
    }
}
