// Copyright 2025 areagraph developers
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Configuration is layered:
//! 1. TOML file (base values)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{AreagraphConfig, ConfigError, ConfigResult};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "areagraph.toml";

/// Find the areagraph configuration file
///
/// Search order:
/// 1. `AREAGRAPH_CONFIG_PATH` environment variable
/// 2. Current working directory: `./areagraph.toml`
/// 3. Parent directory: `../areagraph.toml`
/// 4. Ancestors (searches up to 5 levels)
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("AREAGRAPH_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by AREAGRAPH_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet AREAGRAPH_CONFIG_PATH to specify a custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from a TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if the config file is not found or contains invalid TOML. Validation is
/// a separate step, see [`crate::validate_config`].
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<AreagraphConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: AreagraphConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

fn parse_flag(value: &str) -> bool {
    let value = value.to_lowercase();
    value == "true" || value == "1" || value == "yes"
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `AREAGRAPH_SIMULATION_ROOT` -> `simulation.root`
/// - `AREAGRAPH_RANK` -> `simulation.rank`
/// - `AREAGRAPH_SWEEP_START` -> `sweep.start`
/// - `AREAGRAPH_SWEEP_END` -> `sweep.end`
/// - `AREAGRAPH_SWEEP_INTERVAL` -> `sweep.interval`
/// - `AREAGRAPH_AGGREGATION_MODE` -> `aggregation.mode`
/// - `AREAGRAPH_NORMALIZE` -> `aggregation.normalize`
/// - `AREAGRAPH_LOG_LEVEL` -> `logging.level`
///
/// Unparsable numeric values are ignored.
pub fn apply_environment_overrides(config: &mut AreagraphConfig) {
    if let Ok(value) = env::var("AREAGRAPH_SIMULATION_ROOT") {
        config.simulation.root = PathBuf::from(value);
    }
    if let Ok(value) = env::var("AREAGRAPH_RANK") {
        if let Ok(rank) = value.parse::<u32>() {
            config.simulation.rank = rank;
        }
    }

    if let Ok(value) = env::var("AREAGRAPH_SWEEP_START") {
        if let Ok(start) = value.parse::<u64>() {
            config.sweep.start = start;
        }
    }
    if let Ok(value) = env::var("AREAGRAPH_SWEEP_END") {
        if let Ok(end) = value.parse::<u64>() {
            config.sweep.end = end;
        }
    }
    if let Ok(value) = env::var("AREAGRAPH_SWEEP_INTERVAL") {
        if let Ok(interval) = value.parse::<u64>() {
            config.sweep.interval = interval;
        }
    }

    if let Ok(value) = env::var("AREAGRAPH_AGGREGATION_MODE") {
        config.aggregation.mode = value;
    }
    if let Ok(value) = env::var("AREAGRAPH_NORMALIZE") {
        config.aggregation.normalize = parse_flag(&value);
    }

    if let Ok(value) = env::var("AREAGRAPH_LOG_LEVEL") {
        config.logging.level = value;
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - Map of CLI arguments (e.g., `{"sweep_end": "200000", "mode": "directed"}`)
pub fn apply_cli_overrides(config: &mut AreagraphConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("simulation_root") {
        config.simulation.root = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("rank") {
        if let Ok(rank) = value.parse::<u32>() {
            config.simulation.rank = rank;
        }
    }

    if let Some(value) = cli_args.get("sweep_start") {
        if let Ok(start) = value.parse::<u64>() {
            config.sweep.start = start;
        }
    }
    if let Some(value) = cli_args.get("sweep_end") {
        if let Ok(end) = value.parse::<u64>() {
            config.sweep.end = end;
        }
    }
    if let Some(value) = cli_args.get("sweep_interval") {
        if let Ok(interval) = value.parse::<u64>() {
            config.sweep.interval = interval;
        }
    }

    if let Some(value) = cli_args.get("mode") {
        config.aggregation.mode = value.clone();
    }
    if let Some(value) = cli_args.get("include_self_pairs") {
        config.aggregation.include_self_pairs = parse_flag(value);
    }
    if let Some(value) = cli_args.get("normalize") {
        config.aggregation.normalize = parse_flag(value);
    }
    if let Some(value) = cli_args.get("parallel") {
        config.aggregation.parallel = parse_flag(value);
    }

    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
}
