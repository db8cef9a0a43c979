// Copyright 2025 areagraph developers
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `areagraph.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AreagraphConfig {
    pub simulation: SimulationConfig,
    pub sweep: SweepConfig,
    pub aggregation: AggregationConfig,
    pub tracked: TrackedConfig,
    pub logging: LoggingConfig,
}

/// Where the simulation output lives
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Output directory (contains `positions/`, `network/`, `monitors/`)
    pub root: PathBuf,
    pub rank: u32,
    /// Simulation steps between two monitor records
    pub monitor_sample_interval: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            rank: 0,
            monitor_sample_interval: 100,
        }
    }
}

/// Time-step range of a sweep
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SweepConfig {
    pub start: u64,
    /// Inclusive
    pub end: u64,
    pub interval: u64,
    /// Edge files to read per step: "in", "out" or both
    pub directions: Vec<String>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            start: 0,
            end: 1_000_000,
            interval: 10_000,
            directions: vec!["out".to_string()],
        }
    }
}

impl SweepConfig {
    /// `start, start + interval, ...` up to and including `end`. Empty when the interval
    /// is 0 or the range is inverted.
    pub fn steps(&self) -> Vec<u64> {
        if self.interval == 0 || self.end < self.start {
            return Vec::new();
        }
        (self.start..=self.end)
            .step_by(self.interval as usize)
            .collect()
    }
}

/// Area aggregation options
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// "directed" or "undirected"
    pub mode: String,
    pub include_self_pairs: bool,
    pub normalize: bool,
    /// Aggregate steps on the rayon thread pool
    pub parallel: bool,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            mode: "undirected".to_string(),
            include_self_pairs: true,
            normalize: false,
            parallel: false,
        }
    }
}

/// Keys followed through a sweep. Empty means every roster area.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackedConfig {
    pub all_areas: bool,
    /// Area numbers (`8` for `area_8`)
    pub areas: Vec<u32>,
    /// Area number pairs, `[first, second]`
    pub pairs: Vec<[u32; 2]>,
}

impl TrackedConfig {
    pub fn is_empty(&self) -> bool {
        !self.all_areas && self.areas.is_empty() && self.pairs.is_empty()
    }

    /// Whether every roster area is tracked.
    pub fn tracks_all_areas(&self) -> bool {
        self.all_areas || (self.areas.is_empty() && self.pairs.is_empty())
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "text" or "json"
    pub format: String,
    /// Directory for rolling log files (requires the `file-logging` feature)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            log_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_steps_inclusive() {
        let sweep = SweepConfig {
            start: 0,
            end: 20,
            interval: 10,
            ..SweepConfig::default()
        };
        assert_eq!(sweep.steps(), vec![0, 10, 20]);
    }

    #[test]
    fn test_sweep_steps_degenerate() {
        let mut sweep = SweepConfig {
            interval: 0,
            ..SweepConfig::default()
        };
        assert!(sweep.steps().is_empty());
        sweep.interval = 5;
        sweep.start = 10;
        sweep.end = 5;
        assert!(sweep.steps().is_empty());
    }

    #[test]
    fn test_empty_tracked_means_all_areas() {
        let tracked = TrackedConfig::default();
        assert!(tracked.is_empty());
        assert!(tracked.tracks_all_areas());

        let tracked = TrackedConfig {
            areas: vec![8],
            ..TrackedConfig::default()
        };
        assert!(!tracked.tracks_all_areas());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AreagraphConfig = toml::from_str(
            "[simulation]\nroot = \"/data/viz-stimulus\"\n\n[tracked]\npairs = [[8, 34]]\n",
        )
        .unwrap();
        assert_eq!(config.simulation.root, PathBuf::from("/data/viz-stimulus"));
        assert_eq!(config.simulation.monitor_sample_interval, 100);
        assert_eq!(config.tracked.pairs, vec![[8, 34]]);
        assert_eq!(config.aggregation.mode, "undirected");
    }
}
