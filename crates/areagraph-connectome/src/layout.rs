// Copyright 2025 areagraph developers
// SPDX-License-Identifier: Apache-2.0

//! File naming of one simulation output directory.
//!
//! ```text
//! <root>/
//!   positions/rank_<r>_positions.txt
//!   network/rank_<r>_step_<s>_in_network.txt
//!   network/rank_<r>_step_<s>_out_network.txt
//!   monitors/<r>_<neuron>.csv
//!   rank_<r>_plasticity_changes.txt
//!   rank_<r>_neurons_overview.txt
//! ```

use crate::error::ConnectomeError;
use crate::timeseries::{EdgeFileResolver, StepFiles};
use areagraph_structures::NeuronId;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which edge-list variant of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ConnectomeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in" => Ok(Direction::In),
            "out" => Ok(Direction::Out),
            other => Err(ConnectomeError::InvalidModeOrKey(format!(
                "unknown edge file direction '{}' (expected 'in' or 'out')",
                other
            ))),
        }
    }
}

/// Paths of one simulation rank's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationLayout {
    root: PathBuf,
    rank: u32,
}

impl SimulationLayout {
    pub fn new(root: impl Into<PathBuf>, rank: u32) -> Self {
        Self {
            root: root.into(),
            rank,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn rank(&self) -> u32 {
        self.rank
    }

    pub fn positions_file(&self) -> PathBuf {
        self.root
            .join("positions")
            .join(format!("rank_{}_positions.txt", self.rank))
    }

    pub fn network_file(&self, step: u64, direction: Direction) -> PathBuf {
        self.root.join("network").join(format!(
            "rank_{}_step_{}_{}_network.txt",
            self.rank, step, direction
        ))
    }

    pub fn monitor_file(&self, neuron: NeuronId) -> PathBuf {
        self.root
            .join("monitors")
            .join(format!("{}_{}.csv", self.rank, neuron))
    }

    pub fn plasticity_changes_file(&self) -> PathBuf {
        self.root
            .join(format!("rank_{}_plasticity_changes.txt", self.rank))
    }

    pub fn neurons_overview_file(&self) -> PathBuf {
        self.root
            .join(format!("rank_{}_neurons_overview.txt", self.rank))
    }

    /// Resolver that yields this layout's network files for the given directions.
    pub fn network_files(&self, directions: &[Direction]) -> NetworkFiles {
        NetworkFiles {
            layout: self.clone(),
            incoming: directions.contains(&Direction::In),
            outgoing: directions.contains(&Direction::Out),
        }
    }
}

/// [`EdgeFileResolver`] over a [`SimulationLayout`].
#[derive(Debug, Clone)]
pub struct NetworkFiles {
    layout: SimulationLayout,
    incoming: bool,
    outgoing: bool,
}

impl EdgeFileResolver for NetworkFiles {
    fn resolve(&self, step: u64) -> StepFiles {
        StepFiles {
            incoming: self
                .incoming
                .then(|| self.layout.network_file(step, Direction::In)),
            outgoing: self
                .outgoing
                .then(|| self.layout.network_file(step, Direction::Out)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        let layout = SimulationLayout::new("/sim/viz-stimulus", 0);
        assert_eq!(
            layout.positions_file(),
            PathBuf::from("/sim/viz-stimulus/positions/rank_0_positions.txt")
        );
        assert_eq!(
            layout.network_file(10000, Direction::Out),
            PathBuf::from("/sim/viz-stimulus/network/rank_0_step_10000_out_network.txt")
        );
        assert_eq!(
            layout.monitor_file(NeuronId(12)),
            PathBuf::from("/sim/viz-stimulus/monitors/0_12.csv")
        );
        assert_eq!(
            layout.plasticity_changes_file(),
            PathBuf::from("/sim/viz-stimulus/rank_0_plasticity_changes.txt")
        );
    }

    #[test]
    fn test_resolver_respects_directions() {
        let layout = SimulationLayout::new("/sim", 1);
        let files = layout.network_files(&[Direction::Out]).resolve(20);
        assert!(files.incoming.is_none());
        assert_eq!(
            files.outgoing,
            Some(PathBuf::from("/sim/network/rank_1_step_20_out_network.txt"))
        );

        let files = layout
            .network_files(&[Direction::In, Direction::Out])
            .resolve(0);
        assert_eq!(files.paths().count(), 2);
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!("OUT".parse::<Direction>().unwrap(), Direction::Out);
        assert!("both".parse::<Direction>().is_err());
    }
}
