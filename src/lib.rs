//! # areagraph
//!
//! Area-level connectivity analysis for spiking network simulation output.
//!
//! A simulation rank writes a neuron roster (`positions/rank_<r>_positions.txt`), one edge
//! list per step and direction (`network/rank_<r>_step_<s>_<in|out>_network.txt`) and
//! per-neuron monitor files. This crate turns them into:
//!
//! - area-pair connection counts for one step ([`connectome::AreaConnectionMatrix`]),
//! - per-area centroids ([`connectome::CentroidCalculator`]),
//! - per-area and per-pair time series over a step sweep
//!   ([`connectome::TimeSeriesCollector`]),
//! - per-area means of monitored neuron properties ([`connectome::monitors`]).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use areagraph::prelude::*;
//!
//! let config = load_config(None, None)?;
//! let _logging = areagraph::pipeline::init_logging_from_config(&config);
//!
//! let report = areagraph::pipeline::run_sweep(&config)?;
//! for (key, samples) in report.series.iter() {
//!     println!("{}: {} samples", key, samples.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Working without configuration
//!
//! ```rust,no_run
//! use areagraph::prelude::*;
//!
//! let layout = SimulationLayout::new("/data/viz-stimulus", 0);
//! let table = PositionTable::load(layout.positions_file())?;
//!
//! let aggregator = AreaAggregator::new(AggregationOptions::undirected());
//! let matrix = aggregator.aggregate_file(&table, layout.network_file(100_000, Direction::Out))?;
//! let heatmap = matrix.to_dense(table.areas());
//! # let _ = heatmap;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export foundation
pub use areagraph_config as config;
pub use areagraph_structures as structures;

// Re-export infrastructure
pub use areagraph_observability as observability;

// Re-export algorithms
pub use areagraph_connectome as connectome;

pub mod pipeline;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::structures::{AreaId, AreaPair, NeuronId, Position, TrackedKey};

    pub use crate::connectome::{
        AggregationMode, AggregationOptions, AreaAggregator, AreaConnectionMatrix,
        CancellationToken, CentroidCalculator, ConnectomeError, Diagnostics, Direction,
        EdgeStream, PositionTable, SimulationLayout, StepFiles, TimeSeriesCollector,
        TrackedKeys,
    };

    pub use crate::config::{load_config, validate_config, AreagraphConfig};

    pub use crate::pipeline::{run_sweep, PipelineError, SweepReport};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_facade_imports() {
        use crate::prelude::*;
        let _area = AreaId::new(0);
        let _options = AggregationOptions::default();
    }
}
