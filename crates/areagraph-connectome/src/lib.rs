// Copyright 2025 areagraph developers
// SPDX-License-Identifier: Apache-2.0

//! # areagraph-connectome
//!
//! Area-level connectivity analysis of neuron simulation output.
//!
//! - [`PositionTable`]: neuron roster (neuron -> area, neuron -> position)
//! - [`EdgeStream`]: lazy reader over one per-step edge-list file
//! - [`AreaAggregator`] / [`AreaConnectionMatrix`]: edge counts per area pair
//! - [`CentroidCalculator`]: mean position per area
//! - [`TimeSeriesCollector`]: tracked area / pair statistics across a step sweep
//! - [`monitors`] and [`overview`]: per-neuron monitor files and whole-run summaries
//!
//! Data problems (malformed rows, edges outside the roster, missing step files) never
//! abort a call; they are counted in [`Diagnostics`].

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod aggregator;
pub mod centroid;
pub mod diagnostics;
pub mod edges;
pub mod error;
pub mod layout;
mod lines;
pub mod matrix;
pub mod monitors;
pub mod overview;
pub mod positions;
pub mod timeseries;

pub use aggregator::{AggregationMode, AggregationOptions, AreaAggregator};
pub use centroid::{Centroid, CentroidCalculator};
pub use diagnostics::{Diagnostics, Issue, IssueKind, MAX_RECORDED_ISSUES};
pub use edges::{Edge, EdgeStream};
pub use error::{ConnectomeError, Result};
pub use layout::{Direction, NetworkFiles, SimulationLayout};
pub use matrix::{normalize_count, AreaConnectionMatrix, MatrixEntry, NormalizedMatrix};
pub use monitors::{MonitorProperty, NeuronMonitor};
pub use positions::{NeuronRecord, PositionTable};
pub use timeseries::{
    CancellationToken, EdgeFileResolver, Sample, StepFiles, SweepOutcome, TimeSeries,
    TimeSeriesCollector, TrackedKeys,
};
