// Copyright 2025 areagraph developers
// SPDX-License-Identifier: Apache-2.0

//! Folds neuron-level edges into area-level connection counts.
//!
//! Directed and undirected counting, self-pair policy and normalization are options on a
//! single aggregator rather than separate code paths.

use crate::diagnostics::{Diagnostics, IssueKind};
use crate::edges::{Edge, EdgeStream};
use crate::error::{ConnectomeError, Result};
use crate::matrix::AreaConnectionMatrix;
use crate::positions::PositionTable;
use ahash::AHashMap;
use areagraph_structures::{AreaId, AreaPair};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

/// How edges are keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    /// Key is `(source area, target area)`
    Directed,
    /// Key is the pair sorted by area index; both directions share it
    Undirected,
}

impl AggregationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationMode::Directed => "directed",
            AggregationMode::Undirected => "undirected",
        }
    }
}

impl Display for AggregationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregationMode {
    type Err = ConnectomeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "directed" => Ok(AggregationMode::Directed),
            "undirected" => Ok(AggregationMode::Undirected),
            other => Err(ConnectomeError::InvalidModeOrKey(format!(
                "unknown aggregation mode '{}' (expected 'directed' or 'undirected')",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationOptions {
    pub mode: AggregationMode,
    /// Count edges whose endpoints share an area
    pub include_self_pairs: bool,
    /// Attach `count / max_count` to collected samples
    pub normalize: bool,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            mode: AggregationMode::Undirected,
            include_self_pairs: true,
            normalize: false,
        }
    }
}

impl AggregationOptions {
    pub fn directed() -> Self {
        Self {
            mode: AggregationMode::Directed,
            ..Self::default()
        }
    }

    pub fn undirected() -> Self {
        Self {
            mode: AggregationMode::Undirected,
            ..Self::default()
        }
    }

    pub fn with_self_pairs(mut self, include: bool) -> Self {
        self.include_self_pairs = include;
        self
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }
}

/// Stateless fold from edges to an [`AreaConnectionMatrix`].
///
/// Aggregating the same input twice yields equal matrices.
#[derive(Debug, Clone, Copy, Default)]
pub struct AreaAggregator {
    options: AggregationOptions,
}

impl AreaAggregator {
    pub fn new(options: AggregationOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AggregationOptions {
        &self.options
    }

    /// Key for an edge from `source` area to `target` area.
    #[inline]
    pub fn key_for(&self, source: AreaId, target: AreaId) -> AreaPair {
        match self.options.mode {
            AggregationMode::Directed => AreaPair::directed(source, target),
            AggregationMode::Undirected => AreaPair::undirected(source, target),
        }
    }

    /// Fold a sequence of edges.
    ///
    /// Edges with an endpoint missing from `positions` are dropped and counted as
    /// unresolved references.
    pub fn aggregate<I>(&self, positions: &PositionTable, edges: I) -> AreaConnectionMatrix
    where
        I: IntoIterator<Item = Edge>,
    {
        let mut counts: AHashMap<AreaPair, u64> = AHashMap::new();
        let mut diagnostics = Diagnostics::new();
        let mut edges_seen: u64 = 0;

        for edge in edges {
            edges_seen += 1;
            let (source_area, target_area) =
                match (positions.area_of(edge.source), positions.area_of(edge.target)) {
                    (Some(s), Some(t)) => (s, t),
                    (source_area, target_area) => {
                        let missing: Vec<String> = [
                            source_area.is_none().then(|| format!("source {}", edge.source)),
                            target_area.is_none().then(|| format!("target {}", edge.target)),
                        ]
                        .into_iter()
                        .flatten()
                        .collect();
                        diagnostics.record(
                            IssueKind::UnresolvedReference,
                            None,
                            format!(
                                "edge {} -> {}: {} not in roster",
                                edge.source,
                                edge.target,
                                missing.join(", ")
                            ),
                        );
                        continue;
                    }
                };

            if source_area == target_area && !self.options.include_self_pairs {
                diagnostics.count(IssueKind::SelfPairExcluded, 1);
                continue;
            }

            *counts.entry(self.key_for(source_area, target_area)).or_insert(0) += 1;
        }

        if diagnostics.unresolved_references > 0 {
            warn!(
                target: "areagraph-connectome",
                "Dropped {} of {} edges with neuron ids outside the roster",
                diagnostics.unresolved_references,
                edges_seen
            );
        }

        let counts: BTreeMap<AreaPair, u64> = counts.into_iter().collect();
        debug!(
            target: "areagraph-connectome",
            "Aggregated {} edges into {} {} area pairs",
            edges_seen,
            counts.len(),
            self.options.mode
        );

        AreaConnectionMatrix::from_parts(
            self.options.mode,
            self.options.include_self_pairs,
            counts,
            diagnostics,
        )
    }

    /// Fold an edge stream, carrying its row diagnostics into the matrix.
    pub fn aggregate_stream<R: BufRead>(
        &self,
        positions: &PositionTable,
        mut stream: EdgeStream<R>,
    ) -> AreaConnectionMatrix {
        let mut matrix = self.aggregate(positions, stream.by_ref());
        matrix.diagnostics_mut().merge(stream.diagnostics());
        matrix
    }

    /// Open and fold one edge file.
    ///
    /// # Errors
    /// `ConnectomeError::NotFound` if the file does not exist.
    pub fn aggregate_file<P: AsRef<Path>>(
        &self,
        positions: &PositionTable,
        path: P,
    ) -> Result<AreaConnectionMatrix> {
        let stream = EdgeStream::open(path)?;
        Ok(self.aggregate_stream(positions, stream))
    }

    /// Fold several edge files (e.g. the in- and out-edge files of one step) into one
    /// matrix whose counts are the sum of each file's counts.
    pub fn aggregate_files<P: AsRef<Path>>(
        &self,
        positions: &PositionTable,
        paths: &[P],
    ) -> Result<AreaConnectionMatrix> {
        let mut combined =
            AreaConnectionMatrix::empty(self.options.mode, self.options.include_self_pairs);
        for path in paths {
            let matrix = self.aggregate_file(positions, path)?;
            combined.merge(&matrix)?;
        }
        Ok(combined)
    }
}
