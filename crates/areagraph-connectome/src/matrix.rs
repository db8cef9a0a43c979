// Copyright 2025 areagraph developers
// SPDX-License-Identifier: Apache-2.0

//! Area-pair connection counts for one time step.

use crate::aggregator::AggregationMode;
use crate::diagnostics::Diagnostics;
use crate::error::{ConnectomeError, Result};
use areagraph_structures::{AreaId, AreaPair};
use ndarray::Array2;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Exact `count / max_count`, or 0 when the maximum is 0.
///
/// Any count equal to the maximum normalizes to exactly `1.0`.
#[inline]
pub fn normalize_count(count: u64, max_count: u64) -> f64 {
    if max_count == 0 {
        0.0
    } else {
        count as f64 / max_count as f64
    }
}

/// Connection counts keyed by area pair.
///
/// Entries iterate in key order, so two matrices built from the same input compare and
/// serialize identically.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaConnectionMatrix {
    mode: AggregationMode,
    include_self_pairs: bool,
    #[serde(rename = "entries", serialize_with = "serialize_entries")]
    counts: BTreeMap<AreaPair, u64>,
    diagnostics: Diagnostics,
}

/// One serialized matrix cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatrixEntry {
    pub pair: AreaPair,
    pub count: u64,
}

fn serialize_entries<S: Serializer>(
    counts: &BTreeMap<AreaPair, u64>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(
        counts
            .iter()
            .map(|(pair, count)| MatrixEntry { pair: *pair, count: *count }),
    )
}

impl AreaConnectionMatrix {
    pub fn empty(mode: AggregationMode, include_self_pairs: bool) -> Self {
        Self {
            mode,
            include_self_pairs,
            counts: BTreeMap::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub(crate) fn from_parts(
        mode: AggregationMode,
        include_self_pairs: bool,
        counts: BTreeMap<AreaPair, u64>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            mode,
            include_self_pairs,
            counts,
            diagnostics,
        }
    }

    pub fn mode(&self) -> AggregationMode {
        self.mode
    }

    pub fn include_self_pairs(&self) -> bool {
        self.include_self_pairs
    }

    /// Key under which `pair` is stored in this matrix's mode.
    #[inline]
    pub fn key_for(&self, pair: AreaPair) -> AreaPair {
        storage_key(self.mode, pair)
    }

    /// Count for `pair`, 0 if absent. Undirected matrices accept either orientation.
    pub fn get(&self, pair: AreaPair) -> u64 {
        self.counts.get(&self.key_for(pair)).copied().unwrap_or(0)
    }

    pub fn entries(&self) -> impl Iterator<Item = (AreaPair, u64)> + '_ {
        self.counts.iter().map(|(pair, count)| (*pair, *count))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all entries: the number of edges counted.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn max_count(&self) -> u64 {
        self.counts.values().copied().max().unwrap_or(0)
    }

    /// Every entry as `count / max_count`.
    pub fn normalized(&self) -> NormalizedMatrix {
        let max_count = self.max_count();
        NormalizedMatrix {
            mode: self.mode,
            max_count,
            values: self
                .counts
                .iter()
                .map(|(pair, count)| (*pair, normalize_count(*count, max_count)))
                .collect(),
        }
    }

    /// Connections each area takes part in.
    ///
    /// Every counted edge adds 1 to its source area and 1 to its target area, so a
    /// self-pair adds 2 to its area.
    pub fn area_totals(&self) -> BTreeMap<AreaId, u64> {
        let mut totals = BTreeMap::new();
        for (pair, count) in &self.counts {
            *totals.entry(pair.first).or_insert(0) += count;
            *totals.entry(pair.second).or_insert(0) += count;
        }
        totals
    }

    pub fn area_total(&self, area: AreaId) -> u64 {
        self.counts
            .iter()
            .map(|(pair, count)| {
                let ends = (pair.first == area) as u64 + (pair.second == area) as u64;
                ends * count
            })
            .sum()
    }

    /// Add another matrix's counts and diagnostics into this one.
    ///
    /// # Errors
    /// `ConnectomeError::InvalidModeOrKey` if the two matrices were built with different
    /// modes or self-pair policies.
    pub fn merge(&mut self, other: &AreaConnectionMatrix) -> Result<()> {
        if self.mode != other.mode || self.include_self_pairs != other.include_self_pairs {
            return Err(ConnectomeError::InvalidModeOrKey(format!(
                "cannot merge a {} matrix (self pairs: {}) into a {} matrix (self pairs: {})",
                other.mode, other.include_self_pairs, self.mode, self.include_self_pairs
            )));
        }
        for (pair, count) in &other.counts {
            *self.counts.entry(*pair).or_insert(0) += count;
        }
        self.diagnostics.merge(&other.diagnostics);
        Ok(())
    }

    /// Dense matrix over `areas` (row = source/first, column = target/second).
    ///
    /// Undirected entries are mirrored into both triangles; a self-pair sits on the
    /// diagonal once. Pairs involving areas not listed are left out.
    pub fn to_dense(&self, areas: &[AreaId]) -> Array2<u64> {
        let position = |area: AreaId| areas.iter().position(|a| *a == area);
        let mut dense = Array2::<u64>::zeros((areas.len(), areas.len()));
        for (pair, count) in &self.counts {
            let (Some(row), Some(col)) = (position(pair.first), position(pair.second)) else {
                continue;
            };
            dense[[row, col]] = *count;
            if self.mode == AggregationMode::Undirected {
                dense[[col, row]] = *count;
            }
        }
        dense
    }

    /// Skipped rows, unresolved references and excluded self-pairs behind these counts.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub(crate) fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }
}

/// Normalized view of a matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedMatrix {
    #[serde(skip)]
    mode: AggregationMode,
    pub max_count: u64,
    #[serde(serialize_with = "serialize_normalized")]
    pub values: BTreeMap<AreaPair, f64>,
}

#[derive(Serialize)]
struct NormalizedEntry {
    pair: AreaPair,
    value: f64,
}

fn serialize_normalized<S: Serializer>(
    values: &BTreeMap<AreaPair, f64>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(
        values
            .iter()
            .map(|(pair, value)| NormalizedEntry { pair: *pair, value: *value }),
    )
}

impl NormalizedMatrix {
    pub fn mode(&self) -> AggregationMode {
        self.mode
    }

    /// Normalized value for `pair`, 0.0 if absent. Undirected views accept either
    /// orientation.
    pub fn get(&self, pair: AreaPair) -> f64 {
        self.values
            .get(&storage_key(self.mode, pair))
            .copied()
            .unwrap_or(0.0)
    }
}

#[inline]
fn storage_key(mode: AggregationMode, pair: AreaPair) -> AreaPair {
    match mode {
        AggregationMode::Directed => pair,
        AggregationMode::Undirected => AreaPair::undirected(pair.first, pair.second),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a(n: u32) -> AreaId {
        AreaId::new(n)
    }

    fn matrix(mode: AggregationMode, entries: &[((u32, u32), u64)]) -> AreaConnectionMatrix {
        let counts = entries
            .iter()
            .map(|((x, y), c)| (AreaPair::directed(a(*x), a(*y)), *c))
            .collect();
        AreaConnectionMatrix::from_parts(mode, true, counts, Diagnostics::new())
    }

    #[test]
    fn test_normalization_ties_are_exactly_one() {
        let m = matrix(AggregationMode::Directed, &[((1, 2), 7), ((2, 1), 7), ((1, 1), 3)]);
        let n = m.normalized();
        assert_eq!(n.max_count, 7);
        assert_eq!(n.get(AreaPair::directed(a(1), a(2))), 1.0);
        assert_eq!(n.get(AreaPair::directed(a(2), a(1))), 1.0);
        assert_eq!(n.get(AreaPair::directed(a(1), a(1))), 3.0 / 7.0);
    }

    #[test]
    fn test_normalize_empty_is_zero() {
        assert_eq!(normalize_count(0, 0), 0.0);
        let m = AreaConnectionMatrix::empty(AggregationMode::Undirected, true);
        assert_eq!(m.max_count(), 0);
        assert!(m.normalized().values.is_empty());
    }

    #[test]
    fn test_area_totals_count_both_ends() {
        let m = matrix(AggregationMode::Directed, &[((1, 2), 4), ((2, 2), 1)]);
        let totals = m.area_totals();
        assert_eq!(totals[&a(1)], 4);
        assert_eq!(totals[&a(2)], 6);
        assert_eq!(m.area_total(a(2)), 6);
        assert_eq!(m.area_total(a(9)), 0);
    }

    #[test]
    fn test_undirected_get_accepts_either_orientation() {
        let m = matrix(AggregationMode::Undirected, &[((1, 2), 5)]);
        assert_eq!(m.get(AreaPair::directed(a(2), a(1))), 5);
        assert_eq!(m.get(AreaPair::directed(a(1), a(2))), 5);
    }

    #[test]
    fn test_undirected_normalized_get_accepts_either_orientation() {
        let m = matrix(AggregationMode::Undirected, &[((1, 2), 4), ((1, 1), 2)]);
        let n = m.normalized();
        assert_eq!(n.mode(), AggregationMode::Undirected);
        assert_eq!(n.get(AreaPair::directed(a(2), a(1))), 1.0);
        assert_eq!(n.get(AreaPair::directed(a(1), a(2))), 1.0);
        assert_eq!(n.get(AreaPair::directed(a(1), a(1))), 0.5);

        let directed = matrix(AggregationMode::Directed, &[((1, 2), 4)]).normalized();
        assert_eq!(directed.get(AreaPair::directed(a(2), a(1))), 0.0);
    }

    #[test]
    fn test_merge_sums_and_rejects_mode_mismatch() {
        let mut m = matrix(AggregationMode::Directed, &[((1, 2), 1)]);
        m.merge(&matrix(AggregationMode::Directed, &[((1, 2), 2), ((2, 1), 1)]))
            .unwrap();
        assert_eq!(m.get(AreaPair::directed(a(1), a(2))), 3);
        assert_eq!(m.total(), 4);

        let other = matrix(AggregationMode::Undirected, &[((1, 2), 1)]);
        assert!(matches!(m.merge(&other), Err(ConnectomeError::InvalidModeOrKey(_))));
    }

    #[test]
    fn test_dense_export() {
        let areas = [a(1), a(2), a(3)];
        let directed = matrix(AggregationMode::Directed, &[((1, 2), 4), ((3, 3), 1)]);
        let dense = directed.to_dense(&areas);
        assert_eq!(dense[[0, 1]], 4);
        assert_eq!(dense[[1, 0]], 0);
        assert_eq!(dense[[2, 2]], 1);

        let undirected = matrix(AggregationMode::Undirected, &[((1, 2), 4)]);
        let dense = undirected.to_dense(&areas);
        assert_eq!(dense[[0, 1]], 4);
        assert_eq!(dense[[1, 0]], 4);
    }
}
