// Copyright 2025 areagraph developers
// SPDX-License-Identifier: Apache-2.0

//! TimeSeriesCollector - area and area-pair statistics across a time-step sweep.
//!
//! Key semantics:
//! - Sparse: a step whose edge files are all absent contributes nothing (no zero, no
//!   placeholder). Simulations only write snapshots at a fixed interval.
//! - Step-ordered: samples are always in ascending step order, also when steps are
//!   aggregated in parallel and finish out of order.
//! - Atomic steps: a step is either folded into every tracked series or into none.
//! - Tracked-only: series exist only for explicitly tracked keys.

use crate::aggregator::{AggregationMode, AggregationOptions, AreaAggregator};
use crate::diagnostics::{Diagnostics, IssueKind};
use crate::error::{ConnectomeError, Result};
use crate::matrix::{normalize_count, AreaConnectionMatrix};
use crate::positions::PositionTable;
use areagraph_structures::{AreaId, AreaPair, TrackedKey};
use rayon::prelude::*;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Edge files of one step. Absent entries are simply not read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepFiles {
    pub incoming: Option<PathBuf>,
    pub outgoing: Option<PathBuf>,
}

impl StepFiles {
    pub fn outgoing(path: impl Into<PathBuf>) -> Self {
        Self {
            incoming: None,
            outgoing: Some(path.into()),
        }
    }

    pub fn incoming(path: impl Into<PathBuf>) -> Self {
        Self {
            incoming: Some(path.into()),
            outgoing: None,
        }
    }

    pub fn both(incoming: impl Into<PathBuf>, outgoing: impl Into<PathBuf>) -> Self {
        Self {
            incoming: Some(incoming.into()),
            outgoing: Some(outgoing.into()),
        }
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.incoming
            .iter()
            .chain(self.outgoing.iter())
            .map(PathBuf::as_path)
    }
}

/// Maps a step index to its edge files. This is where callers inject file naming.
pub trait EdgeFileResolver {
    fn resolve(&self, step: u64) -> StepFiles;
}

impl<F> EdgeFileResolver for F
where
    F: Fn(u64) -> StepFiles,
{
    fn resolve(&self, step: u64) -> StepFiles {
        self(step)
    }
}

/// Caller-owned stop flag, checked only between steps.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Set of keys to follow through a sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedKeys(BTreeSet<TrackedKey>);

impl TrackedKeys {
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<TrackedKey>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }

    /// Every area of the roster, as area keys.
    pub fn all_areas(positions: &PositionTable) -> Self {
        Self::new(positions.areas().iter().copied())
    }

    pub fn insert(&mut self, key: impl Into<TrackedKey>) -> bool {
        self.0.insert(key.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedKey> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn has_area_keys(&self) -> bool {
        self.0.iter().any(|k| matches!(k, TrackedKey::Area(_)))
    }

    /// Check the keys against the roster and aggregation options before any file is read.
    ///
    /// # Errors
    /// `ConnectomeError::InvalidModeOrKey` when the set is empty, a key names an area with
    /// no neurons, an undirected pair is not sorted, or a self-pair is tracked while
    /// self-pairs are excluded.
    pub fn validate(&self, positions: &PositionTable, options: &AggregationOptions) -> Result<()> {
        if self.0.is_empty() {
            return Err(ConnectomeError::InvalidModeOrKey(
                "no tracked keys given".to_string(),
            ));
        }

        for key in &self.0 {
            if let Some(area) = key.areas().find(|a| !positions.contains_area(*a)) {
                return Err(ConnectomeError::InvalidModeOrKey(format!(
                    "tracked key {} references {}, which has no neurons in the roster",
                    key, area
                )));
            }

            let TrackedKey::Pair(pair) = key else {
                continue;
            };
            if options.mode == AggregationMode::Undirected && !pair.is_sorted() {
                return Err(ConnectomeError::InvalidModeOrKey(format!(
                    "undirected pair {} must list the lower area first ({})",
                    pair,
                    AreaPair::undirected(pair.first, pair.second)
                )));
            }
            if pair.is_self_pair() && !options.include_self_pairs {
                return Err(ConnectomeError::InvalidModeOrKey(format!(
                    "self pair {} is tracked but self pairs are excluded",
                    pair
                )));
            }
        }
        Ok(())
    }
}

impl FromIterator<TrackedKey> for TrackedKeys {
    fn from_iter<T: IntoIterator<Item = TrackedKey>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One point of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub step: u64,
    pub count: u64,
    /// `count / max` of the step, present when normalization was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<f64>,
}

/// Per-key samples in ascending step order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeSeries {
    #[serde(serialize_with = "serialize_series")]
    series: BTreeMap<TrackedKey, Vec<Sample>>,
}

#[derive(Serialize)]
struct SeriesEntry<'a> {
    key: TrackedKey,
    samples: &'a [Sample],
}

fn serialize_series<S: Serializer>(
    series: &BTreeMap<TrackedKey, Vec<Sample>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(series.iter().map(|(key, samples)| SeriesEntry {
        key: *key,
        samples,
    }))
}

impl TimeSeries {
    fn with_keys(keys: &TrackedKeys) -> Self {
        Self {
            series: keys.iter().map(|k| (*k, Vec::new())).collect(),
        }
    }

    pub fn get(&self, key: impl Into<TrackedKey>) -> Option<&[Sample]> {
        self.series.get(&key.into()).map(Vec::as_slice)
    }

    pub fn keys(&self) -> impl Iterator<Item = &TrackedKey> {
        self.series.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TrackedKey, &[Sample])> {
        self.series.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Steps present in one series.
    pub fn steps(&self, key: impl Into<TrackedKey>) -> Vec<u64> {
        self.get(key)
            .map(|s| s.iter().map(|sample| sample.step).collect())
            .unwrap_or_default()
    }

    /// Counts of one series, in step order.
    pub fn counts(&self, key: impl Into<TrackedKey>) -> Vec<u64> {
        self.get(key)
            .map(|s| s.iter().map(|sample| sample.count).collect())
            .unwrap_or_default()
    }
}

/// Result of one sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepOutcome {
    pub series: TimeSeries,
    /// Steps folded into every series
    pub steps_collected: Vec<u64>,
    /// Steps with no edge file present
    pub steps_skipped: Vec<u64>,
    /// Steps not attempted because the sweep was cancelled
    pub steps_not_attempted: Vec<u64>,
    pub cancelled: bool,
    pub diagnostics: Diagnostics,
}

struct StepOutcome {
    step: u64,
    matrix: Option<AreaConnectionMatrix>,
    missing: Vec<PathBuf>,
}

/// Drives [`AreaAggregator`] over a sequence of steps.
///
/// Holds no state between calls; the roster is borrowed read-only.
pub struct TimeSeriesCollector<'a> {
    positions: &'a PositionTable,
    aggregator: AreaAggregator,
}

impl<'a> TimeSeriesCollector<'a> {
    pub fn new(positions: &'a PositionTable, options: AggregationOptions) -> Self {
        Self {
            positions,
            aggregator: AreaAggregator::new(options),
        }
    }

    pub fn options(&self) -> &AggregationOptions {
        self.aggregator.options()
    }

    /// Sweep `steps` in ascending order (duplicates ignored).
    pub fn collect<R>(&self, steps: &[u64], resolver: &R, keys: &TrackedKeys) -> Result<SweepOutcome>
    where
        R: EdgeFileResolver + ?Sized,
    {
        self.collect_with_cancel(steps, resolver, keys, &CancellationToken::new())
    }

    /// Sweep, checking `cancel` before each step.
    ///
    /// Series collected before cancellation are returned intact.
    ///
    /// # Errors
    /// `InvalidModeOrKey` for bad tracked keys (before any file is read); `Io` when an
    /// edge file exists but cannot be read. A missing edge file is never an error.
    pub fn collect_with_cancel<R>(
        &self,
        steps: &[u64],
        resolver: &R,
        keys: &TrackedKeys,
        cancel: &CancellationToken,
    ) -> Result<SweepOutcome>
    where
        R: EdgeFileResolver + ?Sized,
    {
        keys.validate(self.positions, self.aggregator.options())?;
        let steps = ordered_steps(steps);
        let mut sweep = SweepAccumulator::new(keys, self.aggregator.options().normalize);

        for (i, &step) in steps.iter().enumerate() {
            if cancel.is_cancelled() {
                sweep.cancel(&steps[i..]);
                break;
            }
            let outcome = self.aggregate_step(step, resolver)?;
            sweep.fold(outcome);
        }

        Ok(sweep.finish())
    }

    /// Aggregate steps on the rayon pool, then fold them in ascending step order.
    ///
    /// Steps not yet started when `cancel` is set are reported in
    /// `steps_not_attempted`.
    pub fn collect_parallel<R>(
        &self,
        steps: &[u64],
        resolver: &R,
        keys: &TrackedKeys,
        cancel: &CancellationToken,
    ) -> Result<SweepOutcome>
    where
        R: EdgeFileResolver + Sync + ?Sized,
    {
        keys.validate(self.positions, self.aggregator.options())?;
        let steps = ordered_steps(steps);

        let outcomes: Vec<(u64, Option<StepOutcome>)> = steps
            .par_iter()
            .map(|&step| {
                if cancel.is_cancelled() {
                    return Ok((step, None));
                }
                self.aggregate_step(step, resolver).map(|o| (step, Some(o)))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut outcomes = outcomes;
        outcomes.sort_by_key(|(step, _)| *step);

        let mut sweep = SweepAccumulator::new(keys, self.aggregator.options().normalize);
        let mut not_attempted = Vec::new();
        for (step, outcome) in outcomes {
            match outcome {
                Some(outcome) => sweep.fold(outcome),
                None => not_attempted.push(step),
            }
        }
        if !not_attempted.is_empty() {
            sweep.cancel(&not_attempted);
        }

        Ok(sweep.finish())
    }

    fn aggregate_step<R>(&self, step: u64, resolver: &R) -> Result<StepOutcome>
    where
        R: EdgeFileResolver + ?Sized,
    {
        let files = resolver.resolve(step);
        let mut matrix: Option<AreaConnectionMatrix> = None;
        let mut missing = Vec::new();

        for path in files.paths() {
            match self.aggregator.aggregate_file(self.positions, path) {
                Ok(file_matrix) => match matrix.as_mut() {
                    Some(combined) => combined.merge(&file_matrix)?,
                    None => matrix = Some(file_matrix),
                },
                Err(ConnectomeError::NotFound { path }) => missing.push(path),
                Err(e) => return Err(e),
            }
        }

        Ok(StepOutcome {
            step,
            matrix,
            missing,
        })
    }
}

fn ordered_steps(steps: &[u64]) -> Vec<u64> {
    let mut steps = steps.to_vec();
    steps.sort_unstable();
    steps.dedup();
    steps
}

struct SweepAccumulator {
    keys: Vec<TrackedKey>,
    needs_area_totals: bool,
    normalize: bool,
    series: TimeSeries,
    steps_collected: Vec<u64>,
    steps_skipped: Vec<u64>,
    steps_not_attempted: Vec<u64>,
    cancelled: bool,
    diagnostics: Diagnostics,
}

impl SweepAccumulator {
    fn new(keys: &TrackedKeys, normalize: bool) -> Self {
        Self {
            keys: keys.iter().copied().collect(),
            needs_area_totals: keys.has_area_keys(),
            normalize,
            series: TimeSeries::with_keys(keys),
            steps_collected: Vec::new(),
            steps_skipped: Vec::new(),
            steps_not_attempted: Vec::new(),
            cancelled: false,
            diagnostics: Diagnostics::new(),
        }
    }

    fn fold(&mut self, outcome: StepOutcome) {
        let StepOutcome {
            step,
            matrix,
            missing,
        } = outcome;

        for path in &missing {
            self.diagnostics.record(
                IssueKind::MissingFile,
                None,
                format!("step {}: {}", step, path.display()),
            );
        }

        let Some(matrix) = matrix else {
            debug!(target: "areagraph-connectome", "Step {}: no edge file, skipped", step);
            self.steps_skipped.push(step);
            return;
        };

        let area_totals: BTreeMap<AreaId, u64> = if self.needs_area_totals {
            matrix.area_totals()
        } else {
            BTreeMap::new()
        };
        let max_pair = matrix.max_count();
        let max_area = area_totals.values().copied().max().unwrap_or(0);

        for key in &self.keys {
            let (count, max) = match key {
                TrackedKey::Pair(pair) => (matrix.get(*pair), max_pair),
                TrackedKey::Area(area) => (area_totals.get(area).copied().unwrap_or(0), max_area),
            };
            let sample = Sample {
                step,
                count,
                normalized: self.normalize.then(|| normalize_count(count, max)),
            };
            if let Some(samples) = self.series.series.get_mut(key) {
                samples.push(sample);
            }
        }

        debug!(
            target: "areagraph-connectome",
            "Step {}: {} edges over {} area pairs",
            step,
            matrix.total(),
            matrix.len()
        );
        self.diagnostics.merge(matrix.diagnostics());
        self.steps_collected.push(step);
    }

    fn cancel(&mut self, remaining: &[u64]) {
        self.cancelled = true;
        self.steps_not_attempted.extend_from_slice(remaining);
    }

    fn finish(self) -> SweepOutcome {
        info!(
            target: "areagraph-connectome",
            "Sweep finished: {} steps collected, {} skipped, {} not attempted, {} keys tracked",
            self.steps_collected.len(),
            self.steps_skipped.len(),
            self.steps_not_attempted.len(),
            self.keys.len()
        );
        SweepOutcome {
            series: self.series,
            steps_collected: self.steps_collected,
            steps_skipped: self.steps_skipped,
            steps_not_attempted: self.steps_not_attempted,
            cancelled: self.cancelled,
            diagnostics: self.diagnostics,
        }
    }
}
