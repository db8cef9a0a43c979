// Copyright 2025 areagraph developers
// SPDX-License-Identifier: Apache-2.0

//! Configuration-driven runs: one call from an [`AreagraphConfig`] to results.

use crate::config::{validate_config, AreagraphConfig, ConfigError};
use crate::connectome::monitors::{
    collect_property_series, summarize_areas, AreaSummaries, PropertySeries,
};
use crate::connectome::overview::{
    read_neurons_overview, read_plasticity_changes, NeuronsOverviewRow, ParsedRows,
    PlasticityChange,
};
use crate::connectome::{
    AggregationMode, AggregationOptions, AreaAggregator, AreaConnectionMatrix,
    CancellationToken, Centroid, CentroidCalculator, ConnectomeError, Diagnostics, Direction,
    EdgeFileResolver, MonitorProperty, PositionTable, SimulationLayout, TimeSeries,
    TimeSeriesCollector, TrackedKeys,
};
use crate::observability::{
    init_console_logging, parse_debug_flags, LogFormat, LogOutput, LoggingConfig,
};
use crate::structures::{AreaId, AreaPair, TrackedKey};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connectome(#[from] ConnectomeError),
}

/// Everything a sweep produces, ready for a renderer or exporter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepReport {
    /// Roster areas in canonical order
    pub areas: Vec<AreaId>,
    pub centroids: Vec<Centroid>,
    pub series: TimeSeries,
    pub steps_collected: Vec<u64>,
    pub steps_skipped: Vec<u64>,
    pub steps_not_attempted: Vec<u64>,
    pub cancelled: bool,
    /// Problems found while loading the roster
    pub roster_diagnostics: Diagnostics,
    /// Problems found while reading step files
    pub diagnostics: Diagnostics,
}

impl SweepReport {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub fn layout(config: &AreagraphConfig) -> SimulationLayout {
    SimulationLayout::new(&config.simulation.root, config.simulation.rank)
}

pub fn aggregation_options(config: &AreagraphConfig) -> Result<AggregationOptions, PipelineError> {
    let mode: AggregationMode = config.aggregation.mode.parse()?;
    Ok(AggregationOptions {
        mode,
        include_self_pairs: config.aggregation.include_self_pairs,
        normalize: config.aggregation.normalize,
    })
}

pub fn directions(config: &AreagraphConfig) -> Result<Vec<Direction>, PipelineError> {
    let mut directions = config
        .sweep
        .directions
        .iter()
        .map(|d| d.parse::<Direction>())
        .collect::<Result<Vec<_>, _>>()?;
    directions.sort();
    directions.dedup();
    Ok(directions)
}

/// Keys named in `[tracked]`, plus every roster area when all areas are tracked.
pub fn tracked_keys(config: &AreagraphConfig, positions: &PositionTable) -> TrackedKeys {
    let tracked = &config.tracked;
    let mut keys = if tracked.tracks_all_areas() {
        TrackedKeys::all_areas(positions)
    } else {
        TrackedKeys::default()
    };
    for area in &tracked.areas {
        keys.insert(TrackedKey::Area(AreaId::new(*area)));
    }
    for [first, second] in &tracked.pairs {
        keys.insert(AreaPair::directed(AreaId::new(*first), AreaId::new(*second)));
    }
    keys
}

/// Run the configured sweep to completion.
pub fn run_sweep(config: &AreagraphConfig) -> Result<SweepReport, PipelineError> {
    run_sweep_with_cancel(config, &CancellationToken::new())
}

/// Run the configured sweep, stopping at the next step boundary once `cancel` is set.
///
/// # Errors
/// Configuration problems, a missing roster, invalid tracked keys or an unreadable step
/// file. Missing step files are not errors.
pub fn run_sweep_with_cancel(
    config: &AreagraphConfig,
    cancel: &CancellationToken,
) -> Result<SweepReport, PipelineError> {
    validate_config(config)?;
    let layout = layout(config);
    let options = aggregation_options(config)?;
    let resolver = layout.network_files(&directions(config)?);

    let table = PositionTable::load(layout.positions_file())?;
    let centroids = CentroidCalculator::compute(&table);
    let keys = tracked_keys(config, &table);
    let steps = config.sweep.steps();

    info!(
        target: "areagraph",
        "Sweeping {} steps of {} ({} mode, {} tracked keys)",
        steps.len(),
        layout.root().display(),
        options.mode,
        keys.len()
    );

    let collector = TimeSeriesCollector::new(&table, options);
    let outcome = if config.aggregation.parallel {
        collector.collect_parallel(&steps, &resolver, &keys, cancel)?
    } else {
        collector.collect_with_cancel(&steps, &resolver, &keys, cancel)?
    };

    Ok(SweepReport {
        areas: table.areas().to_vec(),
        centroids: centroids.into_values().collect(),
        series: outcome.series,
        steps_collected: outcome.steps_collected,
        steps_skipped: outcome.steps_skipped,
        steps_not_attempted: outcome.steps_not_attempted,
        cancelled: outcome.cancelled,
        roster_diagnostics: table.diagnostics().clone(),
        diagnostics: outcome.diagnostics,
    })
}

/// Area connection matrix of a single step over the configured directions.
///
/// # Errors
/// `ConnectomeError::NotFound` if any of the step's edge files is missing.
pub fn connectivity_snapshot(
    config: &AreagraphConfig,
    step: u64,
) -> Result<AreaConnectionMatrix, PipelineError> {
    validate_config(config)?;
    let layout = layout(config);
    let options = aggregation_options(config)?;
    let files = layout.network_files(&directions(config)?).resolve(step);

    let table = PositionTable::load(layout.positions_file())?;
    let paths: Vec<&Path> = files.paths().collect();
    let matrix = AreaAggregator::new(options).aggregate_files(&table, &paths)?;

    info!(
        target: "areagraph",
        "Step {}: {} edges over {} area pairs",
        step,
        matrix.total(),
        matrix.len()
    );
    Ok(matrix)
}

/// Per-area means of every monitored property at `global_step`, using the configured
/// monitor sample interval.
pub fn area_summaries(
    config: &AreagraphConfig,
    global_step: u64,
) -> Result<AreaSummaries, PipelineError> {
    validate_config(config)?;
    let layout = layout(config);
    let table = PositionTable::load(layout.positions_file())?;
    Ok(summarize_areas(
        &table,
        &layout,
        global_step,
        config.simulation.monitor_sample_interval,
    )?)
}

/// Area means of `property` at every configured sweep step. An empty `areas` slice means
/// every roster area.
pub fn property_series(
    config: &AreagraphConfig,
    property: MonitorProperty,
    areas: &[AreaId],
) -> Result<PropertySeries, PipelineError> {
    validate_config(config)?;
    let layout = layout(config);
    let table = PositionTable::load(layout.positions_file())?;
    let areas = if areas.is_empty() { table.areas() } else { areas };
    Ok(collect_property_series(
        &table,
        &layout,
        &config.sweep.steps(),
        areas,
        property,
        config.simulation.monitor_sample_interval,
    )?)
}

pub fn plasticity_changes(
    config: &AreagraphConfig,
) -> Result<ParsedRows<PlasticityChange>, PipelineError> {
    Ok(read_plasticity_changes(layout(config).plasticity_changes_file())?)
}

pub fn neurons_overview(
    config: &AreagraphConfig,
) -> Result<ParsedRows<NeuronsOverviewRow>, PipelineError> {
    Ok(read_neurons_overview(layout(config).neurons_overview_file())?)
}

/// Logging installed from `[logging]`. Keep it alive for the whole run: with file logging
/// the log writers are flushed when it is dropped.
pub struct LoggingSession {
    installed: bool,
    #[cfg(feature = "file-logging")]
    guard: Option<crate::observability::LoggingGuard>,
}

impl LoggingSession {
    /// Whether this call installed the global subscriber.
    pub fn installed(&self) -> bool {
        self.installed
    }

    /// Run folder receiving the log files, if file logging is active.
    #[cfg(feature = "file-logging")]
    pub fn log_dir(&self) -> Option<&Path> {
        self.guard.as_ref().map(|guard| guard.log_dir())
    }

    #[cfg(not(feature = "file-logging"))]
    pub fn log_dir(&self) -> Option<&Path> {
        None
    }
}

/// Install logging at the configured level, raised per crate by `--debug-<crate>` flags
/// or `AREAGRAPH_DEBUG`.
///
/// With `logging.log_dir` set and the `file-logging` feature enabled, per-crate log files
/// go to a run folder under that directory. Otherwise logs go to stderr.
pub fn init_logging_from_config(config: &AreagraphConfig) -> LoggingSession {
    let flags = parse_debug_flags().with_default_level(config.logging.level.clone());

    #[cfg(feature = "file-logging")]
    let mut file_logging_error = None;
    #[cfg(feature = "file-logging")]
    if let Some(log_dir) = &config.logging.log_dir {
        match crate::observability::init_logging(&flags, Some(log_dir.clone()), None, None) {
            Ok(guard) => {
                return LoggingSession {
                    installed: true,
                    guard: Some(guard),
                }
            }
            Err(e) => file_logging_error = Some(e),
        }
    }

    let logging = LoggingConfig {
        level: config.logging.level.clone(),
        format: config.logging.format.parse().unwrap_or(LogFormat::Text),
        output: LogOutput::Stderr,
    };
    let installed = init_console_logging(&flags, &logging);

    #[cfg(feature = "file-logging")]
    if let Some(e) = file_logging_error {
        warn!(target: "areagraph", "File logging unavailable, logging to stderr: {:#}", e);
    }
    #[cfg(not(feature = "file-logging"))]
    if let Some(log_dir) = &config.logging.log_dir {
        warn!(
            target: "areagraph",
            "logging.log_dir is {} but file logging is not compiled in, logging to stderr",
            log_dir.display()
        );
    }

    LoggingSession {
        installed,
        #[cfg(feature = "file-logging")]
        guard: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directions_are_deduplicated() {
        let mut config = AreagraphConfig::default();
        config.sweep.directions = vec!["out".to_string(), "in".to_string(), "OUT".to_string()];
        assert_eq!(directions(&config).unwrap(), vec![Direction::In, Direction::Out]);

        config.sweep.directions = vec!["sideways".to_string()];
        assert!(matches!(directions(&config), Err(PipelineError::Connectome(_))));
    }

    #[test]
    fn test_aggregation_options_from_config() {
        let mut config = AreagraphConfig::default();
        config.aggregation.mode = "Directed".to_string();
        config.aggregation.include_self_pairs = false;
        let options = aggregation_options(&config).unwrap();
        assert_eq!(options.mode, AggregationMode::Directed);
        assert!(!options.include_self_pairs);
        assert!(!options.normalize);
    }

    #[test]
    fn test_log_dir_selects_file_logging() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AreagraphConfig::default();
        config.logging.log_dir = Some(dir.path().to_path_buf());

        let session = init_logging_from_config(&config);

        let run_folders = std::fs::read_dir(dir.path()).unwrap().count();
        if cfg!(feature = "file-logging") {
            assert_eq!(run_folders, 1);
            if session.installed() {
                assert!(session.log_dir().unwrap().starts_with(dir.path()));
            }
        } else {
            assert_eq!(run_folders, 0);
            assert!(session.log_dir().is_none());
        }
    }
}
