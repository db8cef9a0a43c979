// Copyright 2025 areagraph developers
// SPDX-License-Identifier: Apache-2.0

//! Per-neuron monitor files and their per-area summaries.
//!
//! A monitor file is `;`-delimited with no header and one record per sampling interval:
//!
//! ```text
//! step;fired;fired_fraction;activity;dampening;current_calcium;target_calcium;
//! synaptic_input;background_input;grown_axons;connected_axons;grown_dendrites;
//! connected_dendrites
//! ```
//!
//! The global step of record `i` (0-based, malformed records included) is
//! `i * interval`.

use crate::diagnostics::{Diagnostics, IssueKind};
use crate::error::{ConnectomeError, Result};
use crate::layout::SimulationLayout;
use crate::positions::PositionTable;
use areagraph_structures::{AreaId, NeuronId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, trace, warn};

/// Columns in a monitor record.
pub const MONITOR_COLUMNS: usize = 13;

/// Default number of simulation steps between two monitor records.
pub const DEFAULT_SAMPLE_INTERVAL: u64 = 100;

/// One monitor record, in file column order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonitorValues {
    pub step: u64,
    pub fired: f64,
    pub fired_fraction: f64,
    pub activity: f64,
    pub dampening: f64,
    pub current_calcium: f64,
    pub target_calcium: f64,
    pub synaptic_input: f64,
    pub background_input: f64,
    pub grown_axons: f64,
    pub connected_axons: f64,
    pub grown_dendrites: f64,
    pub connected_dendrites: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonitorSample {
    pub global_step: u64,
    #[serde(flatten)]
    pub values: MonitorValues,
}

/// Neuron properties that can be averaged per area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorProperty {
    Calcium,
    FiringRate,
    Activity,
    GrownAxons,
    ConnectedAxons,
    GrownDendrites,
    ConnectedDendrites,
    /// Grown axons plus grown dendrites
    TotalGrowth,
    /// Connected axons plus connected dendrites
    TotalConnections,
}

impl MonitorProperty {
    pub const ALL: [MonitorProperty; 9] = [
        MonitorProperty::Calcium,
        MonitorProperty::FiringRate,
        MonitorProperty::Activity,
        MonitorProperty::GrownAxons,
        MonitorProperty::ConnectedAxons,
        MonitorProperty::GrownDendrites,
        MonitorProperty::ConnectedDendrites,
        MonitorProperty::TotalGrowth,
        MonitorProperty::TotalConnections,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorProperty::Calcium => "calcium",
            MonitorProperty::FiringRate => "firing_rate",
            MonitorProperty::Activity => "activity",
            MonitorProperty::GrownAxons => "grown_axons",
            MonitorProperty::ConnectedAxons => "connected_axons",
            MonitorProperty::GrownDendrites => "grown_dendrites",
            MonitorProperty::ConnectedDendrites => "connected_dendrites",
            MonitorProperty::TotalGrowth => "total_growth",
            MonitorProperty::TotalConnections => "total_connections",
        }
    }

    pub fn value(&self, values: &MonitorValues) -> f64 {
        match self {
            MonitorProperty::Calcium => values.current_calcium,
            MonitorProperty::FiringRate => values.fired_fraction,
            MonitorProperty::Activity => values.activity,
            MonitorProperty::GrownAxons => values.grown_axons,
            MonitorProperty::ConnectedAxons => values.connected_axons,
            MonitorProperty::GrownDendrites => values.grown_dendrites,
            MonitorProperty::ConnectedDendrites => values.connected_dendrites,
            MonitorProperty::TotalGrowth => values.grown_axons + values.grown_dendrites,
            MonitorProperty::TotalConnections => {
                values.connected_axons + values.connected_dendrites
            }
        }
    }

    fn slot(&self) -> usize {
        *self as usize
    }
}

impl Display for MonitorProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MonitorProperty {
    type Err = ConnectomeError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        MonitorProperty::ALL
            .into_iter()
            .find(|p| p.as_str() == name)
            .ok_or_else(|| {
                ConnectomeError::InvalidModeOrKey(format!("unknown monitor property '{}'", name))
            })
    }
}

/// Parsed monitor file of one neuron.
#[derive(Debug, Clone, PartialEq)]
pub struct NeuronMonitor {
    interval: u64,
    /// Ascending by global step
    samples: Vec<MonitorSample>,
    diagnostics: Diagnostics,
}

impl NeuronMonitor {
    /// # Errors
    /// `ConnectomeError::NotFound` when the file does not exist, `ConnectomeError::Io` when
    /// it cannot be read.
    pub fn load<P: AsRef<Path>>(path: P, interval: u64) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ConnectomeError::from_open(path, e))?;
        Self::parse(
            file,
            interval,
            Diagnostics::for_source(path.display().to_string()),
            &path.display().to_string(),
        )
    }

    pub fn from_reader<R: Read>(reader: R, interval: u64) -> Result<Self> {
        Self::parse(reader, interval, Diagnostics::new(), "monitor")
    }

    fn parse<R: Read>(
        reader: R,
        interval: u64,
        mut diagnostics: Diagnostics,
        context: &str,
    ) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut samples = Vec::new();
        for (index, record) in csv_reader.records().enumerate() {
            let record_number = index as u64 + 1;
            diagnostics.rows_read += 1;

            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    let detail = e.to_string();
                    if let csv::ErrorKind::Io(source) = e.into_kind() {
                        return Err(ConnectomeError::Io {
                            context: context.to_string(),
                            source,
                        });
                    }
                    diagnostics.record(IssueKind::MalformedRow, Some(record_number), detail);
                    continue;
                }
            };

            if record.len() != MONITOR_COLUMNS {
                diagnostics.record(
                    IssueKind::MalformedRow,
                    Some(record_number),
                    format!("expected {} columns, got {}", MONITOR_COLUMNS, record.len()),
                );
                continue;
            }

            match record.deserialize::<MonitorValues>(None) {
                Ok(values) => {
                    diagnostics.rows_accepted += 1;
                    samples.push(MonitorSample {
                        global_step: index as u64 * interval,
                        values,
                    });
                }
                Err(e) => {
                    trace!(target: "areagraph-connectome", "Malformed monitor record {}: {}", record_number, e);
                    diagnostics.record(IssueKind::MalformedRow, Some(record_number), e.to_string());
                }
            }
        }

        if diagnostics.malformed_rows > 0 {
            warn!(
                target: "areagraph-connectome",
                "Monitor {}: skipped {} malformed records of {}",
                context,
                diagnostics.malformed_rows,
                diagnostics.rows_read
            );
        }

        Ok(Self {
            interval,
            samples,
            diagnostics,
        })
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    pub fn samples(&self) -> &[MonitorSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample recorded at exactly `global_step`, if any.
    pub fn sample_at(&self, global_step: u64) -> Option<&MonitorSample> {
        self.samples
            .binary_search_by_key(&global_step, |s| s.global_step)
            .ok()
            .map(|i| &self.samples[i])
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

/// Mean monitor values of one area's sampled neurons at one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaPropertySummary {
    pub area: AreaId,
    pub global_step: u64,
    /// Neurons with a monitor record at this step
    pub neuron_count: usize,
    pub means: BTreeMap<MonitorProperty, f64>,
}

impl AreaPropertySummary {
    pub fn mean(&self, property: MonitorProperty) -> f64 {
        self.means.get(&property).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaSummaries {
    pub summaries: BTreeMap<AreaId, AreaPropertySummary>,
    pub diagnostics: Diagnostics,
}

/// One point of a per-area property series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PropertySample {
    pub global_step: u64,
    pub mean: f64,
    pub neuron_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertySeries {
    pub property: MonitorProperty,
    pub series: BTreeMap<AreaId, Vec<PropertySample>>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Copy, Default)]
struct PropertySums {
    count: usize,
    sums: [f64; MonitorProperty::ALL.len()],
}

impl PropertySums {
    fn add(&mut self, values: &MonitorValues) {
        self.count += 1;
        for property in MonitorProperty::ALL {
            self.sums[property.slot()] += property.value(values);
        }
    }

    fn mean(&self, property: MonitorProperty) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sums[property.slot()] / self.count as f64
        }
    }
}

/// Load the monitor of `neuron`, turning a missing file into a diagnostic.
fn load_monitor(
    layout: &SimulationLayout,
    neuron: NeuronId,
    interval: u64,
    diagnostics: &mut Diagnostics,
) -> Result<Option<NeuronMonitor>> {
    let path = layout.monitor_file(neuron);
    match NeuronMonitor::load(&path, interval) {
        Ok(monitor) => {
            diagnostics.merge(monitor.diagnostics());
            Ok(Some(monitor))
        }
        Err(ConnectomeError::NotFound { path }) => {
            trace!(target: "areagraph-connectome", "No monitor for neuron {}", neuron);
            diagnostics.record(
                IssueKind::MissingFile,
                None,
                format!("monitor of neuron {}: {}", neuron, path.display()),
            );
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Per-area means of every [`MonitorProperty`] at `global_step`.
///
/// Neurons whose monitor is missing, or has no record at that step, are left out of the
/// means. Areas with no sampled neuron get no summary.
pub fn summarize_areas(
    positions: &PositionTable,
    layout: &SimulationLayout,
    global_step: u64,
    interval: u64,
) -> Result<AreaSummaries> {
    let mut diagnostics = Diagnostics::new();
    let mut sums: BTreeMap<AreaId, PropertySums> = BTreeMap::new();

    for neuron in positions.neurons() {
        let Some(monitor) = load_monitor(layout, neuron.id, interval, &mut diagnostics)? else {
            continue;
        };
        if let Some(sample) = monitor.sample_at(global_step) {
            sums.entry(neuron.area).or_default().add(&sample.values);
        }
    }

    if diagnostics.missing_files > 0 {
        warn!(
            target: "areagraph-connectome",
            "{} of {} neurons have no monitor file",
            diagnostics.missing_files,
            positions.len()
        );
    }

    let summaries: BTreeMap<AreaId, AreaPropertySummary> = sums
        .into_iter()
        .map(|(area, sums)| {
            let means = MonitorProperty::ALL
                .into_iter()
                .map(|p| (p, sums.mean(p)))
                .collect();
            let summary = AreaPropertySummary {
                area,
                global_step,
                neuron_count: sums.count,
                means,
            };
            (area, summary)
        })
        .collect();

    info!(
        target: "areagraph-connectome",
        "Summarized {} areas at global step {}",
        summaries.len(),
        global_step
    );
    Ok(AreaSummaries {
        summaries,
        diagnostics,
    })
}

/// Area mean of `property` at each of `steps`, for each of `areas`.
///
/// Each monitor file is read once. A step at which no neuron of an area has a record is
/// a gap in that area's series.
///
/// # Errors
/// `ConnectomeError::InvalidModeOrKey` when `areas` is empty or names an area with no
/// neurons.
pub fn collect_property_series(
    positions: &PositionTable,
    layout: &SimulationLayout,
    steps: &[u64],
    areas: &[AreaId],
    property: MonitorProperty,
    interval: u64,
) -> Result<PropertySeries> {
    if areas.is_empty() {
        return Err(ConnectomeError::InvalidModeOrKey(
            "no areas given for the property series".to_string(),
        ));
    }
    if let Some(area) = areas.iter().find(|a| !positions.contains_area(**a)) {
        return Err(ConnectomeError::InvalidModeOrKey(format!(
            "{} has no neurons in the roster",
            area
        )));
    }

    let areas: BTreeSet<AreaId> = areas.iter().copied().collect();
    let steps: BTreeSet<u64> = steps.iter().copied().collect();
    let mut diagnostics = Diagnostics::new();
    let mut sums: BTreeMap<(AreaId, u64), (usize, f64)> = BTreeMap::new();

    for neuron in positions.neurons().iter().filter(|n| areas.contains(&n.area)) {
        let Some(monitor) = load_monitor(layout, neuron.id, interval, &mut diagnostics)? else {
            continue;
        };
        for &step in &steps {
            if let Some(sample) = monitor.sample_at(step) {
                let (count, sum) = sums.entry((neuron.area, step)).or_insert((0, 0.0));
                *count += 1;
                *sum += property.value(&sample.values);
            }
        }
    }

    let mut series: BTreeMap<AreaId, Vec<PropertySample>> =
        areas.iter().map(|a| (*a, Vec::new())).collect();
    for ((area, step), (count, sum)) in sums {
        if let Some(samples) = series.get_mut(&area) {
            samples.push(PropertySample {
                global_step: step,
                mean: sum / count as f64,
                neuron_count: count,
            });
        }
    }

    debug!(
        target: "areagraph-connectome",
        "Collected {} series over {} steps for {}",
        series.len(),
        steps.len(),
        property
    );
    Ok(PropertySeries {
        property,
        series,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn record(step: u64, calcium: f64, grown_axons: f64) -> String {
        format!(
            "{};0;0.5;0.1;0;{};0.7;0;0;{};1;2;1\n",
            step, calcium, grown_axons
        )
    }

    #[test]
    fn test_global_step_from_record_index() {
        let input = format!("{}{}{}", record(0, 0.1, 1.0), record(1, 0.2, 1.0), record(2, 0.3, 1.0));
        let monitor = NeuronMonitor::from_reader(Cursor::new(input), 100).unwrap();
        assert_eq!(monitor.len(), 3);
        assert_eq!(monitor.sample_at(200).unwrap().values.current_calcium, 0.3);
        assert!(monitor.sample_at(150).is_none());
    }

    #[test]
    fn test_malformed_record_keeps_index() {
        let input = format!("{}1;bad\n{}", record(0, 0.1, 1.0), record(2, 0.3, 1.0));
        let monitor = NeuronMonitor::from_reader(Cursor::new(input), 100).unwrap();
        assert_eq!(monitor.len(), 2);
        assert_eq!(monitor.diagnostics().malformed_rows, 1);
        assert!(monitor.sample_at(100).is_none());
        assert_eq!(monitor.sample_at(200).unwrap().values.step, 2);
    }

    #[test]
    fn test_derived_properties() {
        let monitor = NeuronMonitor::from_reader(Cursor::new(record(0, 0.4, 3.0)), 100).unwrap();
        let values = monitor.samples()[0].values;
        assert_eq!(MonitorProperty::TotalGrowth.value(&values), 5.0);
        assert_eq!(MonitorProperty::TotalConnections.value(&values), 2.0);
        assert_eq!(MonitorProperty::FiringRate.value(&values), 0.5);
        assert_eq!("Total_Growth".parse::<MonitorProperty>().unwrap(), MonitorProperty::TotalGrowth);
    }

    #[test]
    fn test_area_summaries_and_series() {
        let dir = TempDir::new().unwrap();
        let layout = SimulationLayout::new(dir.path(), 0);
        fs::create_dir_all(dir.path().join("monitors")).unwrap();
        let positions = PositionTable::from_reader(Cursor::new(
            "0 0 0 0 area_1\n1 0 0 0 area_1\n2 0 0 0 area_2\n".to_string(),
        ))
        .unwrap();

        fs::write(
            layout.monitor_file(NeuronId(0)),
            format!("{}{}", record(0, 0.2, 1.0), record(1, 0.4, 1.0)),
        )
        .unwrap();
        fs::write(layout.monitor_file(NeuronId(1)), record(0, 0.4, 3.0)).unwrap();

        let summaries = summarize_areas(&positions, &layout, 0, 100).unwrap();
        let area_1 = &summaries.summaries[&AreaId::new(1)];
        assert_eq!(area_1.neuron_count, 2);
        assert!((area_1.mean(MonitorProperty::Calcium) - 0.3).abs() < 1e-12);
        assert_eq!(area_1.mean(MonitorProperty::GrownAxons), 2.0);
        assert!(!summaries.summaries.contains_key(&AreaId::new(2)));
        assert_eq!(summaries.diagnostics.missing_files, 1);

        let series = collect_property_series(
            &positions,
            &layout,
            &[0, 100, 200],
            &[AreaId::new(1), AreaId::new(2)],
            MonitorProperty::Calcium,
            100,
        )
        .unwrap();
        let steps: Vec<u64> = series.series[&AreaId::new(1)].iter().map(|s| s.global_step).collect();
        assert_eq!(steps, vec![0, 100]);
        assert_eq!(series.series[&AreaId::new(1)][1].neuron_count, 1);
        assert!(series.series[&AreaId::new(2)].is_empty());
    }

    #[test]
    fn test_unknown_area_is_rejected() {
        let dir = TempDir::new().unwrap();
        let layout = SimulationLayout::new(dir.path(), 0);
        let positions =
            PositionTable::from_reader(Cursor::new("0 0 0 0 area_1\n".to_string())).unwrap();
        let result = collect_property_series(
            &positions,
            &layout,
            &[0],
            &[AreaId::new(7)],
            MonitorProperty::Calcium,
            100,
        );
        assert!(matches!(result, Err(ConnectomeError::InvalidModeOrKey(_))));
    }
}
