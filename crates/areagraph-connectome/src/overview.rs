// Copyright 2025 areagraph developers
// SPDX-License-Identifier: Apache-2.0

//! Whole-run summary files written next to the per-step output.

use crate::diagnostics::{Diagnostics, IssueKind};
use crate::error::{ConnectomeError, Result};
use crate::lines::{not_utf8, DataLines};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

/// Synapse creations and deletions over one logging interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlasticityChange {
    pub step: u64,
    pub creations: i64,
    pub deletions: i64,
    pub net: i64,
}

/// Population statistics at one step (avg / std pairs).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NeuronsOverviewRow {
    pub step: u64,
    pub calcium_avg: f64,
    pub calcium_std: f64,
    pub axons_avg: f64,
    pub axons_std: f64,
    pub connected_axons_avg: f64,
    pub connected_axons_std: f64,
    pub excitatory_dendrites_avg: f64,
    pub excitatory_dendrites_std: f64,
}

/// Rows parsed from one file plus what was skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedRows<T> {
    pub rows: Vec<T>,
    pub diagnostics: Diagnostics,
}

/// Read `<step>: <creations> <deletions> <net>` rows.
pub fn read_plasticity_changes<P: AsRef<Path>>(path: P) -> Result<ParsedRows<PlasticityChange>> {
    read_rows(path.as_ref(), "plasticity changes", parse_plasticity_row)
}

/// Read the neurons overview table.
pub fn read_neurons_overview<P: AsRef<Path>>(path: P) -> Result<ParsedRows<NeuronsOverviewRow>> {
    read_rows(path.as_ref(), "neurons overview", parse_overview_row)
}

pub fn plasticity_changes_from_reader<R: BufRead>(reader: R) -> Result<ParsedRows<PlasticityChange>> {
    parse_rows(reader, Diagnostics::new(), parse_plasticity_row).map_err(|e| ConnectomeError::Io {
        context: "plasticity changes".to_string(),
        source: e,
    })
}

pub fn neurons_overview_from_reader<R: BufRead>(reader: R) -> Result<ParsedRows<NeuronsOverviewRow>> {
    parse_rows(reader, Diagnostics::new(), parse_overview_row).map_err(|e| ConnectomeError::Io {
        context: "neurons overview".to_string(),
        source: e,
    })
}

fn read_rows<T>(
    path: &Path,
    kind: &str,
    parse_row: fn(&str) -> std::result::Result<T, String>,
) -> Result<ParsedRows<T>> {
    let file = File::open(path).map_err(|e| ConnectomeError::from_open(path, e))?;
    let parsed = parse_rows(
        BufReader::new(file),
        Diagnostics::for_source(path.display().to_string()),
        parse_row,
    )
    .map_err(|e| ConnectomeError::Io {
        context: path.display().to_string(),
        source: e,
    })?;

    if parsed.diagnostics.malformed_rows > 0 {
        warn!(
            target: "areagraph-connectome",
            "{} {}: skipped {} malformed rows",
            kind,
            path.display(),
            parsed.diagnostics.malformed_rows
        );
    }
    info!(
        target: "areagraph-connectome",
        "Read {} {} rows from {}",
        parsed.rows.len(),
        kind,
        path.display()
    );
    Ok(parsed)
}

fn parse_rows<R: BufRead, T>(
    reader: R,
    mut diagnostics: Diagnostics,
    parse_row: fn(&str) -> std::result::Result<T, String>,
) -> std::io::Result<ParsedRows<T>> {
    let mut lines = DataLines::new(reader);
    let mut rows = Vec::new();
    while let Some((line_number, line)) = lines.next_data_line()? {
        diagnostics.rows_read += 1;
        match line.map_err(not_utf8).and_then(parse_row) {
            Ok(row) => {
                diagnostics.rows_accepted += 1;
                rows.push(row);
            }
            Err(reason) => diagnostics.record(IssueKind::MalformedRow, Some(line_number), reason),
        }
    }
    Ok(ParsedRows { rows, diagnostics })
}

fn parse_plasticity_row(line: &str) -> std::result::Result<PlasticityChange, String> {
    let (step, counts) = line
        .split_once(':')
        .ok_or_else(|| "missing ':' after step".to_string())?;
    let step = step
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("step '{}': {}", step.trim(), e))?;

    let counts: Vec<i64> = counts
        .split_whitespace()
        .map(|f| f.parse::<i64>().map_err(|e| format!("count '{}': {}", f, e)))
        .collect::<std::result::Result<_, _>>()?;
    let [creations, deletions, net] = counts[..] else {
        return Err(format!("expected 3 counts, got {}", counts.len()));
    };

    Ok(PlasticityChange {
        step,
        creations,
        deletions,
        net,
    })
}

const OVERVIEW_COLUMNS: [usize; 8] = [1, 5, 6, 10, 11, 15, 16, 20];

fn parse_overview_row(line: &str) -> std::result::Result<NeuronsOverviewRow, String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let needed = OVERVIEW_COLUMNS[OVERVIEW_COLUMNS.len() - 1] + 1;
    if fields.len() < needed {
        return Err(format!("expected at least {} fields, got {}", needed, fields.len()));
    }

    let step = fields[0]
        .parse::<u64>()
        .map_err(|e| format!("step '{}': {}", fields[0], e))?;
    let mut values = [0.0f64; OVERVIEW_COLUMNS.len()];
    for (value, &column) in values.iter_mut().zip(OVERVIEW_COLUMNS.iter()) {
        *value = fields[column]
            .parse::<f64>()
            .map_err(|e| format!("column {} '{}': {}", column, fields[column], e))?;
    }

    let [calcium_avg, calcium_std, axons_avg, axons_std, connected_axons_avg, connected_axons_std, excitatory_dendrites_avg, excitatory_dendrites_std] =
        values;
    Ok(NeuronsOverviewRow {
        step,
        calcium_avg,
        calcium_std,
        axons_avg,
        axons_std,
        connected_axons_avg,
        connected_axons_std,
        excitatory_dendrites_avg,
        excitatory_dendrites_std,
    })
}
