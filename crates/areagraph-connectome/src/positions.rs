// Copyright 2025 areagraph developers
// SPDX-License-Identifier: Apache-2.0

//! Neuron roster: neuron -> area and neuron -> position.
//!
//! Roster rows are `<localId> <x> <y> <z> <area_label> [...]`. Rows whose label does not
//! start with `area_` are auxiliary entries and are dropped. The canonical area order is
//! the numeric order of the `area_<N>` suffix, never the order rows appear in.

use crate::diagnostics::{Diagnostics, IssueKind};
use crate::error::{ConnectomeError, Result};
use crate::lines::{not_utf8, DataLines};
use ahash::AHashMap;
use areagraph_structures::{AreaId, NeuronId, Position};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, trace, warn};

/// Minimum number of whitespace-separated fields in a roster row.
pub const ROSTER_MIN_FIELDS: usize = 5;

/// One roster entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NeuronRecord {
    pub id: NeuronId,
    pub position: Position,
    pub area: AreaId,
}

/// Immutable neuron roster for one simulation rank.
#[derive(Debug, Clone)]
pub struct PositionTable {
    /// Sorted by neuron id
    neurons: Vec<NeuronRecord>,
    index: AHashMap<NeuronId, usize>,
    /// Canonical order, ascending numeric index
    areas: Vec<AreaId>,
    diagnostics: Diagnostics,
}

impl PositionTable {
    /// Load a roster file.
    ///
    /// # Errors
    /// `ConnectomeError::NotFound` when the file does not exist; `ConnectomeError::Io` when
    /// it cannot be read. Bad rows are never errors, see [`PositionTable::diagnostics`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ConnectomeError::from_open(path, e))?;
        let table = Self::parse(
            BufReader::new(file),
            Diagnostics::for_source(path.display().to_string()),
        )
        .map_err(|e| ConnectomeError::Io {
            context: path.display().to_string(),
            source: e,
        })?;

        info!(
            target: "areagraph-connectome",
            "Loaded roster {}: {} neurons in {} areas",
            path.display(),
            table.len(),
            table.areas.len()
        );
        Ok(table)
    }

    /// Parse a roster from any buffered reader.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        Self::parse(reader, Diagnostics::new()).map_err(|e| ConnectomeError::Io {
            context: "roster".to_string(),
            source: e,
        })
    }

    /// Build a table directly from records. Later records replace earlier ones with the
    /// same id.
    pub fn from_records<I: IntoIterator<Item = NeuronRecord>>(records: I) -> Self {
        let mut diagnostics = Diagnostics::new();
        let mut by_id: AHashMap<NeuronId, NeuronRecord> = AHashMap::new();
        for record in records {
            diagnostics.rows_read += 1;
            diagnostics.rows_accepted += 1;
            if by_id.insert(record.id, record).is_some() {
                diagnostics.record(
                    IssueKind::DuplicateNeuron,
                    None,
                    format!("neuron {} listed more than once", record.id),
                );
            }
        }
        Self::build(by_id, diagnostics)
    }

    fn parse<R: BufRead>(reader: R, mut diagnostics: Diagnostics) -> std::io::Result<Self> {
        let mut lines = DataLines::new(reader);
        let mut by_id: AHashMap<NeuronId, NeuronRecord> = AHashMap::new();

        while let Some((line_number, line)) = lines.next_data_line()? {
            diagnostics.rows_read += 1;
            let outcome = match line {
                Ok(line) => parse_roster_row(line),
                Err(e) => RowOutcome::Malformed(not_utf8(e)),
            };
            match outcome {
                RowOutcome::Neuron(record) => {
                    diagnostics.rows_accepted += 1;
                    if by_id.insert(record.id, record).is_some() {
                        diagnostics.record(
                            IssueKind::DuplicateNeuron,
                            Some(line_number),
                            format!("neuron {} listed more than once", record.id),
                        );
                    }
                }
                RowOutcome::NonArea => {
                    trace!(target: "areagraph-connectome", "Skipping non-area roster row {}", line_number);
                    diagnostics.count(IssueKind::NonAreaRow, 1);
                }
                RowOutcome::Malformed(reason) => {
                    trace!(target: "areagraph-connectome", "Malformed roster row {}: {}", line_number, reason);
                    diagnostics.record(IssueKind::MalformedRow, Some(line_number), reason);
                }
            }
        }

        if diagnostics.malformed_rows > 0 || diagnostics.duplicate_neurons > 0 {
            warn!(
                target: "areagraph-connectome",
                "Roster: skipped {} malformed rows, {} duplicate neuron ids",
                diagnostics.malformed_rows,
                diagnostics.duplicate_neurons
            );
        }

        Ok(Self::build(by_id, diagnostics))
    }

    fn build(by_id: AHashMap<NeuronId, NeuronRecord>, diagnostics: Diagnostics) -> Self {
        let mut neurons: Vec<NeuronRecord> = by_id.into_values().collect();
        neurons.sort_unstable_by_key(|n| n.id);

        let index = neurons
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id, i))
            .collect::<AHashMap<_, _>>();

        let mut areas: Vec<AreaId> = neurons.iter().map(|n| n.area).collect();
        areas.sort_unstable();
        areas.dedup();

        Self {
            neurons,
            index,
            areas,
            diagnostics,
        }
    }

    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }

    #[inline]
    pub fn get(&self, id: NeuronId) -> Option<&NeuronRecord> {
        self.index.get(&id).map(|&i| &self.neurons[i])
    }

    #[inline]
    pub fn area_of(&self, id: NeuronId) -> Option<AreaId> {
        self.get(id).map(|n| n.area)
    }

    #[inline]
    pub fn position_of(&self, id: NeuronId) -> Option<Position> {
        self.get(id).map(|n| n.position)
    }

    /// Areas in canonical (ascending numeric) order.
    pub fn areas(&self) -> &[AreaId] {
        &self.areas
    }

    pub fn contains_area(&self, area: AreaId) -> bool {
        self.areas.binary_search(&area).is_ok()
    }

    /// All neurons, ascending by id.
    pub fn neurons(&self) -> &[NeuronRecord] {
        &self.neurons
    }

    /// Members of one area, ascending by id.
    pub fn members(&self, area: AreaId) -> impl Iterator<Item = &NeuronRecord> + '_ {
        self.neurons.iter().filter(move |n| n.area == area)
    }

    /// Skipped-row and duplicate-id diagnostics from loading.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

enum RowOutcome {
    Neuron(NeuronRecord),
    NonArea,
    Malformed(String),
}

fn parse_roster_row(line: &str) -> RowOutcome {
    let mut fields = line.split_whitespace();
    let (Some(id), Some(x), Some(y), Some(z), Some(label)) = (
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
    ) else {
        return RowOutcome::Malformed(format!(
            "expected at least {} fields, got {}",
            ROSTER_MIN_FIELDS,
            line.split_whitespace().count()
        ));
    };

    if !AreaId::is_area_label(label) {
        return RowOutcome::NonArea;
    }

    let parsed = NeuronId::parse_field(id).and_then(|id| {
        let position = Position::parse_fields(x, y, z)?;
        let area = AreaId::parse_label(label)?;
        Ok(NeuronRecord { id, position, area })
    });

    match parsed {
        Ok(record) => RowOutcome::Neuron(record),
        Err(e) => RowOutcome::Malformed(e.to_string()),
    }
}
