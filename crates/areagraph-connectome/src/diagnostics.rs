// Copyright 2025 areagraph developers
// SPDX-License-Identifier: Apache-2.0

//! Diagnostics attached to every parse, aggregation and sweep.
//!
//! Recovered problems are counted exhaustively and the first [`MAX_RECORDED_ISSUES`] of
//! them are kept verbatim so a caller can see *what* was skipped, not only how much.

use serde::Serialize;

/// Upper bound on the number of individual issues kept per diagnostics record.
pub const MAX_RECORDED_ISSUES: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Row failed structural or numeric parsing
    MalformedRow,
    /// Roster row whose label does not follow the `area_` convention
    NonAreaRow,
    /// Roster lists the same neuron id more than once (last row wins)
    DuplicateNeuron,
    /// Edge endpoint is not in the roster
    UnresolvedReference,
    /// Edge between two neurons of one area, dropped by policy
    SelfPairExcluded,
    /// Optional per-step file does not exist
    MissingFile,
    /// Reading stopped early because of an I/O failure
    ReadError,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
    pub detail: String,
}

/// Counters plus a bounded sample of individual issues.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    /// Data rows seen (comments and blank lines excluded)
    pub rows_read: u64,
    /// Rows that produced a value
    pub rows_accepted: u64,
    pub malformed_rows: u64,
    pub non_area_rows: u64,
    pub duplicate_neurons: u64,
    pub unresolved_references: u64,
    pub self_pairs_excluded: u64,
    pub missing_files: u64,
    pub read_errors: u64,
    pub issues: Vec<Issue>,
    #[serde(skip)]
    source: Option<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diagnostics whose recorded issues name `source` (usually a file path).
    pub fn for_source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::default()
        }
    }

    /// Count one issue and keep its details if there is room.
    pub fn record(&mut self, kind: IssueKind, line: Option<u64>, detail: impl Into<String>) {
        self.bump(kind, 1);
        if self.issues.len() < MAX_RECORDED_ISSUES {
            self.issues.push(Issue {
                kind,
                source: self.source.clone(),
                line,
                detail: detail.into(),
            });
        }
    }

    /// Count issues without keeping details.
    pub fn count(&mut self, kind: IssueKind, n: u64) {
        self.bump(kind, n);
    }

    fn bump(&mut self, kind: IssueKind, n: u64) {
        let counter = match kind {
            IssueKind::MalformedRow => &mut self.malformed_rows,
            IssueKind::NonAreaRow => &mut self.non_area_rows,
            IssueKind::DuplicateNeuron => &mut self.duplicate_neurons,
            IssueKind::UnresolvedReference => &mut self.unresolved_references,
            IssueKind::SelfPairExcluded => &mut self.self_pairs_excluded,
            IssueKind::MissingFile => &mut self.missing_files,
            IssueKind::ReadError => &mut self.read_errors,
        };
        *counter += n;
    }

    pub fn count_of(&self, kind: IssueKind) -> u64 {
        match kind {
            IssueKind::MalformedRow => self.malformed_rows,
            IssueKind::NonAreaRow => self.non_area_rows,
            IssueKind::DuplicateNeuron => self.duplicate_neurons,
            IssueKind::UnresolvedReference => self.unresolved_references,
            IssueKind::SelfPairExcluded => self.self_pairs_excluded,
            IssueKind::MissingFile => self.missing_files,
            IssueKind::ReadError => self.read_errors,
        }
    }

    /// Fold another record into this one. Issue samples stay capped.
    pub fn merge(&mut self, other: &Diagnostics) {
        self.rows_read += other.rows_read;
        self.rows_accepted += other.rows_accepted;
        self.malformed_rows += other.malformed_rows;
        self.non_area_rows += other.non_area_rows;
        self.duplicate_neurons += other.duplicate_neurons;
        self.unresolved_references += other.unresolved_references;
        self.self_pairs_excluded += other.self_pairs_excluded;
        self.missing_files += other.missing_files;
        self.read_errors += other.read_errors;

        let room = MAX_RECORDED_ISSUES.saturating_sub(self.issues.len());
        self.issues.extend(other.issues.iter().take(room).cloned());
    }

    /// True when nothing was skipped, dropped or missing.
    pub fn is_clean(&self) -> bool {
        self.malformed_rows == 0
            && self.non_area_rows == 0
            && self.duplicate_neurons == 0
            && self.unresolved_references == 0
            && self.missing_files == 0
            && self.read_errors == 0
    }

    /// Fraction of data rows that were malformed (0 when nothing was read).
    pub fn malformed_ratio(&self) -> f64 {
        if self.rows_read == 0 {
            0.0
        } else {
            self.malformed_rows as f64 / self.rows_read as f64
        }
    }
}
