// Copyright 2025 areagraph developers
// SPDX-License-Identifier: Apache-2.0

//! Lazy reader for one per-step edge-list file.
//!
//! Column convention: `<col0> <targetId> <col2> <sourceId> <col4> [...]`. Columns 0, 2 and
//! 4 are not used here but must be present; a row with fewer than five fields is treated
//! as partially written and dropped.

use crate::diagnostics::{Diagnostics, IssueKind};
use crate::error::{ConnectomeError, Result};
use crate::lines::{not_utf8, DataLines};
use areagraph_structures::NeuronId;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{trace, warn};

pub const EDGE_MIN_FIELDS: usize = 5;
pub const TARGET_COLUMN: usize = 1;
pub const SOURCE_COLUMN: usize = 3;

/// A directed connection `source -> target`. Weight comes from multiplicity only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub source: NeuronId,
    pub target: NeuronId,
}

impl Edge {
    pub const fn new(source: NeuronId, target: NeuronId) -> Self {
        Edge { source, target }
    }
}

/// Finite, single-pass sequence of edges from one file.
///
/// Not restartable: re-open the file to read it again. The underlying file handle is
/// owned by the stream and released when it is dropped.
pub struct EdgeStream<R = BufReader<File>> {
    lines: DataLines<R>,
    diagnostics: Diagnostics,
    finished: bool,
}

impl EdgeStream<BufReader<File>> {
    /// # Errors
    /// `ConnectomeError::NotFound` if the file does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ConnectomeError::from_open(path, e))?;
        Ok(Self {
            lines: DataLines::new(BufReader::new(file)),
            diagnostics: Diagnostics::for_source(path.display().to_string()),
            finished: false,
        })
    }
}

impl<R: BufRead> EdgeStream<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: DataLines::new(reader),
            diagnostics: Diagnostics::new(),
            finished: false,
        }
    }

    /// Rows read and dropped so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }
}

impl<R: BufRead> Iterator for EdgeStream<R> {
    type Item = Edge;

    fn next(&mut self) -> Option<Edge> {
        if self.finished {
            return None;
        }

        loop {
            let (line_number, parsed) = match self.lines.next_data_line() {
                Ok(Some((line_number, line))) => {
                    (line_number, line.map_err(not_utf8).and_then(parse_edge_row))
                }
                Ok(None) => {
                    self.finish();
                    return None;
                }
                Err(e) => {
                    let line = self.lines.line_number() + 1;
                    self.diagnostics
                        .record(IssueKind::ReadError, Some(line), e.to_string());
                    self.finish();
                    return None;
                }
            };

            self.diagnostics.rows_read += 1;
            match parsed {
                Ok(edge) => {
                    self.diagnostics.rows_accepted += 1;
                    return Some(edge);
                }
                Err(reason) => {
                    trace!(target: "areagraph-connectome", "Malformed edge row {}: {}", line_number, reason);
                    self.diagnostics
                        .record(IssueKind::MalformedRow, Some(line_number), reason);
                }
            }
        }
    }
}

impl<R> EdgeStream<R> {
    fn finish(&mut self) {
        self.finished = true;
        if self.diagnostics.malformed_rows > 0 || self.diagnostics.read_errors > 0 {
            warn!(
                target: "areagraph-connectome",
                "Edge file: dropped {} malformed rows of {} ({} read errors)",
                self.diagnostics.malformed_rows,
                self.diagnostics.rows_read,
                self.diagnostics.read_errors
            );
        }
    }
}

fn parse_edge_row(line: &str) -> std::result::Result<Edge, String> {
    let mut fields = line.split_whitespace();
    let (Some(_), Some(target), Some(_), Some(source), Some(_)) = (
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
    ) else {
        return Err(format!(
            "expected at least {} fields, got {}",
            EDGE_MIN_FIELDS,
            line.split_whitespace().count()
        ));
    };

    let target = NeuronId::parse_field(target).map_err(|e| e.to_string())?;
    let source = NeuronId::parse_field(source).map_err(|e| e.to_string())?;
    Ok(Edge { source, target })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn stream(input: &str) -> EdgeStream<Cursor<String>> {
        EdgeStream::from_reader(Cursor::new(input.to_string()))
    }

    #[test]
    fn test_column_convention() {
        let edges: Vec<_> = stream("0 7 0 3 1\n").collect();
        assert_eq!(edges, vec![Edge::new(NeuronId(3), NeuronId(7))]);
    }

    #[test]
    fn test_four_field_row_is_dropped() {
        let mut s = stream("# target source\n0 1 0 0 1\n0 2 0 1\n0 2 0 1 1\n");
        let edges: Vec<_> = s.by_ref().collect();
        assert_eq!(edges.len(), 2);
        assert_eq!(s.diagnostics().malformed_rows, 1);
        assert_eq!(s.diagnostics().issues[0].line, Some(3));
        assert_eq!(s.diagnostics().rows_read, 3);
    }

    #[test]
    fn test_non_integer_ids_are_dropped() {
        let mut s = stream("0 a 0 1 1\n0 1 0 -2 1\n0 1 0 2 1\n");
        assert_eq!(s.by_ref().count(), 1);
        assert_eq!(s.diagnostics().malformed_rows, 2);
    }

    #[test]
    fn test_stream_is_fused() {
        let mut s = stream("0 1 0 2 1\n");
        assert!(s.next().is_some());
        assert!(s.next().is_none());
        assert!(s.next().is_none());
    }

    #[test]
    fn test_open_missing_is_not_found() {
        match EdgeStream::open("/no/such/rank_0_step_10_out_network.txt") {
            Err(ConnectomeError::NotFound { path }) => {
                assert!(path.ends_with("rank_0_step_10_out_network.txt"))
            }
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("expected NotFound"),
        }
    }
}
