// Copyright 2025 areagraph developers
// SPDX-License-Identifier: Apache-2.0

use areagraph_structures::StructuresError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Connectome analysis errors.
///
/// Only conditions that make a call meaningless are errors. Bad rows and edges that point
/// outside the roster are recovered locally and show up in [`crate::Diagnostics`].
#[derive(Error, Debug)]
pub enum ConnectomeError {
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("I/O error on {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid aggregation mode or tracked key: {0}")]
    InvalidModeOrKey(String),

    #[error(transparent)]
    Structures(#[from] StructuresError),
}

impl ConnectomeError {
    /// Map an `open` failure to `NotFound` or `Io` for the given path.
    pub(crate) fn from_open(path: &Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            ConnectomeError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConnectomeError::Io {
                context: path.display().to_string(),
                source: err,
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ConnectomeError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, ConnectomeError>;
