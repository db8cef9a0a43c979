// Copyright 2025 areagraph developers
// SPDX-License-Identifier: Apache-2.0

//! # areagraph-observability
//!
//! Logging setup shared by the areagraph crates, with per-crate debug flag support.
//!
//! ## Features
//! - `file-logging`: per-crate JSON log files with run folders and retention

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Known areagraph crate names (also their `tracing` targets) for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "areagraph",
    "areagraph-structures",
    "areagraph-config",
    "areagraph-observability",
    "areagraph-connectome",
];
