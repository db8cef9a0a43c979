// Copyright 2025 areagraph developers
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console logging is always available. With the `file-logging` feature, runs can also
//! write per-crate JSON log files into timestamped folders with retention cleanup.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::cli::CrateDebugFlags;
use crate::config::{LogFormat, LogOutput, LoggingConfig};

const RUN_PREFIX: &str = "run_";
const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Install a console subscriber filtered by `debug_flags`.
///
/// Returns `false` when a global subscriber was already installed (this one is dropped),
/// so calling it more than once is harmless.
pub fn init_console_logging(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> bool {
    let filter = EnvFilter::new(debug_flags.to_filter_string());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = match (config.format, config.output) {
        (LogFormat::Json, LogOutput::Stdout) => {
            builder.json().with_writer(std::io::stdout).try_init()
        }
        (LogFormat::Json, LogOutput::Stderr) => {
            builder.json().with_writer(std::io::stderr).try_init()
        }
        (LogFormat::Text, LogOutput::Stdout) => builder.with_writer(std::io::stdout).try_init(),
        (LogFormat::Text, LogOutput::Stderr) => builder.with_writer(std::io::stderr).try_init(),
    };
    result.is_ok()
}

/// Remove old `run_YYYYMMDD_HHMMSS` folders under `base_log_dir`.
///
/// Folders older than `retention_days` (default 30) are removed first, then only the
/// `retention_runs` (default 10) most recent folders are kept. Returns how many folders
/// were removed.
pub fn cleanup_old_logs(
    base_log_dir: &Path,
    retention_days: Option<u64>,
    retention_runs: Option<usize>,
) -> Result<usize> {
    if !base_log_dir.exists() {
        return Ok(0);
    }

    let retention_days = retention_days.unwrap_or(30);
    let retention_runs = retention_runs.unwrap_or(10);
    let cutoff_date = Utc::now() - chrono::Duration::days(retention_days as i64);

    let mut runs: Vec<(PathBuf, DateTime<Utc>)> = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)
        .with_context(|| format!("Failed to list log directory: {}", base_log_dir.display()))?
    {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let Some(timestamp) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(RUN_PREFIX))
        else {
            continue;
        };
        if let Ok(naive) = NaiveDateTime::parse_from_str(timestamp, RUN_TIMESTAMP_FORMAT) {
            runs.push((path, Utc.from_utc_datetime(&naive)));
        }
    }

    // Oldest first
    runs.sort_by_key(|(_, dt)| *dt);

    let expired = runs.iter().filter(|(_, dt)| *dt < cutoff_date).count();
    let surplus = (runs.len() - expired).saturating_sub(retention_runs);

    let mut removed = 0;
    for (path, _) in runs.iter().take(expired + surplus) {
        match std::fs::remove_dir_all(path) {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(
                target: "areagraph-observability",
                "Failed to remove old log directory {}: {}",
                path.display(),
                e
            ),
        }
    }
    Ok(removed)
}

#[cfg(feature = "file-logging")]
pub use file_logging::{init_logging, init_logging_default, LoggingGuard};

#[cfg(feature = "file-logging")]
mod file_logging {
    use super::*;
    use tracing_appender::rolling;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{Layer, Registry};

    /// Keeps the file writers alive; logs are flushed when it is dropped.
    pub struct LoggingGuard {
        _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
        log_dir: PathBuf,
    }

    impl LoggingGuard {
        /// Get the run folder path
        pub fn log_dir(&self) -> &Path {
            &self.log_dir
        }
    }

    /// Initialize logging with file output and console output
    ///
    /// Creates a timestamped folder structure:
    /// ```text
    /// ./logs/
    ///   └── run_20250101_120000/
    ///       ├── areagraph-connectome.log
    ///       ├── areagraph-config.log
    ///       └── areagraph.log (combined)
    /// ```
    ///
    /// # Arguments
    /// * `debug_flags` - Per-crate debug flags for filtering
    /// * `log_dir` - Base directory for logs (default: `./logs`)
    /// * `retention_days` - Keep logs for N days (default: 30)
    /// * `retention_runs` - Keep N most recent runs (default: 10)
    pub fn init_logging(
        debug_flags: &CrateDebugFlags,
        log_dir: Option<PathBuf>,
        retention_days: Option<u64>,
        retention_runs: Option<usize>,
    ) -> Result<LoggingGuard> {
        let base_log_dir = log_dir.unwrap_or_else(|| PathBuf::from("./logs"));

        let timestamp = Utc::now().format(RUN_TIMESTAMP_FORMAT);
        let run_folder = base_log_dir.join(format!("{}{}", RUN_PREFIX, timestamp));
        std::fs::create_dir_all(&run_folder)
            .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;

        cleanup_old_logs(&base_log_dir, retention_days, retention_runs)?;

        let filter = debug_flags.to_filter_string();
        let mut layers = Vec::new();
        let mut file_guards = Vec::new();

        let console_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(EnvFilter::new(&filter));
        layers.push(console_layer.boxed());

        for crate_name in crate::KNOWN_CRATES {
            let file_appender = rolling::never(&run_folder, format!("{}.log", crate_name));
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            file_guards.push(guard);

            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .json()
                .with_filter(EnvFilter::new(format!("{}=debug,off", crate_name)))
                .boxed();
            layers.push(file_layer);
        }

        let combined_appender = rolling::never(&run_folder, "areagraph.log");
        let (combined_non_blocking, combined_guard) =
            tracing_appender::non_blocking(combined_appender);
        file_guards.push(combined_guard);

        let combined_layer = tracing_subscriber::fmt::layer()
            .with_writer(combined_non_blocking)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .with_filter(EnvFilter::new(&filter))
            .boxed();
        layers.push(combined_layer);

        Registry::default()
            .with(layers)
            .try_init()
            .context("A global tracing subscriber is already installed")?;

        Ok(LoggingGuard {
            _file_guards: file_guards,
            log_dir: run_folder,
        })
    }

    /// Initialize logging with default settings
    pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
        init_logging(debug_flags, None, None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn run_dir(base: &Path, when: DateTime<Utc>) -> PathBuf {
        let path = base.join(format!("{}{}", RUN_PREFIX, when.format(RUN_TIMESTAMP_FORMAT)));
        std::fs::create_dir_all(&path).unwrap();
        path
    }

    #[test]
    fn test_cleanup_applies_age_then_count() {
        let dir = tempdir().unwrap();
        let now = Utc::now();
        let ancient = run_dir(dir.path(), now - chrono::Duration::days(400));
        let older = run_dir(dir.path(), now - chrono::Duration::hours(3));
        let recent = run_dir(dir.path(), now - chrono::Duration::hours(2));
        let newest = run_dir(dir.path(), now - chrono::Duration::hours(1));
        std::fs::create_dir_all(dir.path().join("not_a_run")).unwrap();

        let removed = cleanup_old_logs(dir.path(), Some(30), Some(2)).unwrap();

        assert_eq!(removed, 2);
        assert!(!ancient.exists());
        assert!(!older.exists());
        assert!(recent.exists());
        assert!(newest.exists());
        assert!(dir.path().join("not_a_run").exists());
    }

    #[test]
    fn test_cleanup_missing_dir_is_noop() {
        let removed = cleanup_old_logs(Path::new("/no/such/log/dir"), None, None).unwrap();
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_console_init_is_idempotent() {
        let flags = CrateDebugFlags::default();
        let config = LoggingConfig::default();
        let _ = init_console_logging(&flags, &config);
        assert!(!init_console_logging(&flags, &config));
    }
}
