//! CLI argument parsing for per-crate debug flags
//!
//! Supports flags like `--debug-areagraph-connectome` to raise one crate to debug level.

use std::collections::HashMap;
use std::env;

use crate::KNOWN_CRATES;

/// Level for crates without a debug flag, unless overridden
pub const DEFAULT_LEVEL: &str = "info";

/// Parse debug flags from command-line arguments
///
/// # Example
/// ```rust
/// use areagraph_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-areagraph-connectome".to_string()]);
/// assert!(flags.is_enabled("areagraph-connectome"));
/// ```
#[derive(Debug, Clone)]
pub struct CrateDebugFlags {
    pub enabled_crates: HashMap<String, bool>,
    /// Level applied to everything not raised to debug
    pub default_level: String,
}

impl Default for CrateDebugFlags {
    fn default() -> Self {
        Self {
            enabled_crates: HashMap::new(),
            default_level: DEFAULT_LEVEL.to_string(),
        }
    }
}

impl CrateDebugFlags {
    /// Parse debug flags from command-line arguments
    ///
    /// Looks for arguments matching `--debug-{crate-name}`.
    /// Also supports `--debug-all` to enable all crates.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = CrateDebugFlags::default();
        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
            } else if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enable(crate_name);
            }
        }
        flags
    }

    /// Same flags with a different level for everything else.
    pub fn with_default_level(mut self, level: impl Into<String>) -> Self {
        self.default_level = level.into().trim().to_lowercase();
        self
    }

    pub fn enable(&mut self, crate_name: &str) {
        self.enabled_crates.insert(crate_name.to_string(), true);
    }

    pub fn enable_all(&mut self) {
        for crate_name in KNOWN_CRATES {
            self.enable(crate_name);
        }
    }

    /// Check if debug is enabled for a specific crate
    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains_key(crate_name)
    }

    /// Get all enabled crates, sorted
    pub fn enabled_crates(&self) -> Vec<&String> {
        let mut crates: Vec<&String> = self.enabled_crates.keys().collect();
        crates.sort();
        crates
    }

    /// Check if debug is enabled for any crate
    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// `tracing::Level::DEBUG` if enabled, `tracing::Level::INFO` otherwise.
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Create a tracing filter from debug flags
    ///
    /// Returns a filter string that can be used with `EnvFilter`.
    /// Format: "areagraph-config=debug,areagraph-connectome=debug,info", or the default
    /// level alone if none enabled.
    pub fn to_filter_string(&self) -> String {
        let mut filters: Vec<String> = self
            .enabled_crates()
            .into_iter()
            .map(|crate_name| format!("{}=debug", crate_name))
            .collect();
        filters.push(self.default_level.clone());
        filters.join(",")
    }
}

/// Parse debug flags from the process arguments and the `AREAGRAPH_DEBUG` environment
/// variable.
///
/// Environment variable format: comma-separated crate names, e.g.
/// "areagraph-connectome,areagraph-config", or "all".
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());

    if let Ok(env_var) = env::var("AREAGRAPH_DEBUG") {
        if env_var.trim() == "all" {
            flags.enable_all();
        } else {
            for crate_name in env_var.split(',') {
                let crate_name = crate_name.trim();
                if !crate_name.is_empty() {
                    flags.enable(crate_name);
                }
            }
        }
    }

    flags
}

/// Generate help text for debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variable:
  AREAGRAPH_DEBUG={{crate-name}}[,{{crate-name}}]  Enable debug for crates (comma-separated)
  AREAGRAPH_DEBUG=all                               Enable debug for all crates

Examples:
  --debug-areagraph-connectome
  AREAGRAPH_DEBUG=areagraph-connectome,areagraph-config
"#,
        KNOWN_CRATES.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_crate_flag() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-areagraph-connectome".to_string()]);
        assert!(flags.is_enabled("areagraph-connectome"));
        assert!(!flags.is_enabled("areagraph-config"));
    }

    #[test]
    fn test_debug_all() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-all".to_string()]);
        for crate_name in KNOWN_CRATES {
            assert!(flags.is_enabled(crate_name), "{} should be enabled", crate_name);
        }
    }

    #[test]
    fn test_filter_string_is_sorted() {
        let flags = CrateDebugFlags::from_args(vec![
            "--debug-areagraph-connectome".to_string(),
            "--debug-areagraph-config".to_string(),
        ]);
        assert_eq!(
            flags.to_filter_string(),
            "areagraph-config=debug,areagraph-connectome=debug,info"
        );
    }

    #[test]
    fn test_default_level() {
        let flags = CrateDebugFlags::default().with_default_level("WARN");
        assert_eq!(flags.to_filter_string(), "warn");
        assert!(!flags.any_enabled());
    }

    #[test]
    fn test_log_level() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-areagraph-connectome".to_string()]);
        assert_eq!(flags.log_level("areagraph-connectome"), tracing::Level::DEBUG);
        assert_eq!(flags.log_level("areagraph-config"), tracing::Level::INFO);
    }
}
