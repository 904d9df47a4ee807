//! Store configuration.

use std::path::PathBuf;

/// Label used when neither the file name nor a start time is available.
pub const DEFAULT_LABEL: &str = "Untitled Route";

/// Configuration for opening a [`crate::RouteStore`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database file. `None` opens a private in-memory database.
    /// Default: None
    pub path: Option<PathBuf>,

    /// How long SQLite waits on a locked database before failing.
    /// Default: 5000 ms
    pub busy_timeout_ms: u64,

    /// Fallback label for routes saved or imported without one.
    /// Default: "Untitled Route"
    pub default_label: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: 5000,
            default_label: DEFAULT_LABEL.to_string(),
        }
    }
}

impl StoreConfig {
    /// In-memory store (for testing).
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Store backed by a database file.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Pick a label: the trimmed candidate if non-empty, else the configured default.
    pub fn label_or_default(&self, candidate: Option<&str>) -> String {
        candidate
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.default_label.clone())
    }
}
