use std::fmt::Write as _;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a whole phase (load, scan, preview, or execute).
///
/// Per-record failures during execution are not represented here,
/// see [`crate::batch_rename::ExecutionError`].
#[derive(Error, Debug)]
pub enum RenameError {
    #[error("Missing required selection: {0}")]
    Config(String),

    #[error("Column '{column}' not found, available columns: {}", .available.join(", "))]
    MissingColumn { column: String, available: Vec<String> },

    #[error("Duplicate keys (case-insensitive) in column '{column}':\n{}", list_lines(.keys))]
    DuplicateKeys { column: String, keys: Vec<String> },

    #[error("Duplicate target names in column '{column}':\n{}", conflict_lines(.conflicts))]
    DuplicateTargets {
        column: String,
        /// `(target name, key)` pairs of every conflicting row.
        conflicts: Vec<(String, String)>,
    },

    #[error("Mapping file is too large: {} ({size} bytes, limit {limit} bytes)", .path.display())]
    TableTooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("Failed to read mapping file {}: {message}", .path.display())]
    Table { path: PathBuf, message: String },

    #[error("IO error for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{tool}' not found in PATH, it is required for creating {format} archives")]
    DependencyMissing { tool: String, format: String },

    #[error("{0} has not been run yet")]
    NotLoaded(&'static str),
}

impl RenameError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn table(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Table {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

fn list_lines(items: &[String]) -> String {
    items.iter().fold(String::new(), |mut output, item| {
        let _ = writeln!(output, "- {item}");
        output
    })
}

fn conflict_lines(conflicts: &[(String, String)]) -> String {
    conflicts.iter().fold(String::new(), |mut output, (target, key)| {
        let _ = writeln!(output, "- {target} (from: {key})");
        output
    })
}
