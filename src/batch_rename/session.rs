//! Session state shared by the load, match, preview, and execute phases.

use std::path::{Path, PathBuf};

use crate::batch_rename::RenameError;
use crate::batch_rename::execute::{ExecutionEvent, Executor, FileOps, LocalFileOps, RunSummary};
use crate::batch_rename::mapping::Mapping;
use crate::batch_rename::matcher::{self, MatchResult, MatchType};
use crate::batch_rename::preview::{Outcome, PreviewOptions, PreviewRecord, PreviewResolver};
use crate::batch_rename::table;

/// Everything selected by the user for one session.
#[derive(Debug, Clone, Default)]
pub struct RenameSettings {
    pub mapping_path: PathBuf,
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
    /// Key column name, defaults to the first column.
    pub key_column: Option<String>,
    /// Target name column name, defaults to the second column.
    pub target_column: Option<String>,
    pub match_type: MatchType,
    pub options: PreviewOptions,
}

/// Counts from scanning and matching the source directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
}

/// Holds the mapping, match results, and records between phases.
///
/// Loading the mapping resets the later phases. Matching replaces the records
/// with unmatched entries, which the next preview keeps at the end of the table.
#[derive(Debug)]
pub struct RenameSession<O: FileOps = LocalFileOps> {
    settings: RenameSettings,
    ops: O,
    mapping: Option<Mapping>,
    matches: Option<MatchResult>,
    records: Vec<PreviewRecord>,
}

impl RenameSession {
    /// Create a session that works on the local filesystem.
    #[must_use]
    pub const fn new(settings: RenameSettings) -> Self {
        Self::with_ops(settings, LocalFileOps)
    }
}

impl<O: FileOps> RenameSession<O> {
    pub const fn with_ops(settings: RenameSettings, ops: O) -> Self {
        Self {
            settings,
            ops,
            mapping: None,
            matches: None,
            records: Vec::new(),
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &RenameSettings {
        &self.settings
    }

    #[must_use]
    pub const fn mapping(&self) -> Option<&Mapping> {
        self.mapping.as_ref()
    }

    #[must_use]
    pub const fn matches(&self) -> Option<&MatchResult> {
        self.matches.as_ref()
    }

    #[must_use]
    pub fn records(&self) -> &[PreviewRecord] {
        &self.records
    }

    /// Number of records waiting for execution.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.records.iter().filter(|r| r.outcome.is_pending()).count()
    }

    /// List the column names of the mapping file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read.
    pub fn columns(&self) -> Result<Vec<String>, RenameError> {
        table::read_columns(&self.settings.mapping_path)
    }

    /// Read and validate the mapping file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, a column is missing,
    /// or the rows contain duplicate keys or target names.
    pub fn load_mapping(&mut self) -> Result<&Mapping, RenameError> {
        self.mapping = None;
        self.matches = None;
        self.records.clear();

        let table = table::read_table(&self.settings.mapping_path)?;
        let key_column = resolve_column(self.settings.key_column.as_deref(), &table.headers, 0)?;
        let target_column = resolve_column(self.settings.target_column.as_deref(), &table.headers, 1)?;
        let mapping = Mapping::from_table(&table, &key_column, &target_column)?;

        Ok(self.mapping.insert(mapping))
    }

    /// List the source directory and match its entries against the mapping keys.
    ///
    /// # Errors
    /// Returns an error if the mapping is not loaded or the directory cannot be read.
    pub fn scan(&mut self) -> Result<ScanSummary, RenameError> {
        let mapping = self.mapping.as_ref().ok_or(RenameError::NotLoaded("Loading the mapping"))?;
        let kind = self.settings.options.mode.entry_kind();
        let entries = matcher::list_entries(&self.settings.source_dir, kind)?;

        let matches = matcher::match_entries(mapping.keys(), &entries, self.settings.match_type);
        self.records = matches
            .unmatched
            .iter()
            .enumerate()
            .map(|(i, entry)| PreviewRecord::unmatched(i + 1, entry.file_name.clone()))
            .collect();

        let summary = ScanSummary {
            total: entries.len(),
            matched: matches.matched_count(),
            unmatched: matches.unmatched.len(),
        };
        self.matches = Some(matches);
        Ok(summary)
    }

    /// Resolve target names and outcomes for all matched entries.
    ///
    /// Unmatched records from the previous pass are kept after the matched records.
    ///
    /// # Errors
    /// Returns an error if matching has not been run.
    pub fn preview(&mut self) -> Result<&[PreviewRecord], RenameError> {
        let mapping = self.mapping.as_ref().ok_or(RenameError::NotLoaded("Loading the mapping"))?;
        let matches = self.matches.as_ref().ok_or(RenameError::NotLoaded("Matching"))?;

        let carried: Vec<PreviewRecord> = std::mem::take(&mut self.records)
            .into_iter()
            .filter(|record| record.outcome == Outcome::Unmatched)
            .collect();

        let ops = &self.ops;
        let resolver = PreviewResolver::new(self.settings.options, &self.settings.target_dir, |path: &Path| {
            ops.exists(path)
        });
        self.records = resolver.resolve(matches, mapping, carried);
        Ok(&self.records)
    }

    /// Copy or compress every pending record into the target directory.
    ///
    /// # Errors
    /// Returns an error before any record is processed if a required archiver is missing
    /// or the target directory cannot be created.
    pub fn execute<F>(&mut self, on_event: F) -> Result<RunSummary, RenameError>
    where
        F: FnMut(&ExecutionEvent<'_>),
    {
        Executor::new(
            &self.ops,
            &self.settings.source_dir,
            &self.settings.target_dir,
            self.settings.options,
        )
        .execute(&mut self.records, on_event)
    }
}

/// Use the configured column name or fall back to the column at `default_index`.
fn resolve_column(configured: Option<&str>, headers: &[String], default_index: usize) -> Result<String, RenameError> {
    match configured.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => Ok(name.to_string()),
        None => headers.get(default_index).cloned().ok_or_else(|| {
            RenameError::Config(format!(
                "key and target name columns, the mapping file has only {} column(s)",
                headers.len()
            ))
        }),
    }
}

#[cfg(test)]
mod session_tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn resolve_column_prefers_configured_name() {
        let headers = headers(&["Name", "File"]);
        assert_eq!(resolve_column(Some(" File "), &headers, 0).unwrap(), "File");
    }

    #[test]
    fn resolve_column_defaults_to_position() {
        let headers = headers(&["Name", "File"]);
        assert_eq!(resolve_column(None, &headers, 0).unwrap(), "Name");
        assert_eq!(resolve_column(Some(""), &headers, 1).unwrap(), "File");
    }

    #[test]
    fn resolve_column_needs_enough_columns() {
        let headers = headers(&["Name"]);
        assert!(matches!(resolve_column(None, &headers, 1), Err(RenameError::Config(_))));
    }

    #[test]
    fn phases_must_run_in_order() {
        let mut session = RenameSession::new(RenameSettings::default());
        assert!(matches!(session.scan(), Err(RenameError::NotLoaded(_))));
        assert!(matches!(session.preview(), Err(RenameError::NotLoaded(_))));
    }

    #[test]
    fn execute_without_preview_does_nothing() {
        let mut session = RenameSession::new(RenameSettings::default());
        assert_eq!(session.execute(|_| {}).unwrap(), RunSummary::default());
    }
}
