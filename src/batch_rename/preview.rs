//! Target name resolution and outcome classification before anything is written.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::Deserialize;

use crate::batch_rename::archive::ArchiveFormat;
use crate::batch_rename::mapping::Mapping;
use crate::batch_rename::matcher::{EntryKind, FilesystemEntry, MatchResult};
use crate::batch_rename::sanitize::{sanitize_name, split_extension};

/// Label shown instead of a key for unmatched records.
pub const NO_KEY_LABEL: &str = "N/A";

/// Whether files or folders are processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenameMode {
    /// Copy matching files
    #[default]
    File,
    /// Copy or compress matching folders
    Folder,
}

/// What to do when one key matches several entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateHandling {
    /// Append a running number to each target name
    #[default]
    Suffix,
    /// Skip every entry of the key
    Skip,
}

/// State of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pending,
    Success,
    Skipped,
    Unmatched,
    PreviewConflict,
    TargetExists,
    Error(String),
}

/// One row of the preview / result table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRecord {
    /// 1-based position in the table.
    pub index: usize,
    /// Key that matched the source, `None` for unmatched entries.
    pub matched_key: Option<String>,
    /// Source name for display.
    pub source_name: String,
    /// Source name as stored on disk.
    pub source_file: OsString,
    pub target_name: String,
    pub outcome: Outcome,
}

/// Options that affect target names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreviewOptions {
    pub mode: RenameMode,
    pub duplicates: DuplicateHandling,
    /// Archive format for folder results. Ignored in file mode.
    pub compress: Option<ArchiveFormat>,
}

/// Computes target names and outcomes for matched entries.
pub struct PreviewResolver<'a, F>
where
    F: Fn(&Path) -> bool,
{
    options: PreviewOptions,
    target_dir: &'a Path,
    exists: F,
}

impl RenameMode {
    /// Kind of directory entry handled in this mode.
    #[must_use]
    pub const fn entry_kind(self) -> EntryKind {
        match self {
            Self::File => EntryKind::File,
            Self::Folder => EntryKind::Directory,
        }
    }
}

impl fmt::Display for RenameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "files"),
            Self::Folder => write!(f, "folders"),
        }
    }
}

impl Outcome {
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// True for states set by execution.
    #[must_use]
    pub const fn is_executed(&self) -> bool {
        matches!(self, Self::Success | Self::Error(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Success => write!(f, "Success"),
            Self::Skipped => write!(f, "Skipped"),
            Self::Unmatched => write!(f, "Unmatched"),
            Self::PreviewConflict => write!(f, "Preview conflict"),
            Self::TargetExists => write!(f, "Target exists"),
            Self::Error(message) => write!(f, "Error: {message}"),
        }
    }
}

impl PreviewRecord {
    /// Record for an entry that did not match any key.
    #[must_use]
    pub fn unmatched(index: usize, source_file: impl Into<OsString>) -> Self {
        let source_file = source_file.into();
        Self {
            index,
            matched_key: None,
            source_name: crate::os_str_to_string(&source_file),
            source_file,
            target_name: String::new(),
            outcome: Outcome::Unmatched,
        }
    }

    fn matched(index: usize, key: &str, source: &FilesystemEntry, target_name: String, outcome: Outcome) -> Self {
        Self {
            index,
            matched_key: Some(key.to_string()),
            source_name: source.name.clone(),
            source_file: source.file_name.clone(),
            target_name,
            outcome,
        }
    }

    /// Matched key or the placeholder label.
    #[must_use]
    pub fn key_label(&self) -> &str {
        self.matched_key.as_deref().unwrap_or(NO_KEY_LABEL)
    }
}

impl PreviewOptions {
    /// Archive format used for results, only set when compressing folders.
    #[must_use]
    pub const fn archive_format(&self) -> Option<ArchiveFormat> {
        match self.mode {
            RenameMode::File => None,
            RenameMode::Folder => self.compress,
        }
    }
}

impl<'a, F> PreviewResolver<'a, F>
where
    F: Fn(&Path) -> bool,
{
    /// Create a resolver that checks `target_dir` for existing names with `exists`.
    pub const fn new(options: PreviewOptions, target_dir: &'a Path, exists: F) -> Self {
        Self {
            options,
            target_dir,
            exists,
        }
    }

    /// Resolve all matched groups into records.
    ///
    /// Groups are processed in their discovery order.
    /// Records in `carried` are appended unchanged after the matched records,
    /// except that their indices continue the numbering.
    #[must_use]
    pub fn resolve(
        &self,
        matches: &MatchResult,
        mapping: &Mapping,
        carried: impl IntoIterator<Item = PreviewRecord>,
    ) -> Vec<PreviewRecord> {
        let mut records = Vec::new();
        let mut reserved: HashSet<String> = HashSet::new();

        for group in &matches.groups {
            let base_target = self.base_target_name(mapping.target_name(&group.key).unwrap_or_default());
            let is_duplicate = group.entries.len() > 1;

            if is_duplicate && self.options.duplicates == DuplicateHandling::Skip {
                for source in &group.entries {
                    records.push(PreviewRecord::matched(
                        records.len() + 1,
                        &group.key,
                        source,
                        base_target.clone(),
                        Outcome::Skipped,
                    ));
                }
                continue;
            }

            for (position, source) in group.entries.iter().enumerate() {
                let target_name = if is_duplicate {
                    let (stem, extension) = split_extension(&base_target);
                    sanitize_name(&format!("{stem}_{}{extension}", position + 1))
                } else {
                    sanitize_name(&base_target)
                };

                let outcome = self.classify(&target_name, &reserved);
                if outcome.is_pending() {
                    reserved.insert(target_name.to_lowercase());
                }

                records.push(PreviewRecord::matched(
                    records.len() + 1,
                    &group.key,
                    source,
                    target_name,
                    outcome,
                ));
            }
        }

        for mut record in carried {
            record.index = records.len() + 1;
            records.push(record);
        }

        records
    }

    /// Sanitized mapped name, with the archive extension when compressing folders.
    fn base_target_name(&self, mapped_name: &str) -> String {
        let sanitized = sanitize_name(mapped_name);
        match self.options.archive_format() {
            Some(format) => {
                let (stem, _) = split_extension(&sanitized);
                format!("{stem}.{}", format.extension())
            }
            None => sanitized,
        }
    }

    fn classify(&self, target_name: &str, reserved: &HashSet<String>) -> Outcome {
        if reserved.contains(&target_name.to_lowercase()) {
            Outcome::PreviewConflict
        } else if (self.exists)(&self.target_path(target_name)) {
            Outcome::TargetExists
        } else {
            Outcome::Pending
        }
    }

    fn target_path(&self, target_name: &str) -> PathBuf {
        self.target_dir.join(target_name)
    }
}
