//! Materializing pending preview records into the target directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::batch_rename::RenameError;
use crate::batch_rename::archive::{self, Archiver};
use crate::batch_rename::preview::{Outcome, PreviewOptions, PreviewRecord, RenameMode};

/// Maximum length of the error message stored in a record outcome.
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 60;

/// Failure of a single record. Does not stop the run.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Source missing: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("Destination exists: {}", .0.display())]
    DestinationExists(PathBuf),

    #[error("Archiver failed: {0}")]
    ArchiverFailure(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

/// Filesystem operations needed to execute records.
pub trait FileOps {
    fn exists(&self, path: &Path) -> bool;

    /// Create the target directory and its parents.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Copy a single file with its modification time.
    ///
    /// # Errors
    /// Returns an error if copying fails.
    fn copy_file(&self, source: &Path, destination: &Path) -> Result<(), ExecutionError>;

    /// Copy a directory and all of its contents to a new directory.
    /// Files keep their modification times.
    ///
    /// # Errors
    /// Returns an error if reading or copying fails.
    fn copy_tree(&self, source: &Path, destination: &Path) -> Result<(), ExecutionError>;

    /// Compress a directory into a new archive file.
    ///
    /// # Errors
    /// Returns an error if archiving fails.
    fn create_archive(&self, archiver: &Archiver, source: &Path, destination: &Path) -> Result<(), ExecutionError>;

    /// Find an external executable by name.
    fn find_tool(&self, name: &str) -> Option<PathBuf>;
}

/// [`FileOps`] backed by the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileOps;

/// Counts from one execution run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub success: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Progress notification sent after each record.
#[derive(Debug)]
pub struct ExecutionEvent<'a> {
    /// 1-based position of the record among all records.
    pub position: usize,
    pub total: usize,
    pub record: &'a PreviewRecord,
    /// Full error for a failed record. The record outcome holds a shortened message.
    pub error: Option<&'a ExecutionError>,
}

/// Executes pending records using the given filesystem operations.
pub struct Executor<'a, O: FileOps> {
    ops: &'a O,
    source_dir: &'a Path,
    target_dir: &'a Path,
    options: PreviewOptions,
}

impl FileOps for LocalFileOps {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn copy_file(&self, source: &Path, destination: &Path) -> Result<(), ExecutionError> {
        copy_with_mtime(source, destination)?;
        Ok(())
    }

    fn copy_tree(&self, source: &Path, destination: &Path) -> Result<(), ExecutionError> {
        for entry in WalkDir::new(source).follow_links(true) {
            let entry = entry.map_err(io::Error::from)?;
            let relative = entry
                .path()
                .strip_prefix(source)
                .map_err(|e| ExecutionError::Other(e.to_string()))?;
            let target = destination.join(relative);
            if entry.file_type().is_dir() {
                fs::create_dir_all(&target)?;
            } else {
                copy_with_mtime(entry.path(), &target)?;
            }
        }
        Ok(())
    }

    fn create_archive(&self, archiver: &Archiver, source: &Path, destination: &Path) -> Result<(), ExecutionError> {
        archiver.create(source, destination)
    }

    fn find_tool(&self, name: &str) -> Option<PathBuf> {
        archive::find_in_path(name)
    }
}

impl RunSummary {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.success + self.skipped + self.errors
    }
}

impl<'a, O: FileOps> Executor<'a, O> {
    pub const fn new(ops: &'a O, source_dir: &'a Path, target_dir: &'a Path, options: PreviewOptions) -> Self {
        Self {
            ops,
            source_dir,
            target_dir,
            options,
        }
    }

    /// Process all pending records in order, updating their outcomes in place.
    ///
    /// Nothing is done if there are no pending records.
    /// Records that are not pending are left untouched and counted as skipped,
    /// unless they already succeeded or failed in an earlier run.
    ///
    /// # Errors
    /// Returns an error before any record is processed if a required archiver
    /// is missing or the target directory cannot be created.
    pub fn execute<F>(&self, records: &mut [PreviewRecord], mut on_event: F) -> Result<RunSummary, RenameError>
    where
        F: FnMut(&ExecutionEvent<'_>),
    {
        let mut summary = RunSummary::default();
        if !records.iter().any(|record| record.outcome.is_pending()) {
            return Ok(summary);
        }

        let archiver = self
            .options
            .archive_format()
            .map(|format| Archiver::locate(format, |name| self.ops.find_tool(name)))
            .transpose()?;

        self.ops
            .create_dir_all(self.target_dir)
            .map_err(|e| RenameError::io(self.target_dir, e))?;

        let total = records.len();
        for (position, record) in records.iter_mut().enumerate() {
            if !record.outcome.is_pending() {
                if !record.outcome.is_executed() {
                    summary.skipped += 1;
                }
                continue;
            }

            let result = self.process(record, archiver.as_ref());
            match &result {
                Ok(()) => {
                    record.outcome = Outcome::Success;
                    summary.success += 1;
                }
                Err(error) => {
                    record.outcome = Outcome::Error(shorten_message(&error.to_string()));
                    summary.errors += 1;
                }
            }

            on_event(&ExecutionEvent {
                position: position + 1,
                total,
                record,
                error: result.as_ref().err(),
            });
        }

        Ok(summary)
    }

    /// Copy or compress one record after checking the filesystem state again.
    fn process(&self, record: &PreviewRecord, archiver: Option<&Archiver>) -> Result<(), ExecutionError> {
        let source = self.source_dir.join(&record.source_file);
        let destination = self.target_dir.join(&record.target_name);

        if self.ops.exists(&destination) {
            return Err(ExecutionError::DestinationExists(destination));
        }
        if !self.ops.exists(&source) {
            return Err(ExecutionError::SourceMissing(source));
        }

        match (archiver, self.options.mode) {
            (Some(archiver), _) => self.ops.create_archive(archiver, &source, &destination),
            (None, RenameMode::File) => self.ops.copy_file(&source, &destination),
            (None, RenameMode::Folder) => self.ops.copy_tree(&source, &destination),
        }
    }
}

/// Copy file contents, then set the modification time of the copy to match the source.
fn copy_with_mtime(source: &Path, destination: &Path) -> io::Result<()> {
    fs::copy(source, destination)?;
    let modified = fs::metadata(source)?.modified()?;
    fs::File::options()
        .write(true)
        .open(destination)?
        .set_modified(modified)
}

/// Limit an error message to [`MAX_ERROR_MESSAGE_LENGTH`] characters.
fn shorten_message(message: &str) -> String {
    message.chars().take(MAX_ERROR_MESSAGE_LENGTH).collect()
}
