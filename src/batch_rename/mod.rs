//! Batch rename engine driven by a key to target name mapping table.
//!
//! Entries in a source directory are matched against mapping keys, longest key first,
//! and copied or compressed into a target directory under their mapped names.
//! The work is split into phases that share a [`RenameSession`]:
//! load the mapping, scan and match, preview, and execute.

mod archive;
mod error;
mod execute;
mod mapping;
mod matcher;
mod preview;
mod report;
mod sanitize;
mod session;
mod table;

pub use archive::{ArchiveFormat, Archiver};
pub use error::RenameError;
pub use execute::{
    ExecutionError, ExecutionEvent, Executor, FileOps, LocalFileOps, MAX_ERROR_MESSAGE_LENGTH, RunSummary,
};
pub use mapping::{Mapping, MappingEntry};
pub use matcher::{EntryKind, FilesystemEntry, MatchGroup, MatchResult, MatchType, list_entries, match_entries};
pub use preview::{DuplicateHandling, NO_KEY_LABEL, Outcome, PreviewOptions, PreviewRecord, PreviewResolver, RenameMode};
pub use report::write_report;
pub use sanitize::{FALLBACK_NAME, MAX_FILENAME_LENGTH, sanitize_name, split_extension};
pub use session::{RenameSession, RenameSettings, ScanSummary};
pub use table::{MAX_TABLE_SIZE, Table, read_columns, read_table};
