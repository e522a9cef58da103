//! Compressing result folders into archives.

use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use clap::ValueEnum;
use itertools::Itertools;
use serde::Deserialize;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::batch_rename::RenameError;
use crate::batch_rename::execute::ExecutionError;

/// Supported archive formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
pub enum ArchiveFormat {
    /// Zip archive, created natively
    #[default]
    #[serde(rename = "zip")]
    Zip,
    /// 7-Zip archive, requires `7z` in PATH
    #[value(name = "7z")]
    #[serde(rename = "7z")]
    SevenZ,
    /// RAR archive, requires `rar` in PATH
    #[serde(rename = "rar")]
    Rar,
}

/// Archive format together with the external tool it needs, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archiver {
    format: ArchiveFormat,
    tool: Option<PathBuf>,
}

impl ArchiveFormat {
    /// File extension without the leading dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::SevenZ => "7z",
            Self::Rar => "rar",
        }
    }

    /// Name of the external executable used for this format.
    #[must_use]
    pub const fn tool_name(self) -> Option<&'static str> {
        match self {
            Self::Zip => None,
            Self::SevenZ => Some("7z"),
            Self::Rar => Some("rar"),
        }
    }

    const fn tool_arguments(self) -> &'static [&'static str] {
        match self {
            Self::Zip => &[],
            Self::SevenZ => &["a", "-t7z"],
            Self::Rar => &["a", "-r"],
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl Archiver {
    /// Find the external tool needed for the format using the given lookup.
    ///
    /// # Errors
    /// Returns `DependencyMissing` if the tool cannot be found.
    pub fn locate(format: ArchiveFormat, find_tool: impl Fn(&str) -> Option<PathBuf>) -> Result<Self, RenameError> {
        let tool = match format.tool_name() {
            Some(name) => Some(find_tool(name).ok_or_else(|| RenameError::DependencyMissing {
                tool: name.to_string(),
                format: format.to_string(),
            })?),
            None => None,
        };
        Ok(Self { format, tool })
    }

    /// Find the external tool needed for the format from `PATH`.
    ///
    /// # Errors
    /// Returns `DependencyMissing` if the tool cannot be found.
    pub fn locate_in_path(format: ArchiveFormat) -> Result<Self, RenameError> {
        Self::locate(format, find_in_path)
    }

    #[must_use]
    pub const fn format(&self) -> ArchiveFormat {
        self.format
    }

    /// Compress the `source` directory into a new archive at `destination`.
    ///
    /// Entries inside the archive are rooted at the source directory name.
    /// A partially written archive is removed on failure.
    /// If removing it fails too, the returned error names the leftover file.
    ///
    /// # Errors
    /// Returns an error if reading the source or writing the archive fails.
    pub fn create(&self, source: &Path, destination: &Path) -> Result<(), ExecutionError> {
        let result = match &self.tool {
            Some(tool) => self.run_tool(tool, source, destination),
            None => create_zip(source, destination),
        };
        result.map_err(|error| remove_partial_archive(destination, error))
    }

    fn run_tool(&self, tool: &Path, source: &Path, destination: &Path) -> Result<(), ExecutionError> {
        let source = std::path::absolute(source)?;
        let destination = std::path::absolute(destination)?;
        let output = Command::new(tool)
            .args(self.format.tool_arguments())
            .arg(&destination)
            .arg(&source)
            .output()
            .map_err(|e| ExecutionError::ArchiverFailure(format!("failed to run {}: {e}", tool.display())))?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(ExecutionError::ArchiverFailure(if stderr.is_empty() {
                format!("{} exited with {}", self.format.tool_name().unwrap_or_default(), output.status)
            } else {
                stderr
            }))
        }
    }
}

/// Look up an executable from `PATH`.
pub(crate) fn find_in_path(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Write a zip archive of `source` with entry names starting from the directory name.
fn create_zip(source: &Path, destination: &Path) -> Result<(), ExecutionError> {
    let root = source.parent().unwrap_or_else(|| Path::new(""));
    let mut writer = ZipWriter::new(File::create(destination)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| ExecutionError::Other(e.to_string()))?;
        let name = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .join("/");

        if entry.path().is_dir() {
            writer
                .add_directory(format!("{name}/"), options)
                .map_err(|e| ExecutionError::ArchiverFailure(e.to_string()))?;
        } else {
            writer
                .start_file(name, options)
                .map_err(|e| ExecutionError::ArchiverFailure(e.to_string()))?;
            let mut input = File::open(entry.path())?;
            io::copy(&mut input, &mut writer)?;
        }
    }

    writer
        .finish()
        .map_err(|e| ExecutionError::ArchiverFailure(e.to_string()))?;
    Ok(())
}

/// Remove a partially written archive after `error`.
fn remove_partial_archive(destination: &Path, error: ExecutionError) -> ExecutionError {
    if !destination.exists() {
        return error;
    }
    match std::fs::remove_file(destination) {
        Ok(()) => error,
        Err(cleanup) => ExecutionError::Other(format!(
            "{error}; partial archive left at {}: {cleanup}",
            destination.display()
        )),
    }
}
