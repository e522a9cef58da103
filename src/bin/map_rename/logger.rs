use std::fs;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;

use map_rename::batch_rename::{
    ExecutionError, Mapping, Outcome, PreviewRecord, RenameSettings, RunSummary, ScanSummary,
};

/// Plain text log of one run with buffered writes.
pub struct FileLogger {
    writer: BufWriter<File>,
}

impl FileLogger {
    /// Create a new file logger, writing to ~/logs/map-rename/map_rename_<timestamp>.log
    pub(crate) fn new() -> Result<Self> {
        let log_dir = map_rename::config::LOG_DIR
            .as_deref()
            .context("Failed to get home directory")?;

        if !log_dir.exists() {
            fs::create_dir_all(log_dir).context("Failed to create log directory")?;
        }

        let log_path = log_dir.join(format!("map_rename_{}.log", Local::now().format("%Y-%m-%d_%H-%M-%S")));
        Self::create(&log_path)
    }

    fn create(log_path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    fn timestamp() -> String {
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// Log the selected paths and options.
    pub(crate) fn log_init(&mut self, settings: &RenameSettings) {
        let _ = writeln!(
            self.writer,
            "[{}] INIT \"{}\"",
            Self::timestamp(),
            settings.mapping_path.display()
        );
        let _ = writeln!(self.writer, "  source: {}", settings.source_dir.display());
        let _ = writeln!(self.writer, "  target: {}", settings.target_dir.display());
        if let Some(column) = &settings.key_column {
            let _ = writeln!(self.writer, "  key_column: {column}");
        }
        if let Some(column) = &settings.target_column {
            let _ = writeln!(self.writer, "  target_column: {column}");
        }
        let _ = writeln!(self.writer, "  mode: {}", settings.options.mode);
        let _ = writeln!(self.writer, "  match_type: {:?}", settings.match_type);
        let _ = writeln!(self.writer, "  duplicates: {:?}", settings.options.duplicates);
        if let Some(format) = settings.options.archive_format() {
            let _ = writeln!(self.writer, "  compress: {format}");
        }
        let _ = self.writer.flush();
    }

    pub(crate) fn log_load(&mut self, mapping: &Mapping) {
        let _ = writeln!(
            self.writer,
            "[{}] LOAD    {} mapping entries",
            Self::timestamp(),
            mapping.len()
        );
        let _ = self.writer.flush();
    }

    pub(crate) fn log_scan(&mut self, summary: &ScanSummary) {
        let _ = writeln!(
            self.writer,
            "[{}] SCAN    {} entries | matched: {} | unmatched: {}",
            Self::timestamp(),
            summary.total,
            summary.matched,
            summary.unmatched
        );
        let _ = self.writer.flush();
    }

    /// Log outcome counts of the preview.
    pub(crate) fn log_preview(&mut self, records: &[PreviewRecord]) {
        let count = |f: fn(&Outcome) -> bool| records.iter().filter(|r| f(&r.outcome)).count();
        let _ = writeln!(
            self.writer,
            "[{}] PREVIEW {} records | pending: {} | skipped: {} | conflicts: {} | existing: {} | unmatched: {}",
            Self::timestamp(),
            records.len(),
            count(Outcome::is_pending),
            count(|o| *o == Outcome::Skipped),
            count(|o| *o == Outcome::PreviewConflict),
            count(|o| *o == Outcome::TargetExists),
            count(|o| *o == Outcome::Unmatched),
        );
        let _ = self.writer.flush();
    }

    /// Log one executed record.
    /// Failures are written with the full error, the record only holds a shortened message.
    pub(crate) fn log_record(&mut self, position: &str, record: &PreviewRecord, error: Option<&ExecutionError>) {
        let message = match (error, &record.outcome) {
            (Some(error), _) => Some(error.to_string()),
            (None, Outcome::Error(message)) => Some(message.clone()),
            (None, _) => None,
        };
        if let Some(message) = message {
            let _ = writeln!(
                self.writer,
                "[{}] ERROR   {} - \"{}\" -> \"{}\" | {}",
                Self::timestamp(),
                position,
                record.source_name,
                record.target_name,
                message
            );
        } else {
            let _ = writeln!(
                self.writer,
                "[{}] SUCCESS {} - \"{}\" -> \"{}\"",
                Self::timestamp(),
                position,
                record.source_name,
                record.target_name
            );
        }
        let _ = self.writer.flush();
    }

    /// Log final statistics
    pub(crate) fn log_summary(&mut self, summary: &RunSummary, duration: Duration) {
        let _ = writeln!(self.writer, "[{}] SUMMARY", Self::timestamp());
        let _ = writeln!(self.writer, "  Success: {}", summary.success);
        let _ = writeln!(self.writer, "  Skipped: {}", summary.skipped);
        let _ = writeln!(self.writer, "  Errors:  {}", summary.errors);
        let _ = writeln!(
            self.writer,
            "  Total time: {}",
            map_rename::format_duration(duration)
        );
        let _ = writeln!(self.writer, "[{}] END", Self::timestamp());
        let _ = self.writer.flush();
    }
}
