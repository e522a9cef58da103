use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressStyle};

use map_rename::batch_rename::{
    ExecutionEvent, Outcome, PreviewOptions, PreviewRecord, RenameError, RenameSession, RenameSettings, RunSummary,
    write_report,
};
use map_rename::{colorize_bool, print_error, print_warning};

use crate::MapRenameArgs;
use crate::config::Config;
use crate::logger::FileLogger;

const PROGRESS_BAR_CHARS: &str = "=>-";
const PROGRESS_BAR_TEMPLATE: &str = "[{elapsed_precise}] {bar:80.magenta/blue} {pos}/{len} {percent}%";

#[derive(Debug)]
pub struct MapRename {
    config: Config,
    session: RenameSession,
}

impl MapRename {
    pub fn new(args: MapRenameArgs) -> Result<Self> {
        let config = Config::from_args(args);
        let mapping_path = config
            .mapping
            .as_deref()
            .context("Mapping table file is required")
            .and_then(|path| map_rename::resolve_input_path(Some(path)))?;

        if mapping_path.is_dir() {
            anyhow::bail!("Mapping table must be a file: '{}'", mapping_path.display());
        }

        let source_dir = map_rename::resolve_input_path(config.source.as_deref())?;
        let target_dir = match config.target.as_deref() {
            Some(target) => map_rename::resolve_output_path(target)?,
            None if config.list_columns => PathBuf::new(),
            None => return Err(RenameError::Config("target directory (-t/--target)".to_string()).into()),
        };

        let settings = RenameSettings {
            mapping_path,
            source_dir,
            target_dir,
            key_column: config.key_column.clone(),
            target_column: config.target_column.clone(),
            match_type: config.match_type,
            options: PreviewOptions {
                mode: config.mode,
                duplicates: config.duplicates,
                compress: config.compress,
            },
        };

        if config.debug {
            eprintln!("Config: {config:#?}");
            eprintln!("Settings: {settings:#?}");
        }

        Ok(Self {
            config,
            session: RenameSession::new(settings),
        })
    }

    pub fn run(mut self) -> Result<()> {
        if self.config.list_columns {
            return self.print_columns();
        }

        let start = Instant::now();
        let mut logger = self.create_logger();
        if self.config.verbose {
            self.print_settings();
        }
        if let Some(logger) = logger.as_mut() {
            logger.log_init(self.session.settings());
        }

        let mapping = self.session.load_mapping()?;
        println!("Loaded {} mapping entries", mapping.len());
        if let Some(logger) = logger.as_mut() {
            logger.log_load(mapping);
        }

        let scan = self.session.scan()?;
        println!(
            "Found {} {}: {} matched, {} unmatched",
            scan.total,
            self.config.mode,
            scan.matched.to_string().green(),
            scan.unmatched.to_string().yellow()
        );
        if let Some(logger) = logger.as_mut() {
            logger.log_scan(&scan);
        }
        if scan.matched == 0 {
            print_warning!("No {} matched any mapping key", self.config.mode);
        }

        let records = self.session.preview()?;
        print_records(records);
        if let Some(logger) = logger.as_mut() {
            logger.log_preview(records);
        }

        let pending = self.session.pending_count();
        if pending == 0 {
            println!("\nNothing to do");
            return self.write_report();
        }
        if self.config.dryrun {
            println!("\n{pending} item(s) would be copied to {}", self.target_display());
            return self.write_report();
        }
        if !self.confirm(pending)? {
            println!("Cancelled");
            return Ok(());
        }

        let progress_bar = ProgressBar::new(pending as u64);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template(PROGRESS_BAR_TEMPLATE)?
                .progress_chars(PROGRESS_BAR_CHARS),
        );

        let summary = self.session.execute(|event: &ExecutionEvent<'_>| {
            progress_bar.inc(1);
            if let Some(error) = event.error {
                progress_bar.println(format!(
                    "{} {}: {error}",
                    "Failed:".red(),
                    event.record.source_name
                ));
            }
            if let Some(logger) = logger.as_mut() {
                logger.log_record(
                    &format!("[{}/{}]", event.position, event.total),
                    event.record,
                    event.error,
                );
            }
        })?;
        progress_bar.finish_and_clear();

        if self.config.verbose {
            print_records(self.session.records());
        }
        print_summary(&summary);
        if let Some(logger) = logger.as_mut() {
            logger.log_summary(&summary, start.elapsed());
        }

        self.write_report()
    }

    fn print_columns(&self) -> Result<()> {
        let columns = self.session.columns()?;
        if columns.is_empty() {
            print_warning!("No columns found");
        }
        for (index, column) in columns.iter().enumerate() {
            println!("{:>3}: {column}", index + 1);
        }
        Ok(())
    }

    fn print_settings(&self) {
        let settings = self.session.settings();
        println!("{}", "Map rename".bold());
        println!("  Mapping:  {}", settings.mapping_path.display());
        println!("  Source:   {}", settings.source_dir.display());
        println!("  Target:   {}", self.target_display());
        println!("  Mode:     {}", settings.options.mode);
        println!("  Match:    {:?}", settings.match_type);
        println!("  Compress: {}", colorize_bool(settings.options.archive_format().is_some()));
        println!("  Dryrun:   {}", colorize_bool(self.config.dryrun));
    }

    /// Logging failures only print a warning.
    fn create_logger(&self) -> Option<FileLogger> {
        if !self.config.log || self.config.dryrun {
            return None;
        }
        FileLogger::new()
            .map_err(|e| print_warning!("Log file disabled: {e}"))
            .ok()
    }

    fn confirm(&self, pending: usize) -> Result<bool> {
        if self.config.auto {
            return Ok(true);
        }
        print!(
            "{}",
            format!("\nCopy {pending} item(s) to {}? (y/n): ", self.target_display()).magenta()
        );
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        Ok(input.trim().eq_ignore_ascii_case("y"))
    }

    fn target_display(&self) -> String {
        self.session.settings().target_dir.display().to_string()
    }

    fn write_report(&self) -> Result<()> {
        if let Some(path) = &self.config.report {
            if let Err(e) = write_report(self.session.records(), path) {
                print_error!("{e:#}");
                return Err(e);
            }
            println!("Report written to {}", path.display());
        }
        Ok(())
    }
}

fn colorize_outcome(outcome: &Outcome) -> ColoredString {
    let text = outcome.to_string();
    match outcome {
        Outcome::Pending => text.cyan(),
        Outcome::Success => text.green(),
        Outcome::Skipped | Outcome::TargetExists => text.yellow(),
        Outcome::Unmatched => text.dimmed(),
        Outcome::PreviewConflict | Outcome::Error(_) => text.red(),
    }
}

/// Print records as an aligned table.
fn print_records(records: &[PreviewRecord]) {
    if records.is_empty() {
        return;
    }
    let index_width = records.len().to_string().len();
    let key_width = records
        .iter()
        .map(|r| r.key_label().chars().count())
        .max()
        .unwrap_or_default();
    let source_width = records
        .iter()
        .map(|r| r.source_name.chars().count())
        .max()
        .unwrap_or_default();
    let target_width = records
        .iter()
        .map(|r| r.target_name.chars().count())
        .max()
        .unwrap_or_default();

    println!();
    for record in records {
        println!(
            "{:>index_width$}  {}  {:<source_width$}  {}  {:<target_width$}  {}",
            record.index,
            format!("{:<key_width$}", record.key_label()).bold(),
            record.source_name,
            "→".green(),
            record.target_name,
            colorize_outcome(&record.outcome)
        );
    }
}

fn print_summary(summary: &RunSummary) {
    println!(
        "\n{} {} succeeded, {} skipped, {} failed",
        "Done:".bold(),
        summary.success.to_string().green(),
        summary.skipped.to_string().yellow(),
        if summary.errors > 0 {
            summary.errors.to_string().red()
        } else {
            summary.errors.to_string().normal()
        }
    );
}

#[cfg(test)]
mod maprename_tests {
    use super::*;

    #[test]
    fn colorize_outcome_keeps_text() {
        colored::control::set_override(false);
        assert_eq!(colorize_outcome(&Outcome::Pending).to_string(), "Pending");
        assert_eq!(
            colorize_outcome(&Outcome::Error("Source missing".to_string())).to_string(),
            "Error: Source missing"
        );
        assert_eq!(colorize_outcome(&Outcome::PreviewConflict).to_string(), "Preview conflict");
    }
}
