mod config;
mod logger;
mod rename;

use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use map_rename::batch_rename::{ArchiveFormat, DuplicateHandling, MatchType, RenameMode};

use crate::rename::MapRename;

#[derive(Parser)]
#[command(
    author,
    version,
    name = env!("CARGO_BIN_NAME"),
    about = "Copy files or folders under new names taken from a key to name mapping table"
)]
pub struct MapRenameArgs {
    /// Mapping table file: CSV, XLSX, XLSM, XLS, XLSB or ODS
    #[arg(value_hint = clap::ValueHint::FilePath, required_unless_present = "SHELL")]
    mapping: Option<PathBuf>,

    /// Source directory, defaults to the current directory
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    source: Option<PathBuf>,

    /// Target directory for the renamed copies
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    target: Option<PathBuf>,

    /// Key column name, defaults to the first column
    #[arg(short, long, name = "KEY_COL")]
    key_column: Option<String>,

    /// Target name column name, defaults to the second column
    #[arg(short = 'c', long, name = "TARGET_COL")]
    target_column: Option<String>,

    /// Process files or folders
    #[arg(short, long, value_enum)]
    mode: Option<RenameMode>,

    /// How keys are matched against entry names
    #[arg(short = 'x', long = "match", value_enum, name = "MATCH")]
    match_type: Option<MatchType>,

    /// What to do when a key matches several entries
    #[arg(short, long, value_enum)]
    duplicates: Option<DuplicateHandling>,

    /// Compress folders into archives instead of copying them
    #[arg(short = 'z', long)]
    compress: bool,

    /// Archive format, implies compression
    #[arg(short, long, value_enum)]
    format: Option<ArchiveFormat>,

    /// List the column names of the mapping table and exit
    #[arg(long)]
    columns: bool,

    /// Only print the preview without copying anything
    #[arg(short, long)]
    print: bool,

    /// Auto-confirm execution without asking
    #[arg(short = 'y', long)]
    auto: bool,

    /// Write the final records to a CSV or XLSX report
    #[arg(short = 'o', long, name = "REPORT", value_hint = clap::ValueHint::FilePath)]
    report: Option<PathBuf>,

    /// Do not write a log file
    #[arg(short = 'n', long)]
    no_log: bool,

    /// Print debug information
    #[arg(short = 'D', long)]
    debug: bool,

    /// Generate shell completion
    #[arg(short = 'l', long, name = "SHELL")]
    completion: Option<Shell>,

    /// Print verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = MapRenameArgs::parse();
    if let Some(ref shell) = args.completion {
        map_rename::generate_shell_completion(*shell, MapRenameArgs::command(), true, env!("CARGO_BIN_NAME"))
    } else {
        MapRename::new(args)?.run()
    }
}
