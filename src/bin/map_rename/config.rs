use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::Deserialize;

use map_rename::batch_rename::{ArchiveFormat, DuplicateHandling, MatchType, RenameMode};
use map_rename::print_error;

use crate::MapRenameArgs;

/// Final config combined from CLI arguments and user config file.
#[derive(Debug)]
pub struct Config {
    pub(crate) mapping: Option<PathBuf>,
    pub(crate) source: Option<PathBuf>,
    pub(crate) target: Option<PathBuf>,
    pub(crate) key_column: Option<String>,
    pub(crate) target_column: Option<String>,
    pub(crate) mode: RenameMode,
    pub(crate) match_type: MatchType,
    pub(crate) duplicates: DuplicateHandling,
    /// Archive format when folders should be compressed.
    pub(crate) compress: Option<ArchiveFormat>,
    pub(crate) list_columns: bool,
    pub(crate) report: Option<PathBuf>,
    pub(crate) auto: bool,
    pub(crate) debug: bool,
    pub(crate) dryrun: bool,
    pub(crate) log: bool,
    pub(crate) verbose: bool,
}

/// Config from the user config file
#[derive(Debug, Default, Deserialize)]
struct MapRenameConfig {
    #[serde(default)]
    key_column: Option<String>,
    #[serde(default)]
    target_column: Option<String>,
    #[serde(default)]
    mode: Option<RenameMode>,
    #[serde(default)]
    match_type: Option<MatchType>,
    #[serde(default)]
    duplicates: Option<DuplicateHandling>,
    #[serde(default)]
    compress: bool,
    #[serde(default)]
    compress_format: Option<ArchiveFormat>,
    #[serde(default)]
    auto: bool,
    #[serde(default)]
    debug: bool,
    #[serde(default)]
    dryrun: bool,
    #[serde(default)]
    log: Option<bool>,
    #[serde(default)]
    verbose: bool,
}

/// Wrapper needed for parsing the user config file section.
#[derive(Debug, Default, Deserialize)]
struct UserConfig {
    #[serde(default)]
    maprename: MapRenameConfig,
}

impl MapRenameConfig {
    /// Try to read user config from the file if it exists.
    /// Otherwise, fall back to default config.
    fn get_user_config() -> Self {
        map_rename::config::CONFIG_PATH
            .as_deref()
            .filter(|path| path.exists())
            .and_then(|path| {
                fs::read_to_string(path)
                    .map_err(|e| {
                        print_error!("Error reading config file {}: {e}", path.display());
                    })
                    .ok()
            })
            .and_then(|config_string| {
                Self::from_toml_str(&config_string)
                    .map_err(|e| print_error!("{e}"))
                    .ok()
            })
            .unwrap_or_default()
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML string is invalid.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str::<UserConfig>(toml_str)
            .map(|config| config.maprename)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {e}"))
    }
}

impl Config {
    /// Create config from given command line args and user config file.
    pub fn from_args(args: MapRenameArgs) -> Self {
        Self::merge(args, MapRenameConfig::get_user_config())
    }

    /// Command line values take precedence, boolean flags are combined.
    fn merge(args: MapRenameArgs, user_config: MapRenameConfig) -> Self {
        let compress = (args.compress || args.format.is_some() || user_config.compress)
            .then(|| args.format.or(user_config.compress_format).unwrap_or_default());

        Self {
            mapping: args.mapping,
            source: args.source,
            target: args.target,
            key_column: args.key_column.or(user_config.key_column),
            target_column: args.target_column.or(user_config.target_column),
            mode: args.mode.or(user_config.mode).unwrap_or_default(),
            match_type: args.match_type.or(user_config.match_type).unwrap_or_default(),
            duplicates: args.duplicates.or(user_config.duplicates).unwrap_or_default(),
            compress,
            list_columns: args.columns,
            report: args.report,
            auto: args.auto || user_config.auto,
            debug: args.debug || user_config.debug,
            dryrun: args.print || user_config.dryrun,
            log: !args.no_log && user_config.log.unwrap_or(true),
            verbose: args.verbose || user_config.verbose,
        }
    }
}

#[cfg(test)]
mod maprename_config_tests {
    use super::*;

    use clap::Parser;

    fn parse_args(args: &[&str]) -> MapRenameArgs {
        MapRenameArgs::try_parse_from(std::iter::once("maprename").chain(args.iter().copied()))
            .expect("should parse args")
    }

    #[test]
    fn from_toml_str_parses_empty_config() {
        let config = MapRenameConfig::from_toml_str("").expect("should parse empty config");
        assert!(!config.auto);
        assert!(!config.compress);
        assert!(config.mode.is_none());
        assert!(config.log.is_none());
    }

    #[test]
    fn from_toml_str_parses_all_fields() {
        let toml = r#"
            [maprename]
            key_column = "Name"
            target_column = "File name"
            mode = "folder"
            match_type = "exact"
            duplicates = "skip"
            compress = true
            compress_format = "7z"
            auto = true
            debug = true
            dryrun = true
            log = false
            verbose = true
        "#;
        let config = MapRenameConfig::from_toml_str(toml).expect("should parse config");
        assert_eq!(config.key_column.as_deref(), Some("Name"));
        assert_eq!(config.target_column.as_deref(), Some("File name"));
        assert_eq!(config.mode, Some(RenameMode::Folder));
        assert_eq!(config.match_type, Some(MatchType::Exact));
        assert_eq!(config.duplicates, Some(DuplicateHandling::Skip));
        assert!(config.compress);
        assert_eq!(config.compress_format, Some(ArchiveFormat::SevenZ));
        assert!(config.auto);
        assert!(config.debug);
        assert!(config.dryrun);
        assert_eq!(config.log, Some(false));
        assert!(config.verbose);
    }

    #[test]
    fn from_toml_str_ignores_other_sections() {
        let toml = r#"
            [other_tool]
            verbose = true
        "#;
        let config = MapRenameConfig::from_toml_str(toml).expect("should parse config");
        assert!(!config.verbose);
    }

    #[test]
    fn from_toml_str_rejects_unknown_enum_value() {
        let toml = r#"
            [maprename]
            mode = "symlink"
        "#;
        assert!(MapRenameConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn merge_uses_defaults() {
        let config = Config::merge(parse_args(&["map.csv", "-t", "out"]), MapRenameConfig::default());
        assert_eq!(config.mode, RenameMode::File);
        assert_eq!(config.match_type, MatchType::Contains);
        assert_eq!(config.duplicates, DuplicateHandling::Suffix);
        assert!(config.compress.is_none());
        assert!(config.log);
        assert!(!config.dryrun);
        assert_eq!(config.target, Some(PathBuf::from("out")));
    }

    #[test]
    fn merge_args_override_user_config() {
        let user_config = MapRenameConfig {
            key_column: Some("Name".to_string()),
            mode: Some(RenameMode::Folder),
            match_type: Some(MatchType::Exact),
            ..Default::default()
        };
        let config = Config::merge(
            parse_args(&["map.csv", "-t", "out", "-k", "Id", "-m", "file"]),
            user_config,
        );
        assert_eq!(config.key_column.as_deref(), Some("Id"));
        assert_eq!(config.mode, RenameMode::File);
        assert_eq!(config.match_type, MatchType::Exact);
    }

    #[test]
    fn merge_compression() {
        let config = Config::merge(parse_args(&["map.csv", "-z"]), MapRenameConfig::default());
        assert_eq!(config.compress, Some(ArchiveFormat::Zip));

        let config = Config::merge(parse_args(&["map.csv", "-f", "rar"]), MapRenameConfig::default());
        assert_eq!(config.compress, Some(ArchiveFormat::Rar));

        let user_config = MapRenameConfig {
            compress: true,
            compress_format: Some(ArchiveFormat::SevenZ),
            ..Default::default()
        };
        let config = Config::merge(parse_args(&["map.csv"]), user_config);
        assert_eq!(config.compress, Some(ArchiveFormat::SevenZ));
    }

    #[test]
    fn merge_log_can_be_disabled() {
        let config = Config::merge(parse_args(&["map.csv", "-n"]), MapRenameConfig::default());
        assert!(!config.log);

        let user_config = MapRenameConfig {
            log: Some(false),
            ..Default::default()
        };
        let config = Config::merge(parse_args(&["map.csv"]), user_config);
        assert!(!config.log);
    }

    #[test]
    fn mapping_is_required_without_completion() {
        assert!(MapRenameArgs::try_parse_from(["maprename", "-t", "out"]).is_err());
        assert!(MapRenameArgs::try_parse_from(["maprename", "-l", "bash"]).is_ok());
    }
}
