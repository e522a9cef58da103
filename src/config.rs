use std::path::PathBuf;
use std::sync::LazyLock;

const PROJECT_NAME: &str = env!("CARGO_PKG_NAME");

/// Path to the user config file: `$HOME/.config/map-rename.toml`
///
/// Returns `None` if the home directory cannot be determined.
pub static CONFIG_PATH: LazyLock<Option<PathBuf>> = LazyLock::new(|| {
    let home_dir = dirs::home_dir()?;
    Some(home_dir.join(".config").join(format!("{PROJECT_NAME}.toml")))
});

/// Directory for per-run log files: `$HOME/logs/map-rename`
///
/// Returns `None` if the home directory cannot be determined.
pub static LOG_DIR: LazyLock<Option<PathBuf>> = LazyLock::new(|| {
    let home_dir = dirs::home_dir()?;
    Some(home_dir.join("logs").join(PROJECT_NAME))
});

#[cfg(test)]
mod config_path_tests {
    use super::*;

    #[test]
    fn config_path_uses_package_name() {
        if let Some(path) = CONFIG_PATH.as_deref() {
            assert!(path.ends_with(".config/map-rename.toml"));
        }
    }

    #[test]
    fn log_dir_uses_package_name() {
        if let Some(path) = LOG_DIR.as_deref() {
            assert!(path.ends_with("logs/map-rename"));
        }
    }
}
