pub mod schema;
pub mod watcher;

pub use schema::{DisplayConfig, FeedConfig, OutputFormat, SimulationConfig, WindowConfig};
pub use watcher::ConfigWatcher;

use feed_core::{FeedError, Result};
use std::path::{Path, PathBuf};

/// Load and validate configuration from a TOML file.  Returns
/// `FeedConfig::default()` if the file doesn't exist so the feed always has
/// sensible defaults.
pub fn load(path: impl AsRef<Path>) -> Result<FeedConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(
            "Config file not found at '{}'; using defaults.",
            path.display()
        );
        return Ok(FeedConfig::default());
    }

    let raw = std::fs::read_to_string(path)?;

    let config: FeedConfig =
        toml::from_str(&raw).map_err(|e| FeedError::Config(format!("TOML parse error: {e}")))?;
    config.validate()?;
    Ok(config)
}

/// `$XDG_CONFIG_HOME/sensorfeed/sensorfeed.toml`, falling back to
/// `$HOME/.config` and finally the working directory.
pub fn default_path() -> PathBuf {
    let config_home = match std::env::var_os("XDG_CONFIG_HOME") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => std::env::var_os("HOME")
            .map_or_else(|| PathBuf::from("."), PathBuf::from)
            .join(".config"),
    };
    config_home.join("sensorfeed").join("sensorfeed.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, FeedConfig::default());
    }

    #[test]
    fn loads_values_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[window]\ncapacity = 5\n[simulation]\nmin_value = 10.0\nmax_value = 20.0").unwrap();

        let cfg = load(file.path()).unwrap();
        assert_eq!(cfg.window.capacity, 5);
        assert_eq!(cfg.simulation.min_value, 10.0);
        assert_eq!(cfg.simulation.max_value, 20.0);
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[window\ncapacity = ").unwrap();
        assert!(matches!(load(file.path()), Err(FeedError::Config(_))));
    }

    #[test]
    fn unreadable_path_is_an_io_error() {
        // A directory exists but cannot be read as a file.
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load(dir.path()), Err(FeedError::Io { .. })));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[window]\ncapacity = 0").unwrap();
        assert!(matches!(load(file.path()), Err(FeedError::Config(_))));
    }

    #[test]
    fn default_path_ends_with_app_file() {
        let path = default_path();
        assert!(path.ends_with("sensorfeed/sensorfeed.toml"));
    }
}
