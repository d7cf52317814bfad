//! Runtime configuration, read from a JSON file.

use crate::error::{BoardError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "wardboard.json";

/// Longest accepted settings TTL: one year.
pub const MAX_SETTINGS_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Paths inside the config are relative to the config file's directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Flat task list.
    pub data_file: PathBuf,
    /// Organization settings map.
    pub settings_file: PathBuf,
    /// Which organization's settings drive the board.
    pub organization: String,
    /// How long organization settings stay cached.
    pub settings_ttl_secs: u64,
    /// Log destination while the TUI owns the terminal.
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("tasks.json"),
            settings_file: PathBuf::from("settings.json"),
            organization: "default".to_string(),
            settings_ttl_secs: 300,
            log_file: PathBuf::from("wardboard.log"),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `path`; a missing file yields the defaults. Relative paths are
    /// resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let data = fs::read_to_string(path)?;
            serde_json::from_str::<Config>(&data).map_err(|err| BoardError::Config {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?
        } else {
            Config::default()
        };
        config.validate(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.resolved(base))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.organization.trim().is_empty() {
            return Err(BoardError::Config {
                path: path.to_path_buf(),
                message: "organization must not be empty".to_string(),
            });
        }
        if self.settings_ttl_secs > MAX_SETTINGS_TTL_SECS {
            return Err(BoardError::Config {
                path: path.to_path_buf(),
                message: format!(
                    "settings_ttl_secs must be at most {MAX_SETTINGS_TTL_SECS}, got {}",
                    self.settings_ttl_secs
                ),
            });
        }
        Ok(())
    }

    fn resolved(mut self, base: &Path) -> Self {
        for p in [&mut self.data_file, &mut self.settings_file, &mut self.log_file] {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        }
        self
    }

    pub fn settings_ttl(&self) -> Duration {
        Duration::from_secs(self.settings_ttl_secs)
    }

    pub fn with_data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = path.into();
        self
    }

    pub fn with_settings_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_file = path.into();
        self
    }

    pub fn with_organization(mut self, org: impl Into<String>) -> Self {
        self.organization = org.into();
        self
    }

    pub fn with_settings_ttl(mut self, ttl: Duration) -> Self {
        self.settings_ttl_secs = ttl.as_secs();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data_file, PathBuf::from("tasks.json"));
        assert_eq!(config.settings_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_config_builder() {
        let config = Config::new()
            .with_organization("st-anne")
            .with_settings_ttl(Duration::from_secs(30))
            .with_data_file("board.json");
        assert_eq!(config.organization, "st-anne");
        assert_eq!(config.settings_ttl_secs, 30);
        assert_eq!(config.data_file, PathBuf::from("board.json"));
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, r#"{"organization": "st-anne", "data_file": "data/tasks.json"}"#).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.organization, "st-anne");
        assert_eq!(config.data_file, dir.path().join("data/tasks.json"));
        assert_eq!(config.settings_file, dir.path().join("settings.json"));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.organization, "default");
    }

    #[test]
    fn test_bad_config_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, r#"{"organization": "  "}"#).unwrap();
        assert!(matches!(Config::load(&path), Err(BoardError::Config { .. })));
        fs::write(&path, "not json").unwrap();
        assert!(matches!(Config::load(&path), Err(BoardError::Config { .. })));
    }

    #[test]
    fn test_oversized_settings_ttl_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, r#"{"settings_ttl_secs": 18446744073709551615}"#).unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("settings_ttl_secs"));

        fs::write(&path, format!(r#"{{"settings_ttl_secs": {MAX_SETTINGS_TTL_SECS}}}"#)).unwrap();
        assert_eq!(Config::load(&path).unwrap().settings_ttl_secs, MAX_SETTINGS_TTL_SECS);
    }
}
