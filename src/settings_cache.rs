//! Organization settings with an explicit time-to-live.
//!
//! The cache is an ordinary value owned by whoever runs the session (the TUI
//! `App`, or a single CLI command). Nothing here is global; dropping the cache
//! drops its entries, and [`SettingsCache::invalidate`] forces the next read
//! to go back to the source.

use crate::config::MAX_SETTINGS_TTL_SECS;
use crate::error::{BoardError, Result};
use crate::kanban_board::{default_columns, ColumnSpec};
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationSettings {
    /// Filled from the key the settings were looked up under.
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default = "default_board_title")]
    pub board_title: String,
    #[serde(default = "default_columns")]
    pub columns: Vec<ColumnSpec>,
}

fn default_board_title() -> String {
    "Tasks".to_string()
}

impl Default for OrganizationSettings {
    fn default() -> Self {
        Self {
            id: "default".to_string(),
            name: "Hospital".to_string(),
            board_title: default_board_title(),
            columns: default_columns(),
        }
    }
}

pub trait SettingsSource {
    fn fetch(&self, org: &str) -> Result<OrganizationSettings>;
}

/// JSON object mapping organization id to its settings.
#[derive(Debug, Clone)]
pub struct FileSettingsSource {
    path: PathBuf,
    fallback_to_default: bool,
}

impl FileSettingsSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fallback_to_default: false,
        }
    }

    /// Unknown organizations (or a missing file) get [`OrganizationSettings::default`].
    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback_to_default = fallback;
        self
    }

    fn read_all(&self) -> Result<HashMap<String, OrganizationSettings>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let data = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

impl SettingsSource for FileSettingsSource {
    fn fetch(&self, org: &str) -> Result<OrganizationSettings> {
        let mut settings = match self.read_all()?.remove(org) {
            Some(settings) => settings,
            None if self.fallback_to_default => OrganizationSettings::default(),
            None => {
                return Err(BoardError::SettingsNotFound {
                    org: org.to_string(),
                })
            }
        };
        settings.id = org.to_string();
        Ok(settings)
    }
}

pub struct SettingsCache<S> {
    source: S,
    entries: Cache<String, Arc<OrganizationSettings>>,
    ttl: Duration,
}

impl<S: SettingsSource> SettingsCache<S> {
    /// `ttl` is capped at [`MAX_SETTINGS_TTL_SECS`].
    pub fn new(source: S, ttl: Duration) -> Self {
        let ttl = ttl.min(Duration::from_secs(MAX_SETTINGS_TTL_SECS));
        let entries = Cache::builder()
            .max_capacity(64)
            .time_to_live(ttl)
            .build();
        Self {
            source,
            entries,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached settings, fetched from the source on a miss. Source errors are
    /// returned and nothing is cached for them.
    pub fn get(&self, org: &str) -> Result<Arc<OrganizationSettings>> {
        if let Some(hit) = self.entries.get(org) {
            return Ok(hit);
        }
        debug!(org, "settings cache miss");
        let settings = Arc::new(self.source.fetch(org)?);
        self.entries.insert(org.to_string(), Arc::clone(&settings));
        Ok(settings)
    }

    pub fn invalidate(&self, org: &str) {
        debug!(org, "settings invalidated");
        self.entries.invalidate(org);
    }

    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Default)]
    struct CountingSource {
        fetches: AtomicUsize,
    }

    impl SettingsSource for CountingSource {
        fn fetch(&self, org: &str) -> Result<OrganizationSettings> {
            if org == "missing" {
                return Err(BoardError::SettingsNotFound { org: org.into() });
            }
            let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(OrganizationSettings {
                name: format!("{org} #{n}"),
                ..Default::default()
            })
        }
    }

    #[test]
    fn test_hit_until_invalidated() {
        let cache = SettingsCache::new(CountingSource::default(), Duration::from_secs(60));
        assert_eq!(cache.get("north").unwrap().name, "north #1");
        assert_eq!(cache.get("north").unwrap().name, "north #1");
        cache.invalidate("north");
        assert_eq!(cache.get("north").unwrap().name, "north #2");
        assert_eq!(cache.get("south").unwrap().name, "south #3");
        cache.invalidate_all();
        assert_eq!(cache.get("south").unwrap().name, "south #4");
    }

    #[test]
    fn test_entries_expire() {
        let cache = SettingsCache::new(CountingSource::default(), Duration::from_millis(50));
        assert_eq!(cache.get("north").unwrap().name, "north #1");
        std::thread::sleep(Duration::from_millis(150));
        assert_eq!(cache.get("north").unwrap().name, "north #2");
    }

    #[test]
    fn test_ttl_is_capped() {
        let cache = SettingsCache::new(CountingSource::default(), Duration::MAX);
        assert_eq!(cache.ttl(), Duration::from_secs(MAX_SETTINGS_TTL_SECS));
        assert_eq!(cache.get("north").unwrap().name, "north #1");
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = SettingsCache::new(CountingSource::default(), Duration::from_secs(60));
        assert!(matches!(
            cache.get("missing"),
            Err(BoardError::SettingsNotFound { .. })
        ));
        assert_eq!(cache.source.fetches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_file_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"st-anne": {"name": "St. Anne", "columns": [{"id": "open", "title": "Open"}]}}"#,
        )
        .unwrap();

        let source = FileSettingsSource::new(&path);
        let settings = source.fetch("st-anne").unwrap();
        assert_eq!(settings.id, "st-anne");
        assert_eq!(settings.board_title, "Tasks");
        assert_eq!(settings.columns, vec![ColumnSpec::new("open", "Open")]);
        assert!(source.fetch("other").is_err());

        let fallback = FileSettingsSource::new(&path).with_fallback(true);
        let other = fallback.fetch("other").unwrap();
        assert_eq!(other.id, "other");
        assert_eq!(other.columns, OrganizationSettings::default().columns);
    }
}
