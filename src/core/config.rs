//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::filter::DEFAULT_LIMIT;

/// Name of the per-directory config file
pub const LOCAL_CONFIG_FILE: &str = ".stockwise.yaml";

/// Default database file name, placed in the platform data directory
const DEFAULT_DATABASE_FILE: &str = "stockwise.db";

/// stockwise configuration with layered hierarchy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path of the SQLite database
    pub database: Option<PathBuf>,

    /// Default page size for `list`
    pub page_size: Option<u64>,

    /// Reject unresolvable sort keys instead of ignoring them
    pub strict_sort_keys: Option<bool>,

    /// tracing filter directive, e.g. "stockwise=debug"
    pub log: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl and accessors)

        // 2. Global user config (~/.config/stockwise/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read(&global_path) {
                config.merge(global);
            }
        }

        // 3. Local config (./.stockwise.yaml)
        if let Some(local) = Self::read(Path::new(LOCAL_CONFIG_FILE)) {
            config.merge(local);
        }

        // 4. Environment variables
        config.merge(Self::from_env());

        config
    }

    /// Read one config file; missing or unparsable files are skipped
    fn read(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config file");
                None
            }
        }
    }

    fn from_env() -> Config {
        Config {
            database: std::env::var_os("STOCKWISE_DATABASE").map(PathBuf::from),
            log: std::env::var("STOCKWISE_LOG").ok(),
            ..Config::default()
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "stockwise")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.page_size.is_some() {
            self.page_size = other.page_size;
        }
        if other.strict_sort_keys.is_some() {
            self.strict_sort_keys = other.strict_sort_keys;
        }
        if other.log.is_some() {
            self.log = other.log;
        }
    }

    /// Database path, falling back to the platform data directory
    pub fn database_path(&self) -> PathBuf {
        if let Some(ref path) = self.database {
            return path.clone();
        }
        directories::ProjectDirs::from("", "", "stockwise")
            .map(|dirs| dirs.data_dir().join(DEFAULT_DATABASE_FILE))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_FILE))
    }

    pub fn page_size(&self) -> u64 {
        self.page_size.filter(|n| *n > 0).unwrap_or(DEFAULT_LIMIT)
    }

    pub fn strict_sort_keys(&self) -> bool {
        self.strict_sort_keys.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_other() {
        let mut base = Config {
            database: Some("a.db".into()),
            page_size: Some(10),
            ..Config::default()
        };
        base.merge(Config {
            database: Some("b.db".into()),
            log: Some("debug".into()),
            ..Config::default()
        });
        assert_eq!(base.database, Some(PathBuf::from("b.db")));
        assert_eq!(base.page_size, Some(10));
        assert_eq!(base.log.as_deref(), Some("debug"));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.page_size(), DEFAULT_LIMIT);
        assert!(!config.strict_sort_keys());
        assert!(config.database_path().ends_with(DEFAULT_DATABASE_FILE));
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = "database: /tmp/x.db\npage_size: 25\nstrict_sort_keys: true\n";
        let config: Config = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.database_path(), PathBuf::from("/tmp/x.db"));
        assert_eq!(config.page_size(), 25);
        assert!(config.strict_sort_keys());
    }

    #[test]
    fn test_read_skips_invalid_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "page_size: [not a number").unwrap();
        assert!(Config::read(&path).is_none());
        assert!(Config::read(&tmp.path().join("missing.yaml")).is_none());
    }
}
