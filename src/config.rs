use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::app_dirs::AppDirs;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Overrides the default statistics location
    pub stats_file: Option<PathBuf>,
    /// Append a CSV row per completed session
    pub session_log: bool,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stats_file: None,
            session_log: true,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Statistics path to use: the configured one, else the app default,
    /// else `typing_stats.json` in the working directory.
    pub fn resolved_stats_path(&self) -> PathBuf {
        self.stats_file
            .clone()
            .or_else(AppDirs::stats_path)
            .unwrap_or_else(|| PathBuf::from("typing_stats.json"))
    }

    pub fn level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("symtype_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable config");
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reads_full_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let cfg = Config {
            stats_file: Some(PathBuf::from("/tmp/mine.json")),
            session_log: false,
            log_level: "debug".into(),
        };
        fs::write(&path, serde_json::to_vec_pretty(&cfg).unwrap()).unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), cfg);
    }

    #[test]
    fn garbage_config_is_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "log_level = debug").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn missing_config_is_default() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("nope.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"session_log": false}"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert!(!cfg.session_log);
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.stats_file, None);
    }

    #[test]
    fn configured_stats_file_wins() {
        let cfg = Config {
            stats_file: Some(PathBuf::from("/tmp/mine.json")),
            ..Config::default()
        };
        assert_eq!(cfg.resolved_stats_path(), PathBuf::from("/tmp/mine.json"));
    }

    #[test]
    fn log_level_parsing() {
        let mut cfg = Config::default();
        assert_eq!(cfg.level(), tracing::Level::INFO);
        cfg.log_level = "debug".into();
        assert_eq!(cfg.level(), tracing::Level::DEBUG);
        cfg.log_level = "loud".into();
        assert_eq!(cfg.level(), tracing::Level::INFO);
    }
}
