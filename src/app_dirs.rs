use directories::ProjectDirs;
use std::path::PathBuf;

const APP: &str = "symtype";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/symtype`, or the platform data-local dir without `HOME`
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join(APP))
        } else {
            ProjectDirs::from("", "", APP).map(|dirs| dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP).map(|dirs| dirs.config_dir().join("config.json"))
    }

    pub fn stats_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("typing_stats.json"))
    }

    pub fn session_log_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("sessions.csv"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("symtype.log"))
    }
}
