use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while drilling.
///
/// Only `TerminalIo` is meant to end the process; the rest are recovered
/// locally (defaults, empty state, back to the menu).
#[derive(Error, Debug)]
pub enum TrainerError {
    #[error("invalid practice length: {0}")]
    InvalidLength(String),

    #[error("statistics file {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: PersistenceSource,
    },

    #[error("cancelled")]
    Cancelled,

    #[error("terminal I/O failure: {0}")]
    TerminalIo(#[from] std::io::Error),
}

/// Underlying cause of a persistence failure
#[derive(Error, Debug)]
pub enum PersistenceSource {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed content: {0}")]
    Malformed(String),
}

impl TrainerError {
    pub fn persistence(path: impl Into<PathBuf>, source: impl Into<PersistenceSource>) -> Self {
        TrainerError::Persistence {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, what: impl Into<String>) -> Self {
        Self::persistence(path, PersistenceSource::Malformed(what.into()))
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, TrainerError::Persistence { .. })
    }
}

pub type Result<T> = std::result::Result<T, TrainerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_message_names_the_file() {
        let err = TrainerError::malformed("/tmp/stats.json", "key \"ab\" is not a single character");
        let msg = err.to_string();
        assert!(msg.contains("/tmp/stats.json"));
        assert!(err.is_persistence());
    }

    #[test]
    fn io_errors_become_terminal_failures() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err: TrainerError = io.into();
        assert!(matches!(err, TrainerError::TerminalIo(_)));
        assert!(!err.is_persistence());
    }
}
