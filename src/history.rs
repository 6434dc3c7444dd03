use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;

use crate::session::SessionResults;

#[derive(Debug, Serialize)]
struct SessionRow {
    date: String,
    mode: String,
    length: usize,
    typed: usize,
    errors: usize,
    elapsed_secs: String,
    wpm: String,
    accuracy: String,
}

/// Append-only CSV log with one row per completed session.
/// Independent of the statistics file.
#[derive(Debug, Clone)]
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, results: &SessionResults) -> csv::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // If the log doesn't exist yet we need to emit a header
        let needs_header = !self.path.exists();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(SessionRow {
            date: Local::now().to_rfc3339(),
            mode: results.mode.to_string(),
            length: results.target_len,
            typed: results.typed_len,
            errors: results.error_count,
            elapsed_secs: format!("{:.2}", results.elapsed.as_secs_f64()),
            wpm: format!("{:.1}", results.wpm),
            accuracy: format!("{:.1}", results.accuracy),
        })?;
        writer.flush()?;
        Ok(())
    }
}
