use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{PersistenceSource, Result, TrainerError};

/// Practice variant; each one keeps its own statistics namespace
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum_macros::Display,
)]
pub enum Mode {
    #[strum(to_string = "peek")]
    Peek,
    #[strum(to_string = "no_peek")]
    NoPeek,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Peek, Mode::NoPeek];

    /// Human readable name for menus and reports
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Peek => "Regular Mode (Peeking allowed)",
            Mode::NoPeek => "Pro Mode (No peeking!)",
        }
    }
}

/// Performance history of one character in one mode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CharacterRecord {
    pub attempts: u64,
    pub errors: u64,
    /// Seconds spent on each attempt, oldest first
    #[serde(rename = "times")]
    pub latencies: Vec<f64>,
}

impl CharacterRecord {
    pub fn is_untested(&self) -> bool {
        self.attempts == 0
    }

    /// Fraction of attempts that were wrong, `None` when untested
    pub fn error_rate(&self) -> Option<f64> {
        if self.attempts == 0 {
            None
        } else {
            Some(self.errors as f64 / self.attempts as f64)
        }
    }

    /// Mean seconds per attempt, `None` when no latency was recorded
    pub fn mean_latency(&self) -> Option<f64> {
        match self.latencies.len() {
            0 => None,
            n => Some(self.latencies.iter().sum::<f64>() / n as f64),
        }
    }

    fn push(&mut self, latency_secs: f64, was_error: bool) {
        self.attempts += 1;
        if was_error {
            self.errors += 1;
        }
        self.latencies.push(latency_secs);
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.errors > self.attempts {
            return Err(format!(
                "errors ({}) exceed attempts ({})",
                self.errors, self.attempts
            ));
        }
        if self.latencies.len() as u64 != self.attempts {
            return Err(format!(
                "{} times recorded for {} attempts",
                self.latencies.len(),
                self.attempts
            ));
        }
        if let Some(bad) = self
            .latencies
            .iter()
            .find(|t| !t.is_finite() || **t < 0.0)
        {
            return Err(format!("invalid time {bad}"));
        }
        Ok(())
    }
}

/// All records, keyed by mode and then by character
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    peek: BTreeMap<char, CharacterRecord>,
    no_peek: BTreeMap<char, CharacterRecord>,
}

impl RecordSet {
    fn namespace(&self, mode: Mode) -> &BTreeMap<char, CharacterRecord> {
        match mode {
            Mode::Peek => &self.peek,
            Mode::NoPeek => &self.no_peek,
        }
    }

    fn namespace_mut(&mut self, mode: Mode) -> &mut BTreeMap<char, CharacterRecord> {
        match mode {
            Mode::Peek => &mut self.peek,
            Mode::NoPeek => &mut self.no_peek,
        }
    }
}

/// On-disk shape: `{"peek": {"!": {...}}, "no_peek": {...}}`
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct StatsFile {
    #[serde(default)]
    peek: BTreeMap<String, CharacterRecord>,
    #[serde(default)]
    no_peek: BTreeMap<String, CharacterRecord>,
}

fn decode_namespace(
    path: &Path,
    mode: Mode,
    raw: BTreeMap<String, CharacterRecord>,
) -> Result<BTreeMap<char, CharacterRecord>> {
    raw.into_iter()
        .map(|(key, record)| {
            let mut chars = key.chars();
            let character = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => {
                    return Err(TrainerError::malformed(
                        path,
                        format!("{mode} key {key:?} is not a single character"),
                    ))
                }
            };
            record.validate().map_err(|why| {
                TrainerError::malformed(path, format!("{mode} record for {key:?}: {why}"))
            })?;
            Ok((character, record))
        })
        .collect()
}

fn encode_namespace(records: &BTreeMap<char, CharacterRecord>) -> BTreeMap<String, CharacterRecord> {
    records
        .iter()
        .map(|(c, r)| (c.to_string(), r.clone()))
        .collect()
}

/// Owner and single writer of every `CharacterRecord`.
///
/// A store created with [`StatisticsStore::in_memory`] has no backing file and
/// treats `persist` as a no-op.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsStore {
    path: Option<PathBuf>,
    records: RecordSet,
}

impl StatisticsStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            records: RecordSet::default(),
        }
    }

    /// An empty store that will persist to `path`
    pub fn empty_at<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            records: RecordSet::default(),
        }
    }

    /// Read persisted records for both modes. A missing file is an empty store.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "no statistics file yet, starting empty");
                return Ok(Self::empty_at(path));
            }
            Err(e) => return Err(TrainerError::persistence(path, e)),
        };

        let file: StatsFile =
            serde_json::from_slice(&bytes).map_err(|e| TrainerError::persistence(path, e))?;
        let records = RecordSet {
            peek: decode_namespace(path, Mode::Peek, file.peek)?,
            no_peek: decode_namespace(path, Mode::NoPeek, file.no_peek)?,
        };
        debug!(
            path = %path.display(),
            peek = records.peek.len(),
            no_peek = records.no_peek.len(),
            "loaded statistics"
        );

        Ok(Self {
            path: Some(path.to_path_buf()),
            records,
        })
    }

    /// Like [`load`](Self::load), but never blocks startup: an empty store is
    /// returned together with the error for the caller to report.
    ///
    /// Only a file with bad content is moved aside to `<name>.corrupt`; I/O
    /// failures leave the path alone.
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> (Self, Option<TrainerError>) {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(store) => (store, None),
            Err(err) => {
                warn!(error = %err, "statistics unusable, starting with an empty store");
                if let TrainerError::Persistence {
                    source: PersistenceSource::Json(_) | PersistenceSource::Malformed(_),
                    ..
                } = err
                {
                    let mut aside = path.as_os_str().to_owned();
                    aside.push(".corrupt");
                    if let Err(e) = fs::rename(path, &aside) {
                        warn!(error = %e, "could not move unusable statistics file aside");
                    }
                }
                (Self::empty_at(path), Some(err))
            }
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one attempt for `character` in `mode`. The only mutator.
    pub fn record_outcome(
        &mut self,
        character: char,
        mode: Mode,
        latency: Duration,
        was_error: bool,
    ) {
        self.records
            .namespace_mut(mode)
            .entry(character)
            .or_default()
            .push(latency.as_secs_f64(), was_error);
    }

    /// The record for `character`, zero-valued if it has never been seen
    pub fn get_record(&self, character: char, mode: Mode) -> CharacterRecord {
        self.record(character, mode).cloned().unwrap_or_default()
    }

    /// Borrowing lookup, `None` if the character has no record yet
    pub fn record(&self, character: char, mode: Mode) -> Option<&CharacterRecord> {
        self.records.namespace(mode).get(&character)
    }

    /// Every stored record of `mode`, in character order
    pub fn records(&self, mode: Mode) -> impl Iterator<Item = (char, &CharacterRecord)> {
        self.records.namespace(mode).iter().map(|(c, r)| (*c, r))
    }

    /// Durably write the full record set.
    ///
    /// The JSON is written to a sibling temp file and renamed into place so an
    /// interrupted write leaves the previous file intact.
    pub fn persist(&self) -> Result<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };

        let file = StatsFile {
            peek: encode_namespace(&self.records.peek),
            no_peek: encode_namespace(&self.records.no_peek),
        };
        let data = serde_json::to_vec_pretty(&file).map_err(|e| TrainerError::persistence(path, e))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| TrainerError::persistence(path, e))?;
        }
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, data).map_err(|e| TrainerError::persistence(path, e))?;
        fs::rename(&tmp, path).map_err(|e| TrainerError::persistence(path, e))?;
        Ok(())
    }
}
