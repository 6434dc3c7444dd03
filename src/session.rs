use std::num::IntErrorKind;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{Result, TrainerError};
use crate::stats::{Mode, StatisticsStore};

/// Wrong keystrokes tolerated before a session ends early
pub const MAX_ERRORS: usize = 3;
pub const MIN_LENGTH: usize = 5;
pub const MAX_LENGTH: usize = 100;
pub const DEFAULT_LENGTH: usize = 10;

/// Parse the digits typed at the length prompt.
///
/// Empty or non-numeric input is an `InvalidLength`; a digit string too large
/// for `usize` saturates instead of failing.
pub fn parse_length(input: &str) -> Result<usize> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TrainerError::InvalidLength("no length entered".into()));
    }
    match trimmed.parse::<usize>() {
        Ok(n) => Ok(n),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Ok(usize::MAX),
        Err(_) => Err(TrainerError::InvalidLength(format!("{trimmed:?} is not a number"))),
    }
}

/// Length actually used for a session: parsed and clamped to
/// `[MIN_LENGTH, MAX_LENGTH]`, or `DEFAULT_LENGTH` when parsing fails.
pub fn resolve_length(input: &str) -> usize {
    match parse_length(input) {
        Ok(n) => n.clamp(MIN_LENGTH, MAX_LENGTH),
        Err(e) => {
            debug!(error = %e, "falling back to default length");
            DEFAULT_LENGTH
        }
    }
}

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

/// One accepted keystroke
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Input {
    pub char: char,
    pub outcome: Outcome,
    /// Wait since the previous keystroke, or since the session started
    pub latency: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndReason {
    /// Every target character was typed
    Finished,
    /// The error budget ran out first
    TooManyErrors,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    Continue,
    Ended(EndReason),
}

/// State of one typing run; owned by the engine for its duration
#[derive(Debug, Clone)]
pub struct PracticeSession {
    mode: Mode,
    target: Vec<char>,
    input: Vec<Input>,
    error_count: usize,
    max_errors: usize,
    started_at: Instant,
    last_key_at: Instant,
    ended: Option<EndReason>,
}

impl PracticeSession {
    pub fn new(target: Vec<char>, mode: Mode, started_at: Instant) -> Self {
        Self {
            mode,
            target,
            input: Vec::new(),
            error_count: 0,
            max_errors: MAX_ERRORS,
            started_at,
            last_key_at: started_at,
            ended: None,
        }
    }

    pub fn target(&self) -> &[char] {
        &self.target
    }

    pub fn input(&self) -> &[Input] {
        &self.input
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn max_errors(&self) -> usize {
        self.max_errors
    }

    fn expected_char(&self) -> Option<char> {
        self.target.get(self.input.len()).copied()
    }

    /// Accept one typed character observed at `at`.
    ///
    /// A wrong character still occupies its position. Keystrokes after the
    /// session ended are ignored.
    pub fn type_char(&mut self, c: char, at: Instant) -> Progress {
        if let Some(reason) = self.ended {
            return Progress::Ended(reason);
        }
        let Some(expected) = self.expected_char() else {
            self.ended = Some(EndReason::Finished);
            return Progress::Ended(EndReason::Finished);
        };

        let latency = at.saturating_duration_since(self.last_key_at);
        self.last_key_at = at;

        let outcome = if c == expected {
            Outcome::Correct
        } else {
            self.error_count += 1;
            Outcome::Incorrect
        };
        self.input.push(Input {
            char: c,
            outcome,
            latency,
        });

        if self.error_count >= self.max_errors {
            self.ended = Some(EndReason::TooManyErrors);
        } else if self.input.len() == self.target.len() {
            self.ended = Some(EndReason::Finished);
        }

        match self.ended {
            Some(reason) => Progress::Ended(reason),
            None => Progress::Continue,
        }
    }

    /// `(target character, latency, was_error)` for every typed position
    pub fn outcomes(&self) -> impl Iterator<Item = (char, Duration, bool)> + '_ {
        self.target
            .iter()
            .zip(&self.input)
            .map(|(expected, input)| (*expected, input.latency, input.outcome == Outcome::Incorrect))
    }

    /// Post every typed position into `store`, persisting after each one.
    ///
    /// Returns the first persistence failure; the in-memory records are
    /// updated regardless.
    pub fn write_back(&self, store: &mut StatisticsStore) -> Option<TrainerError> {
        let mut first_failure = None;
        for (character, latency, was_error) in self.outcomes() {
            store.record_outcome(character, self.mode, latency, was_error);
            if let Err(e) = store.persist() {
                if first_failure.is_none() {
                    warn!(error = %e, "could not persist statistics");
                    first_failure = Some(e);
                }
            }
        }
        first_failure
    }

    pub fn results(&self, ended_at: Instant) -> SessionResults {
        let elapsed = ended_at.saturating_duration_since(self.started_at);
        SessionResults {
            mode: self.mode,
            target_len: self.target.len(),
            typed_len: self.input.len(),
            error_count: self.error_count,
            elapsed,
            wpm: words_per_minute(self.target.len(), elapsed),
            accuracy: accuracy_percent(self.target.len(), self.error_count),
            ended: self.ended.unwrap_or(EndReason::Finished),
        }
    }
}

/// `(len / 5) / minutes`, zero when no time has elapsed
pub fn words_per_minute(target_len: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    (target_len as f64 / 5.0) / (secs / 60.0)
}

/// Share of the target not spent on errors, in percent
pub fn accuracy_percent(target_len: usize, error_count: usize) -> f64 {
    if target_len == 0 {
        return 0.0;
    }
    (target_len as f64 - error_count as f64) / target_len as f64 * 100.0
}

/// Informational summary shown on the results screen
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResults {
    pub mode: Mode,
    pub target_len: usize,
    pub typed_len: usize,
    pub error_count: usize,
    pub elapsed: Duration,
    pub wpm: f64,
    pub accuracy: f64,
    pub ended: EndReason,
}
