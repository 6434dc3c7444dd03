use std::cmp::Ordering;
use std::io::Write;

use itertools::Itertools;
use serde::Serialize;

use crate::stats::{Mode, StatisticsStore};

pub const DEFAULT_TOP_N: usize = 10;
/// Slowest/error-rate rankings ignore characters with fewer attempts
pub const MIN_RANKED_ATTEMPTS: u64 = 2;

/// Aggregate view of one character's history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharSummary {
    pub character: char,
    pub attempts: u64,
    pub mean_latency_secs: f64,
    pub error_rate_percent: f64,
}

/// Per-character rows for every practiced character in `mode`
pub fn summarize(store: &StatisticsStore, mode: Mode) -> Vec<CharSummary> {
    store
        .records(mode)
        .filter(|(_, r)| !r.is_untested())
        .map(|(character, r)| CharSummary {
            character,
            attempts: r.attempts,
            mean_latency_secs: r.mean_latency().unwrap_or(0.0),
            error_rate_percent: r.error_rate().unwrap_or(0.0) * 100.0,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub mode: Mode,
    pub most_practiced: Vec<CharSummary>,
    pub slowest: Vec<CharSummary>,
    pub highest_error_rate: Vec<CharSummary>,
}

fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

impl Report {
    pub fn build(mode: Mode, rows: &[CharSummary], top_n: usize) -> Self {
        let most_practiced = rows
            .iter()
            .sorted_by(|a, b| b.attempts.cmp(&a.attempts))
            .take(top_n)
            .cloned()
            .collect();

        let ranked = || rows.iter().filter(|r| r.attempts >= MIN_RANKED_ATTEMPTS);
        let slowest = ranked()
            .sorted_by(|a, b| desc(a.mean_latency_secs, b.mean_latency_secs))
            .take(top_n)
            .cloned()
            .collect();
        let highest_error_rate = ranked()
            .sorted_by(|a, b| desc(a.error_rate_percent, b.error_rate_percent))
            .take(top_n)
            .cloned()
            .collect();

        Self {
            mode,
            most_practiced,
            slowest,
            highest_error_rate,
        }
    }

    pub fn from_store(store: &StatisticsStore, mode: Mode, top_n: usize) -> Self {
        Self::build(mode, &summarize(store, mode), top_n)
    }

    pub fn is_empty(&self) -> bool {
        self.most_practiced.is_empty()
    }

    pub fn write_text<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "Typing statistics ({})", self.mode)?;
        if self.is_empty() {
            writeln!(out, "\nNo practice recorded yet.")?;
            return Ok(());
        }

        writeln!(out, "\nMost practiced characters:")?;
        for s in &self.most_practiced {
            writeln!(
                out,
                "  '{}'  {:>5} attempts  {:>5.1}% error rate",
                s.character, s.attempts, s.error_rate_percent
            )?;
        }

        writeln!(out, "\nSlowest characters (≥{MIN_RANKED_ATTEMPTS} attempts):")?;
        for s in &self.slowest {
            writeln!(out, "  '{}'  {:.2}s average", s.character, s.mean_latency_secs)?;
        }

        writeln!(
            out,
            "\nHighest error rates (≥{MIN_RANKED_ATTEMPTS} attempts):"
        )?;
        for s in &self.highest_error_rate {
            writeln!(out, "  '{}'  {:.1}% error rate", s.character, s.error_rate_percent)?;
        }
        Ok(())
    }

    /// One CSV row per character and ranking
    pub fn write_csv<W: Write>(&self, out: W) -> csv::Result<()> {
        #[derive(Serialize)]
        struct Row<'a> {
            ranking: &'a str,
            rank: usize,
            character: char,
            attempts: u64,
            mean_latency_secs: f64,
            error_rate_percent: f64,
        }

        let mut writer = csv::Writer::from_writer(out);
        for (ranking, rows) in [
            ("most_practiced", &self.most_practiced),
            ("slowest", &self.slowest),
            ("highest_error_rate", &self.highest_error_rate),
        ] {
            for (i, s) in rows.iter().enumerate() {
                writer.serialize(Row {
                    ranking,
                    rank: i + 1,
                    character: s.character,
                    attempts: s.attempts,
                    mean_latency_secs: s.mean_latency_secs,
                    error_rate_percent: s.error_rate_percent,
                })?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}
