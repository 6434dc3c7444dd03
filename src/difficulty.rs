use crate::stats::{CharacterRecord, Mode, StatisticsStore};

/// Difficulty of a single record: `error_rate * mean_latency`.
///
/// Untested characters score `+inf` so they are always practiced first.
pub fn score(record: &CharacterRecord) -> f64 {
    match (record.error_rate(), record.mean_latency()) {
        (Some(error_rate), Some(mean)) => error_rate * mean,
        _ => f64::INFINITY,
    }
}

/// Ranks candidate characters by difficulty for one mode.
///
/// Scores are derived on every call from the store's current records.
#[derive(Debug, Clone, Copy)]
pub struct DifficultyModel<'a> {
    store: &'a StatisticsStore,
}

impl<'a> DifficultyModel<'a> {
    pub fn new(store: &'a StatisticsStore) -> Self {
        Self { store }
    }

    pub fn score_of(&self, character: char, mode: Mode) -> f64 {
        self.store
            .record(character, mode)
            .map_or(f64::INFINITY, score)
    }

    /// Candidates ordered hardest first. The sort is stable, so equal scores
    /// keep the order in which `candidates` yields them.
    pub fn rank<I>(&self, candidates: I, mode: Mode) -> Vec<(char, f64)>
    where
        I: IntoIterator<Item = char>,
    {
        let mut ranked: Vec<(char, f64)> = candidates
            .into_iter()
            .map(|c| (c, self.score_of(c, mode)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

/// Harmonic decay over rank positions: `1 / (rank_index + 1)`
pub fn weights(ranked: &[(char, f64)]) -> Vec<f64> {
    (0..ranked.len()).map(|i| 1.0 / (i as f64 + 1.0)).collect()
}
