use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::difficulty::{weights, DifficultyModel};
use crate::error::{Result, TrainerError};
use crate::stats::{Mode, StatisticsStore};

/// The special characters the trainer drills, in canonical order
pub const CANDIDATE_ALPHABET: &str = "!@#$%^&*()_+}{][\"\\:';?></.,=-~`0123456789";

/// Anything that can draw weighted samples with replacement
pub trait RandomSource {
    /// Draw `k` values from `choices`, each independently, with probability
    /// proportional to the matching entry of `weights`.
    fn sample_weighted<T: Clone>(&mut self, choices: &[T], weights: &[f64], k: usize) -> Vec<T>;
}

/// Production source backed by a `rand` generator
#[derive(Debug, Clone)]
pub struct RngSource<R: Rng> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    /// Non-deterministic source seeded from the OS
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Reproducible source for tests
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn sample_weighted<T: Clone>(&mut self, choices: &[T], weights: &[f64], k: usize) -> Vec<T> {
        if choices.is_empty() {
            return Vec::new();
        }
        match WeightedIndex::new(weights) {
            Ok(dist) if weights.len() == choices.len() => (0..k)
                .map(|_| choices[dist.sample(&mut self.rng)].clone())
                .collect(),
            // unusable weights degrade to a uniform draw
            _ => (0..k)
                .map(|_| choices[self.rng.gen_range(0..choices.len())].clone())
                .collect(),
        }
    }
}

/// Deterministic source that ignores weights and walks `choices` in order,
/// continuing where the previous call stopped.
#[derive(Debug, Clone, Default)]
pub struct SequentialSource {
    next: usize,
}

impl SequentialSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RandomSource for SequentialSource {
    fn sample_weighted<T: Clone>(&mut self, choices: &[T], _weights: &[f64], k: usize) -> Vec<T> {
        if choices.is_empty() {
            return Vec::new();
        }
        (0..k)
            .map(|_| {
                let v = choices[self.next % choices.len()].clone();
                self.next += 1;
                v
            })
            .collect()
    }
}

/// Builds practice strings biased toward the weakest characters
#[derive(Debug, Clone)]
pub struct PracticeGenerator {
    alphabet: Vec<char>,
}

impl Default for PracticeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PracticeGenerator {
    pub fn new() -> Self {
        Self::with_alphabet(CANDIDATE_ALPHABET.chars())
    }

    pub fn with_alphabet<I: IntoIterator<Item = char>>(alphabet: I) -> Self {
        Self {
            alphabet: alphabet.into_iter().collect(),
        }
    }

    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    /// Sample `length` characters with replacement using harmonic rank weights.
    ///
    /// When nothing in `mode` has been practiced yet every candidate ties at
    /// `+inf`, and the draw falls back to uniform. As soon as one character
    /// has a record the harmonic weights apply to the whole ranking, so the
    /// still-untested characters share the top ranks in alphabet order and
    /// get weights 1, 1/2, 1/3 and so on rather than equal ones.
    pub fn generate<R: RandomSource>(
        &self,
        store: &StatisticsStore,
        length: usize,
        mode: Mode,
        rng: &mut R,
    ) -> Result<Vec<char>> {
        if length < 1 {
            return Err(TrainerError::InvalidLength(format!(
                "cannot generate {length} characters"
            )));
        }

        let ranked = DifficultyModel::new(store).rank(self.alphabet.iter().copied(), mode);
        let untested_only = ranked.iter().all(|(_, s)| s.is_infinite());
        let w = if untested_only {
            vec![1.0; ranked.len()]
        } else {
            weights(&ranked)
        };
        let chars: Vec<char> = ranked.iter().map(|(c, _)| *c).collect();

        debug!(
            %mode,
            length,
            hardest = ?chars.iter().take(5).collect::<String>(),
            "generating practice string"
        );

        Ok(rng.sample_weighted(&chars, &w, length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;
    use std::time::Duration;

    #[test]
    fn test_alphabet_has_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        assert!(CANDIDATE_ALPHABET.chars().all(|c| seen.insert(c)));
        assert_eq!(PracticeGenerator::new().alphabet().len(), 41);
    }

    #[test]
    fn test_rejects_zero_length() {
        let store = StatisticsStore::in_memory();
        let mut rng = RngSource::seeded(1);
        let result = PracticeGenerator::new().generate(&store, 0, Mode::Peek, &mut rng);
        assert_matches!(result, Err(TrainerError::InvalidLength(_)));
    }

    #[test]
    fn test_empty_store_draws_from_alphabet() {
        let store = StatisticsStore::in_memory();
        let mut rng = RngSource::seeded(7);
        let out = PracticeGenerator::new()
            .generate(&store, 5, Mode::Peek, &mut rng)
            .unwrap();
        assert_eq!(out.len(), 5);
        assert!(out.iter().all(|c| CANDIDATE_ALPHABET.contains(*c)));
    }

    #[test]
    fn test_same_seed_same_string() {
        let store = StatisticsStore::in_memory();
        let gen = PracticeGenerator::new();
        let a = gen
            .generate(&store, 30, Mode::NoPeek, &mut RngSource::seeded(42))
            .unwrap();
        let b = gen
            .generate(&store, 30, Mode::NoPeek, &mut RngSource::seeded(42))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sequential_source_follows_rank_order() {
        let mut store = StatisticsStore::in_memory();
        // '!' becomes the easiest character, everything else stays untested
        store.record_outcome('!', Mode::Peek, Duration::from_secs(1), false);

        let gen = PracticeGenerator::with_alphabet("!@#".chars());
        let out = gen
            .generate(&store, 4, Mode::Peek, &mut SequentialSource::new())
            .unwrap();
        assert_eq!(out, vec!['@', '#', '!', '@']);
    }

    #[test]
    fn test_hardest_character_dominates() {
        let mut store = StatisticsStore::in_memory();
        let gen = PracticeGenerator::with_alphabet("ab".chars());
        for _ in 0..4 {
            store.record_outcome('a', Mode::Peek, Duration::from_secs(2), true);
            store.record_outcome('b', Mode::Peek, Duration::from_secs(1), false);
        }

        let out = gen
            .generate(&store, 3000, Mode::Peek, &mut RngSource::seeded(3))
            .unwrap();
        let mut counts: HashMap<char, usize> = HashMap::new();
        for c in out {
            *counts.entry(c).or_default() += 1;
        }
        // weights 1 : 1/2, so roughly two thirds should be 'a'
        let a = counts[&'a'] as f64 / 3000.0;
        assert!((0.6..0.73).contains(&a), "share of 'a' was {a}");
        assert!(counts[&'b'] > 0);
    }

    #[test]
    fn test_rng_source_uniform_fallback_on_bad_weights() {
        let mut rng = RngSource::seeded(9);
        let out = rng.sample_weighted(&['x', 'y'], &[0.0, 0.0], 10);
        assert_eq!(out.len(), 10);
        assert!(out.iter().all(|c| *c == 'x' || *c == 'y'));
        assert!(rng.sample_weighted::<char>(&[], &[], 3).is_empty());
    }
}
