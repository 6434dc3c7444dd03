use std::time::{Duration, Instant};

use proptest::prelude::*;
use symtype::difficulty::{score, weights, DifficultyModel};
use symtype::generator::{PracticeGenerator, RngSource, CANDIDATE_ALPHABET};
use symtype::session::{EndReason, PracticeSession, Progress, MAX_ERRORS};
use symtype::{Mode, StatisticsStore};
use tempfile::tempdir;

// --- STRATEGIES ---

fn alphabet() -> Vec<char> {
    CANDIDATE_ALPHABET.chars().collect()
}

fn arb_mode() -> impl Strategy<Value = Mode> {
    prop_oneof![Just(Mode::Peek), Just(Mode::NoPeek)]
}

prop_compose! {
    fn arb_outcome()(
        index in 0..CANDIDATE_ALPHABET.chars().count(),
        mode in arb_mode(),
        millis in 1u64..5_000,
        wrong in any::<bool>()
    ) -> (char, Mode, Duration, bool) {
        (alphabet()[index], mode, Duration::from_millis(millis), wrong)
    }
}

type Outcome = (char, Mode, Duration, bool);

fn arb_outcomes() -> impl Strategy<Value = Vec<Outcome>> {
    proptest::collection::vec(arb_outcome(), 0..200)
}

fn fill(mut store: StatisticsStore, outcomes: &[Outcome]) -> StatisticsStore {
    for (c, mode, latency, wrong) in outcomes {
        store.record_outcome(*c, *mode, *latency, *wrong);
    }
    store
}

fn arb_store() -> impl Strategy<Value = StatisticsStore> {
    arb_outcomes().prop_map(|o| fill(StatisticsStore::in_memory(), &o))
}

// --- PROPERTIES ---

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn records_stay_consistent(store in arb_store()) {
        for mode in Mode::ALL {
            for (_, rec) in store.records(mode) {
                prop_assert_eq!(rec.latencies.len() as u64, rec.attempts);
                prop_assert!(rec.errors <= rec.attempts);
                prop_assert!(rec.latencies.iter().all(|t| *t >= 0.0));
            }
        }
    }

    #[test]
    fn persisted_store_loads_back_equal(outcomes in arb_outcomes()) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("typing_stats.json");
        let store = fill(StatisticsStore::empty_at(&path), &outcomes);
        store.persist().unwrap();

        prop_assert_eq!(StatisticsStore::load(&path).unwrap(), store);
    }

    #[test]
    fn weights_are_positive_and_decreasing(n in 1usize..100) {
        let ranked: Vec<(char, f64)> = (0..n).map(|_| ('x', 0.0)).collect();
        let w = weights(&ranked);
        prop_assert_eq!(w.len(), n);
        prop_assert!(w.iter().all(|x| *x > 0.0));
        prop_assert!(w.windows(2).all(|p| p[0] > p[1]));
    }

    #[test]
    fn untested_characters_rank_first(store in arb_store(), mode in arb_mode()) {
        let ranked = DifficultyModel::new(&store).rank(alphabet(), mode);
        let first_tested = ranked
            .iter()
            .position(|(c, _)| !store.get_record(*c, mode).is_untested())
            .unwrap_or(ranked.len());
        prop_assert!(ranked[first_tested..]
            .iter()
            .all(|(c, _)| !store.get_record(*c, mode).is_untested()));
        prop_assert!(ranked.windows(2).all(|p| p[0].1 >= p[1].1));
    }

    #[test]
    fn slower_history_never_scores_lower(
        base in proptest::collection::vec(1u64..5_000, 1..20),
        extra in 0u64..5_000,
        errors in 0usize..20
    ) {
        let mut fast = StatisticsStore::in_memory();
        let mut slow = StatisticsStore::in_memory();
        for (i, ms) in base.iter().enumerate() {
            let wrong = i < errors;
            fast.record_outcome('!', Mode::Peek, Duration::from_millis(*ms), wrong);
            slow.record_outcome('!', Mode::Peek, Duration::from_millis(ms + extra), wrong);
        }
        prop_assert!(
            score(&slow.get_record('!', Mode::Peek)) >= score(&fast.get_record('!', Mode::Peek))
        );
    }

    #[test]
    fn generated_strings_use_the_alphabet(
        store in arb_store(),
        mode in arb_mode(),
        length in 1usize..100,
        seed in any::<u64>()
    ) {
        let target = PracticeGenerator::new()
            .generate(&store, length, mode, &mut RngSource::seeded(seed))
            .unwrap();
        prop_assert_eq!(target.len(), length);
        prop_assert!(target.iter().all(|c| CANDIDATE_ALPHABET.contains(*c)));
    }

    #[test]
    fn sessions_stop_at_the_error_limit(
        target in proptest::collection::vec(0..CANDIDATE_ALPHABET.chars().count(), 5..40),
        hits in proptest::collection::vec(any::<bool>(), 40)
    ) {
        let letters = alphabet();
        let target: Vec<char> = target.into_iter().map(|i| letters[i]).collect();
        let t0 = Instant::now();
        let mut session = PracticeSession::new(target.clone(), Mode::Peek, t0);

        let mut errors = 0;
        let mut ended = None;
        for (pos, hit) in hits.iter().enumerate().take(target.len()) {
            let key = if *hit { target[pos] } else { '\u{0}' };
            if !hit {
                errors += 1;
            }
            if let Progress::Ended(reason) = session.type_char(key, t0) {
                ended = Some((pos, reason));
                break;
            }
        }

        let (pos, reason) = ended.expect("every session ends by the end of the target");
        prop_assert_eq!(session.input().len(), pos + 1);
        prop_assert!(session.error_count() <= MAX_ERRORS);
        if errors == MAX_ERRORS {
            prop_assert_eq!(reason, EndReason::TooManyErrors);
        } else {
            prop_assert_eq!(reason, EndReason::Finished);
            prop_assert_eq!(pos + 1, target.len());
        }
        prop_assert_eq!(session.outcomes().count(), pos + 1);
    }
}
