//! Property-Based Tests for the scheduling core
//!
//! Tests the following invariants:
//! - Coverage: after reconciliation every catalog word has a record with level in [0, 4]
//! - Monotonicity: "remembered" never lowers a level, "forgot" always zeroes it
//! - Interval table: nextDue after "remembered" is today + INTERVALS[level]
//! - Idempotence: reconciling twice without judgments changes nothing
//! - Fair tie-break: equal streaks appear in both orders about equally often

use chrono::NaiveDate;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::{json, Map, Value};

use tango_algo::{
    add_days, apply_outcome, build_queue, normalize_catalog, Catalog, ForgotPolicy, Outcome,
    ProgressRecord, ProgressStore, QueueOptions, StreakPriority, WordEntry, INTERVALS, MAX_LEVEL,
};

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_day() -> impl Strategy<Value = NaiveDate> {
    (0u32..3650).prop_map(|offset| add_days(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), offset))
}

fn arb_word() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

fn arb_outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![Just(Outcome::Remembered), Just(Outcome::Forgot)]
}

fn arb_policy() -> impl Strategy<Value = ForgotPolicy> {
    prop_oneof![Just(ForgotPolicy::SameDay), Just(ForgotPolicy::NextDay)]
}

fn arb_record() -> impl Strategy<Value = ProgressRecord> {
    (0u8..=MAX_LEVEL, arb_day(), proptest::option::of(arb_day()), 0u32..20).prop_map(
        |(level, next_due, last_reviewed, streak_forgot)| ProgressRecord {
            level,
            next_due,
            last_reviewed,
            streak_forgot,
        },
    )
}

/// Stored entries in every shape older blobs or corruption could produce
fn arb_raw_record() -> impl Strategy<Value = Value> {
    prop_oneof![
        arb_record().prop_map(|r| serde_json::to_value(r).unwrap()),
        (-5i64..10).prop_map(|level| json!({ "level": level })),
        Just(json!({ "level": "x", "next": "not a date" })),
        Just(json!({ "next": "2024-01-01" })),
        Just(json!(null)),
        Just(json!(17)),
    ]
}

fn arb_blob() -> impl Strategy<Value = Value> {
    prop::collection::btree_map(arb_word(), arb_raw_record(), 0..12)
        .prop_map(|map| Value::Object(map.into_iter().collect::<Map<String, Value>>()))
}

fn arb_catalog() -> impl Strategy<Value = Catalog> {
    prop::collection::vec(arb_word(), 0..15).prop_map(|words| {
        let raw: Vec<_> = words.into_iter().map(|w| json!({ "word": w })).collect();
        normalize_catalog(&raw)
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_reconcile_covers_catalog(
        blob in arb_blob(),
        catalog in arb_catalog(),
        today in arb_day()
    ) {
        let mut store = ProgressStore::from_raw(blob.clone());
        store.reconcile(&catalog, today);

        for word in catalog.words() {
            let record = store.get(word);
            prop_assert!(record.is_some(), "missing record for {}", word);
            prop_assert!(record.unwrap().level <= MAX_LEVEL);
        }

        // nothing stored before is lost
        let snapshot = store.snapshot();
        for key in blob.as_object().unwrap().keys() {
            prop_assert!(snapshot.get(key).is_some(), "record {} was pruned", key);
        }
    }

    #[test]
    fn prop_reconcile_idempotent(blob in arb_blob(), catalog in arb_catalog(), today in arb_day()) {
        let mut store = ProgressStore::from_raw(blob);
        store.reconcile(&catalog, today);
        let first = store.snapshot();

        let report = store.reconcile(&catalog, today);
        prop_assert_eq!(report.inserted + report.restored, 0);
        prop_assert_eq!(store.snapshot(), first);
    }

    #[test]
    fn prop_outcome_level_rules(
        record in arb_record(),
        outcome in arb_outcome(),
        policy in arb_policy(),
        today in arb_day()
    ) {
        let before = record.clone();
        let mut after = record;
        apply_outcome(&mut after, outcome, today, policy);

        prop_assert!(after.level <= MAX_LEVEL);
        prop_assert_eq!(after.last_reviewed, Some(today));

        match outcome {
            Outcome::Remembered => {
                prop_assert!(after.level >= before.level);
                prop_assert_eq!(after.level, (before.level + 1).min(MAX_LEVEL));
                prop_assert_eq!(after.streak_forgot, 0);
                let days = INTERVALS[after.level as usize];
                prop_assert_eq!(after.next_due, add_days(today, days));
            }
            Outcome::Forgot => {
                prop_assert_eq!(after.level, 0);
                prop_assert_eq!(after.streak_forgot, before.streak_forgot + 1);
                prop_assert_eq!(after.next_due, add_days(today, policy.retry_after_days()));
            }
        }
    }

    #[test]
    fn prop_next_due_ignores_previous_due(
        record in arb_record(),
        other_due in arb_day(),
        today in arb_day()
    ) {
        let mut a = record.clone();
        let mut b = ProgressRecord { next_due: other_due, ..record };
        apply_outcome(&mut a, Outcome::Remembered, today, ForgotPolicy::NextDay);
        apply_outcome(&mut b, Outcome::Remembered, today, ForgotPolicy::NextDay);
        prop_assert_eq!(a.next_due, b.next_due);
    }

    #[test]
    fn prop_queue_contains_exactly_the_due_words(
        blob in arb_blob(),
        catalog in arb_catalog(),
        today in arb_day(),
        seed in any::<u64>()
    ) {
        let mut store = ProgressStore::from_raw(blob);
        store.reconcile(&catalog, today);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let queue = build_queue(
            &catalog,
            &store,
            today,
            &QueueOptions::default(),
            &StreakPriority,
            &mut rng,
        );

        let mut expected: Vec<String> = catalog
            .words()
            .filter(|w| store.get(w).unwrap().next_due <= today)
            .map(str::to_string)
            .collect();
        let mut got = queue.words.clone();
        expected.sort();
        got.sort();
        prop_assert_eq!(got, expected);

        // non-increasing streaks
        let streaks: Vec<u32> = queue.words.iter().map(|w| store.streak_forgot(w)).collect();
        prop_assert!(streaks.windows(2).all(|pair| pair[0] >= pair[1]));
    }
}

// ============================================================================
// Statistical tie-break check
// ============================================================================

#[test]
fn test_streak_ties_are_unbiased() {
    let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let catalog = Catalog::new(["first", "second", "forgotten"].map(WordEntry::new));
    let mut store = ProgressStore::new();
    store.reconcile(&catalog, today);
    store.judge("forgotten", Outcome::Forgot, today, ForgotPolicy::SameDay);

    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let trials = 4_000;
    let mut first_wins = 0;

    for _ in 0..trials {
        let queue = build_queue(
            &catalog,
            &store,
            today,
            &QueueOptions::default(),
            &StreakPriority,
            &mut rng,
        );
        assert_eq!(queue.words[0], "forgotten");
        if queue.words[1] == "first" {
            first_wins += 1;
        }
    }

    // 4000 fair coin flips: the 50% band is ±~95 at 3 sigma
    let share = first_wins as f64 / trials as f64;
    assert!((share - 0.5).abs() < 0.05, "tie-break share {share} is biased");
}
