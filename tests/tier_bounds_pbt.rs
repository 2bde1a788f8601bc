//! Property-based tests for tier movement.
//!
//! For any answer stream:
//! - a single record moves the tier by at most one step
//! - the adaptation log has exactly one event per triggered change
//! - logged events chain and end at the current tier
//! - a recommendation never strays more than one step from the stored tier

mod common;

use adaptive_difficulty::{PerformanceInput, ProfileKey, ProfileStore, Tier};
use chrono::{Duration, Utc};
use proptest::prelude::*;

use common::memory_engine;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_f64_0_1() -> impl Strategy<Value = f64> {
    (0u64..=1000u64).prop_map(|v| v as f64 / 1000.0)
}

fn arb_tier() -> impl Strategy<Value = Tier> {
    prop_oneof![
        Just(Tier::Beginner),
        Just(Tier::Intermediate),
        Just(Tier::Advanced),
        Just(Tier::Expert),
        Just(Tier::Mastery),
    ]
}

fn arb_input() -> impl Strategy<Value = PerformanceInput> {
    (
        arb_f64_0_1(),                         // accuracy
        proptest::option::of(0.0f64..90.0),    // response time
        1u8..=5u8,                             // confidence
        0u32..=3u32,                           // hints
        1u32..=3u32,                           // attempts
        proptest::option::of(arb_tier()),      // reported tier
    )
        .prop_map(|(accuracy, rt, confidence, hints, attempts, tier)| {
            let mut input = PerformanceInput::new("q")
                .with_accuracy(accuracy)
                .with_confidence(confidence)
                .with_hints(hints)
                .with_attempts(attempts);
            input.response_time = rt;
            if let Some(tier) = tier {
                input = input.with_tier(tier);
            }
            input
        })
}

fn step(a: Tier, b: Tier) -> i32 {
    (a.index() as i32 - b.index() as i32).abs()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn tier_moves_at_most_one_step(inputs in prop::collection::vec(arb_input(), 1..40)) {
        let engine = memory_engine();
        let start = Utc::now();
        let mut tier = Tier::Intermediate;
        let mut triggered = 0usize;

        for (i, input) in inputs.into_iter().enumerate() {
            let now = start + Duration::minutes(i as i64);
            let outcome = engine.record_performance_at("p", "s", input, now).unwrap();

            prop_assert!(step(tier, outcome.next_tier) <= 1);
            prop_assert_eq!(outcome.adaptation_triggered, outcome.next_tier != tier);
            if outcome.adaptation_triggered {
                triggered += 1;
            }
            tier = outcome.next_tier;

            let rec = engine.get_recommendation_at("p", "s", None, now).unwrap();
            prop_assert!(step(tier, rec.recommended_tier) <= 1);
            prop_assert!((0.0..=1.0).contains(&rec.confidence));
        }

        let events = engine.adaptation_history("p", "s").unwrap();
        prop_assert_eq!(events.len(), triggered);
        for pair in events.windows(2) {
            prop_assert_eq!(pair[0].to_difficulty, pair[1].from_difficulty);
        }
        if let Some(last) = events.last() {
            prop_assert_eq!(last.to_difficulty, tier);
        }

        let profile = engine.store().get(&ProfileKey::new("p", "s")).unwrap().unwrap();
        prop_assert_eq!(profile.current_difficulty, tier);
    }

    #[test]
    fn recorded_values_are_sanitized(inputs in prop::collection::vec(arb_input(), 1..20)) {
        let engine = memory_engine();
        for input in inputs {
            engine.record_performance("p", "s", input).unwrap();
        }

        let profile = engine.store().get(&ProfileKey::new("p", "s")).unwrap().unwrap();
        for record in &profile.performance_history {
            prop_assert!((0.0..=1.0).contains(&record.accuracy));
            prop_assert!((1..=5).contains(&record.confidence_level));
            prop_assert!(record.attempt_count >= 1);
            prop_assert!(record.response_time >= 0.0);
        }
        let p = &profile.learning_patterns;
        for score in [p.learning_velocity, p.retention_strength, p.challenge_tolerance, p.consistency_score] {
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }
}
