#![allow(dead_code)]

use adaptive_difficulty::{
    DifficultyEngine, EngineConfig, MemoryProfileStore, PerformanceInput, PerformanceRecord, ProfileKey,
    ProfileStore, SubjectProfile, Tier,
};
use chrono::{DateTime, Duration, Utc};

pub fn memory_engine() -> DifficultyEngine<MemoryProfileStore> {
    DifficultyEngine::new(EngineConfig::default(), MemoryProfileStore::new())
}

pub fn input(accuracy: f64, response_time: f64) -> PerformanceInput {
    PerformanceInput::new("q").with_accuracy(accuracy).with_response_time(response_time)
}

/// Struggling answer: low confidence, one hint, two attempts.
pub fn weak_input(accuracy: f64) -> PerformanceInput {
    input(accuracy, 10.0).with_confidence(2).with_hints(1).with_attempts(2)
}

/// Confident first-try answer without hints.
pub fn strong_input(response_time: f64) -> PerformanceInput {
    input(0.95, response_time).with_confidence(5).with_hints(0).with_attempts(1)
}

/// Stores a profile whose history is built from `inputs`, one minute apart,
/// ending at `end`.
pub fn seed<S: ProfileStore>(
    engine: &DifficultyEngine<S>,
    learner_id: &str,
    subject_key: &str,
    tier: Tier,
    inputs: Vec<PerformanceInput>,
    end: DateTime<Utc>,
) -> SubjectProfile {
    let key = ProfileKey::new(learner_id, subject_key);
    let start = end - Duration::minutes(inputs.len() as i64);
    let mut profile = SubjectProfile::new(&key, start);
    profile.current_difficulty = tier;
    profile.performance_history = inputs
        .into_iter()
        .enumerate()
        .map(|(i, inp)| PerformanceRecord::from_input(inp, tier, start + Duration::minutes(i as i64)))
        .collect();
    profile.updated_at = end;
    engine.store().put(&key, &profile).expect("seed profile");
    profile
}
