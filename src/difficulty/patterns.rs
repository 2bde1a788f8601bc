use crate::config::EngineConfig;
use crate::difficulty::metrics::{consistency, mean, trend_slope};
use crate::difficulty::types::{LearningPatternProfile, PerformanceRecord, Tier};

const VELOCITY_WEIGHT: f64 = 0.3;
const RETENTION_WEIGHT: f64 = 0.4;
const TOLERANCE_WEIGHT: f64 = 0.2;
const CONSISTENCY_WEIGHT: f64 = 0.1;

const RETENTION_SPAN: usize = 10;

/// Recomputes the long-run scalars from the trailing pattern window.
///
/// Returns `false` and leaves `patterns` untouched while the history is
/// shorter than `min_history_for_patterns` or the window is empty.
pub fn update_learning_patterns(
    patterns: &mut LearningPatternProfile,
    history: &[PerformanceRecord],
    config: &EngineConfig,
) -> bool {
    if history.len() < config.min_history_for_patterns {
        return false;
    }

    let recent = &history[history.len().saturating_sub(config.pattern_window)..];
    if recent.is_empty() {
        return false;
    }
    let accuracies: Vec<f64> = recent.iter().map(|p| p.accuracy).collect();

    patterns.learning_velocity = (0.5 + trend_slope(&accuracies)).clamp(0.0, 1.0);

    patterns.retention_strength = if accuracies.len() >= RETENTION_SPAN {
        mean(&accuracies[accuracies.len() - RETENTION_SPAN..])
            .unwrap_or(0.5)
            .clamp(0.0, 1.0)
    } else {
        0.5
    };

    let struggles = recent
        .iter()
        .filter(|p| p.accuracy < config.struggle_threshold)
        .count();
    patterns.challenge_tolerance = (1.0 - struggles as f64 / recent.len() as f64).clamp(0.0, 1.0);

    patterns.consistency_score = consistency(&accuracies).clamp(0.0, 1.0);
    patterns.optimal_difficulty = optimal_difficulty(patterns);

    true
}

/// Weighted blend of the four scalars: velocity 0.3, retention 0.4, tolerance 0.2, consistency 0.1.
pub fn composite_score(patterns: &LearningPatternProfile) -> f64 {
    patterns.learning_velocity * VELOCITY_WEIGHT
        + patterns.retention_strength * RETENTION_WEIGHT
        + patterns.challenge_tolerance * TOLERANCE_WEIGHT
        + patterns.consistency_score * CONSISTENCY_WEIGHT
}

/// Advisory label only; the stored tier is driven by the decision procedure.
pub fn optimal_difficulty(patterns: &LearningPatternProfile) -> Tier {
    let score = composite_score(patterns);
    if score >= 0.8 {
        Tier::Expert
    } else if score >= 0.7 {
        Tier::Advanced
    } else if score >= 0.5 {
        Tier::Intermediate
    } else {
        Tier::Beginner
    }
}
