use chrono::{DateTime, Utc};

use crate::config::EngineConfig;
use crate::difficulty::metrics::{consistency, mean, trend_slope};
use crate::difficulty::types::{
    Recommendation, SessionInsights, SessionQuality, SessionSample, SubjectProfile, Tier,
};

const SESSION_LOOKBACK: usize = 5;
const SESSION_MIN_SAMPLES: usize = 3;
const SESSION_PROMOTE_ACCURACY: f64 = 0.9;
const SESSION_DEMOTE_ACCURACY: f64 = 0.4;

const CONSISTENCY_SPAN: usize = 10;
const RATIONALE_MIN_HISTORY: usize = 5;

/// Confidence reported when no profile exists.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

impl Recommendation {
    /// Side-effect-free answer for a key with no stored profile.
    pub fn fallback(rationale: impl Into<String>) -> Self {
        Self {
            recommended_tier: Tier::default(),
            confidence: FALLBACK_CONFIDENCE,
            rationale: rationale.into(),
            learning_patterns: None,
            session_insights: None,
        }
    }
}

/// Same-session nudge of -1, 0 or +1 tiers from the last few answers.
pub fn session_adjustment(samples: &[SessionSample]) -> i32 {
    if samples.len() < SESSION_MIN_SAMPLES {
        return 0;
    }

    let start = samples.len().saturating_sub(SESSION_LOOKBACK);
    let accuracies: Vec<f64> = samples[start..].iter().map(|s| s.accuracy).collect();
    let avg = mean(&accuracies).unwrap_or(0.0);

    if avg >= SESSION_PROMOTE_ACCURACY && samples.len() >= SESSION_LOOKBACK {
        1
    } else if avg <= SESSION_DEMOTE_ACCURACY {
        -1
    } else {
        0
    }
}

/// Blend of data volume, recent tier stability and accuracy consistency,
/// clamped to [0, 1].
pub fn recommendation_confidence(
    profile: &SubjectProfile,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> f64 {
    let weights = &config.recommendation;
    let history_len = profile.performance_history.len();

    let data_confidence =
        (history_len as f64 / weights.data_volume_saturation.max(1) as f64).min(1.0);

    let recent_changes = profile
        .adaptation_events
        .iter()
        .filter(|e| (now - e.timestamp).num_days() <= config.stability_lookback_days)
        .count();
    let stability_confidence = (1.0 - recent_changes as f64 * weights.stability_penalty_per_change)
        .max(weights.min_stability);

    let consistency_confidence = if history_len >= CONSISTENCY_SPAN {
        consistency(&profile.recent_accuracies(CONSISTENCY_SPAN))
    } else {
        0.5
    };

    (data_confidence * weights.data_volume
        + stability_confidence * weights.stability
        + consistency_confidence * weights.consistency)
        .clamp(0.0, 1.0)
}

/// Sentence listing the signals that shaped the recommendation.
pub fn rationale(profile: &SubjectProfile, adjustment: i32) -> String {
    if profile.performance_history.len() < RATIONALE_MIN_HISTORY {
        return "Insufficient performance data - using default intermediate level".to_string();
    }

    let patterns = &profile.learning_patterns;
    let mut reasons = Vec::new();

    if adjustment > 0 {
        reasons.push("excellent session performance suggests readiness for increased challenge");
    } else if adjustment < 0 {
        reasons.push("session struggles indicate need for easier content");
    }

    if patterns.retention_strength > 0.8 {
        reasons.push("strong retention patterns");
    } else if patterns.retention_strength < 0.4 {
        reasons.push("retention needs improvement");
    }

    if patterns.learning_velocity > 0.7 {
        reasons.push("rapid learning progress");
    } else if patterns.learning_velocity < 0.3 {
        reasons.push("steady learning pace");
    }

    if reasons.is_empty() {
        reasons.push("performance within optimal range");
    }

    format!("Recommendation based on: {}", reasons.join(", "))
}

/// Coarse label from session accuracy and consistency.
pub fn session_quality(samples: &[SessionSample]) -> SessionQuality {
    if samples.len() < SESSION_MIN_SAMPLES {
        return SessionQuality::InsufficientData;
    }

    let accuracies: Vec<f64> = samples.iter().map(|s| s.accuracy).collect();
    let avg = mean(&accuracies).unwrap_or(0.0);
    let stability = consistency(&accuracies);

    if avg >= 0.8 && stability >= 0.7 {
        SessionQuality::Excellent
    } else if avg >= 0.6 && stability >= 0.5 {
        SessionQuality::Good
    } else if avg >= 0.4 {
        SessionQuality::Fair
    } else {
        SessionQuality::NeedsImprovement
    }
}

/// `None` before the first answer of a session.
pub fn session_insights(samples: &[SessionSample]) -> Option<SessionInsights> {
    if samples.is_empty() {
        return None;
    }

    let accuracies: Vec<f64> = samples.iter().map(|s| s.accuracy).collect();
    let response_times: Vec<f64> = samples
        .iter()
        .filter(|s| s.response_time > 0.0)
        .map(|s| s.response_time)
        .collect();

    Some(SessionInsights {
        questions_answered: samples.len(),
        session_accuracy: mean(&accuracies).unwrap_or(0.0),
        accuracy_trend: trend_slope(&accuracies),
        avg_response_time: mean(&response_times).unwrap_or(0.0),
        performance_stability: consistency(&accuracies),
        session_quality: session_quality(samples),
    })
}

/// Stored tier plus the session nudge, clamped to the ladder.
pub fn recommend(profile: &SubjectProfile, now: DateTime<Utc>, config: &EngineConfig) -> Recommendation {
    let samples = &profile.session.samples;
    let adjustment = session_adjustment(samples);

    Recommendation {
        recommended_tier: profile.current_difficulty.shifted(adjustment),
        confidence: recommendation_confidence(profile, now, config),
        rationale: rationale(profile, adjustment),
        learning_patterns: Some(profile.learning_patterns.clone()),
        session_insights: session_insights(samples),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::decision::TriggerMetrics;
    use crate::difficulty::metrics::StruggleIndicators;
    use crate::difficulty::types::{AdaptationEvent, PerformanceInput, PerformanceRecord, ProfileKey};
    use chrono::Duration;

    fn samples(accuracies: &[f64]) -> Vec<SessionSample> {
        accuracies
            .iter()
            .map(|&a| SessionSample {
                accuracy: a,
                response_time: 10.0,
                difficulty: Tier::Intermediate,
                confidence: 3,
            })
            .collect()
    }

    fn profile(history_len: usize, accuracy: f64) -> SubjectProfile {
        let now = Utc::now();
        let mut profile = SubjectProfile::new(&ProfileKey::new("u", "s"), now);
        profile.performance_history = (0..history_len)
            .map(|_| {
                PerformanceRecord::from_input(
                    PerformanceInput::new("q").with_accuracy(accuracy),
                    Tier::Intermediate,
                    now,
                )
            })
            .collect();
        profile
    }

    fn event(at: DateTime<Utc>) -> AdaptationEvent {
        AdaptationEvent {
            timestamp: at,
            from_difficulty: Tier::Intermediate,
            to_difficulty: Tier::Beginner,
            reason: "Struggling detected: low_accuracy, low_confidence".to_string(),
            trigger_metrics: TriggerMetrics::Struggle(StruggleIndicators::default()),
            confidence_score: 0.4,
        }
    }

    #[test]
    fn test_session_adjustment() {
        assert_eq!(session_adjustment(&samples(&[1.0, 1.0])), 0);
        assert_eq!(session_adjustment(&samples(&[1.0, 1.0, 1.0, 1.0])), 0);
        assert_eq!(session_adjustment(&samples(&[1.0; 5])), 1);
        assert_eq!(session_adjustment(&samples(&[0.3, 0.4, 0.2])), -1);
        assert_eq!(session_adjustment(&samples(&[0.7; 6])), 0);
        // only the last five count
        assert_eq!(session_adjustment(&samples(&[0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0])), 1);
    }

    #[test]
    fn test_confidence_blend() {
        let now = Utc::now();
        let mut p = profile(50, 0.8);
        // 1.0 * 0.4 + 1.0 * 0.3 + 1.0 * 0.3
        assert!((recommendation_confidence(&p, now, &EngineConfig::default()) - 1.0).abs() < 1e-9);

        p.adaptation_events.push(event(now - Duration::days(1)));
        p.adaptation_events.push(event(now - Duration::days(30)));
        // stability drops to 0.8
        assert!((recommendation_confidence(&p, now, &EngineConfig::default()) - 0.94).abs() < 1e-9);
    }

    #[test]
    fn test_stability_confidence_floor() {
        let now = Utc::now();
        let mut p = profile(0, 0.0);
        for _ in 0..10 {
            p.adaptation_events.push(event(now));
        }
        // 0.0 * 0.4 + 0.3 * 0.3 + 0.5 * 0.3
        assert!((recommendation_confidence(&p, now, &EngineConfig::default()) - 0.24).abs() < 1e-9);
    }

    #[test]
    fn test_rationale_buckets() {
        let mut p = profile(4, 0.5);
        assert!(rationale(&p, 1).starts_with("Insufficient performance data"));

        p = profile(10, 0.5);
        assert_eq!(rationale(&p, 0), "Recommendation based on: performance within optimal range");

        p.learning_patterns.retention_strength = 0.9;
        p.learning_patterns.learning_velocity = 0.2;
        assert_eq!(
            rationale(&p, -1),
            "Recommendation based on: session struggles indicate need for easier content, strong retention patterns, steady learning pace"
        );
    }

    #[test]
    fn test_session_quality_labels() {
        assert_eq!(session_quality(&samples(&[0.9, 0.9])), SessionQuality::InsufficientData);
        assert_eq!(session_quality(&samples(&[0.9, 0.85, 0.9])), SessionQuality::Excellent);
        assert_eq!(session_quality(&samples(&[0.7, 0.6, 0.7])), SessionQuality::Good);
        assert_eq!(session_quality(&samples(&[1.0, 0.0, 0.5])), SessionQuality::Fair);
        assert_eq!(session_quality(&samples(&[0.1, 0.2, 0.3])), SessionQuality::NeedsImprovement);
    }

    #[test]
    fn test_session_insights_empty() {
        assert!(session_insights(&[]).is_none());
        let insights = session_insights(&samples(&[0.5, 1.0])).unwrap();
        assert_eq!(insights.questions_answered, 2);
        assert!((insights.session_accuracy - 0.75).abs() < 1e-12);
        assert!((insights.avg_response_time - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_recommend_clamps_to_ladder() {
        let mut p = profile(10, 0.95);
        p.current_difficulty = Tier::Mastery;
        p.session.samples = samples(&[1.0; 5]);
        let rec = recommend(&p, Utc::now(), &EngineConfig::default());
        assert_eq!(rec.recommended_tier, Tier::Mastery);

        p.current_difficulty = Tier::Beginner;
        p.session.samples = samples(&[0.1; 3]);
        let rec = recommend(&p, Utc::now(), &EngineConfig::default());
        assert_eq!(rec.recommended_tier, Tier::Beginner);
    }
}
