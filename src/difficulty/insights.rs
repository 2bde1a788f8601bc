use crate::difficulty::metrics::mean;
use crate::difficulty::types::{LearningInsights, LearningPatternProfile, SubjectProfile};

const INSIGHT_MIN_HISTORY: usize = 10;
const MAX_RECOMMENDATIONS: usize = 3;

/// Placeholder message until ten answers exist, then pattern-based insights.
pub fn learning_insights(profile: &SubjectProfile) -> LearningInsights {
    if profile.performance_history.len() < INSIGHT_MIN_HISTORY {
        return LearningInsights::Building {
            message: "Building learning profile - more data needed for detailed insights".to_string(),
        };
    }

    let p = &profile.learning_patterns;
    let mut insights = Vec::new();

    if p.learning_velocity > 0.7 {
        insights.push("You're learning rapidly and ready for challenges".to_string());
    } else if p.learning_velocity < 0.3 {
        insights.push("You're taking time to master concepts thoroughly".to_string());
    }

    if p.retention_strength > 0.8 {
        insights.push("Excellent knowledge retention".to_string());
    } else if p.retention_strength < 0.4 {
        insights.push("Consider reviewing concepts more frequently".to_string());
    }

    if p.consistency_score > 0.8 {
        insights.push("Very consistent performance".to_string());
    } else if p.consistency_score < 0.4 {
        insights.push("Performance varies - identify optimal study conditions".to_string());
    }

    LearningInsights::Detailed {
        insights,
        learning_strengths: learning_strengths(p),
        improvement_areas: improvement_areas(p),
    }
}

/// Pattern scalars above their strength cut-offs.
pub fn learning_strengths(p: &LearningPatternProfile) -> Vec<String> {
    let mut strengths = Vec::new();
    if p.retention_strength > 0.7 {
        strengths.push("Strong knowledge retention".to_string());
    }
    if p.learning_velocity > 0.6 {
        strengths.push("Quick concept acquisition".to_string());
    }
    if p.challenge_tolerance > 0.7 {
        strengths.push("Handles challenging content well".to_string());
    }
    if p.consistency_score > 0.7 {
        strengths.push("Consistent performance".to_string());
    }
    strengths
}

/// Pattern scalars below 0.4 (0.3 for velocity).
pub fn improvement_areas(p: &LearningPatternProfile) -> Vec<String> {
    let mut areas = Vec::new();
    if p.retention_strength < 0.4 {
        areas.push("Knowledge retention".to_string());
    }
    if p.learning_velocity < 0.3 {
        areas.push("Learning pace".to_string());
    }
    if p.challenge_tolerance < 0.4 {
        areas.push("Handling difficult concepts".to_string());
    }
    if p.consistency_score < 0.4 {
        areas.push("Performance consistency".to_string());
    }
    areas
}

/// Up to three next steps, most specific first.
pub fn recommended_actions(profile: &SubjectProfile) -> Vec<String> {
    let mut actions = Vec::new();
    let p = &profile.learning_patterns;

    if profile.performance_history.len() >= INSIGHT_MIN_HISTORY {
        let recent = mean(&profile.recent_accuracies(INSIGHT_MIN_HISTORY)).unwrap_or(0.0);
        if recent < 0.5 {
            actions.push("Consider reviewing fundamental concepts before proceeding".to_string());
        } else if recent > 0.85 {
            actions.push("You're ready for more challenging content".to_string());
        }
    }

    if p.consistency_score < 0.5 {
        actions.push("Try to maintain consistent study sessions for better results".to_string());
    }
    if p.retention_strength < 0.5 {
        actions.push("Implement spaced repetition to improve retention".to_string());
    }
    if p.challenge_tolerance < 0.4 {
        actions.push("Gradually increase difficulty to build confidence".to_string());
    }

    actions.truncate(MAX_RECOMMENDATIONS);
    actions
}
