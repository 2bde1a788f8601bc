use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::difficulty::decision::TriggerMetrics;

/// Five-step difficulty ladder, ordered lowest to highest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
    Expert,
    Mastery,
}

impl Tier {
    pub const ALL: [Tier; 5] = [
        Tier::Beginner,
        Tier::Intermediate,
        Tier::Advanced,
        Tier::Expert,
        Tier::Mastery,
    ];

    pub const LOWEST: Tier = Tier::Beginner;
    pub const HIGHEST: Tier = Tier::Mastery;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Expert => "expert",
            Self::Mastery => "mastery",
        }
    }

    /// Position on the ladder, 0 for `Beginner`.
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Moves `offset` steps along the ladder, stopping at either end.
    pub fn shifted(&self, offset: i32) -> Self {
        let max = (Self::ALL.len() - 1) as i64;
        let target = (self.index() as i64 + offset as i64).clamp(0, max);
        Self::ALL[target as usize]
    }

    /// Next tier up, `None` at the top.
    pub fn harder(&self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    /// Next tier down, `None` at the bottom.
    pub fn easier(&self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    /// Case-insensitive label lookup; unknown labels give `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            "expert" => Some(Self::Expert),
            "mastery" => Some(Self::Mastery),
            _ => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store key: one profile per (learner, subject).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileKey {
    pub learner_id: String,
    pub subject_key: String,
}

impl ProfileKey {
    pub fn new(learner_id: impl Into<String>, subject_key: impl Into<String>) -> Self {
        Self {
            learner_id: learner_id.into(),
            subject_key: subject_key.into(),
        }
    }
}

impl fmt::Display for ProfileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.learner_id, self.subject_key)
    }
}

/// Caller-reported answer. Everything except the question id is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceInput {
    #[serde(default)]
    pub question_id: String,
    pub difficulty_level: Option<String>,
    pub response_time: Option<f64>,
    pub accuracy: Option<f64>,
    pub confidence_level: Option<u8>,
    pub hint_usage: Option<u32>,
    pub attempt_count: Option<u32>,
    pub topic: Option<String>,
    pub question_type: Option<String>,
}

impl PerformanceInput {
    pub fn new(question_id: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            ..Default::default()
        }
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    pub fn with_response_time(mut self, seconds: f64) -> Self {
        self.response_time = Some(seconds);
        self
    }

    pub fn with_confidence(mut self, level: u8) -> Self {
        self.confidence_level = Some(level);
        self
    }

    pub fn with_hints(mut self, hints: u32) -> Self {
        self.hint_usage = Some(hints);
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempt_count = Some(attempts);
        self
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.difficulty_level = Some(tier.as_str().to_string());
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_question_type(mut self, question_type: impl Into<String>) -> Self {
        self.question_type = Some(question_type.into());
        self
    }
}

/// Midpoint of the 1..=5 self-report scale.
pub const DEFAULT_CONFIDENCE: u8 = 3;
pub const DEFAULT_QUESTION_TYPE: &str = "multiple_choice";

/// One answered question. Never modified after it is appended to a history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRecord {
    pub timestamp: DateTime<Utc>,
    pub question_id: String,
    pub difficulty_level: Tier,
    /// Seconds; 0 means the answer time was not measured.
    pub response_time: f64,
    pub accuracy: f64,
    pub confidence_level: u8,
    pub hint_usage: u32,
    pub attempt_count: u32,
    pub topic: String,
    pub question_type: String,
}

impl PerformanceRecord {
    /// Fills defaults and clamps every field into its valid range. A missing or
    /// unknown tier label falls back to `current_tier`.
    pub fn from_input(input: PerformanceInput, current_tier: Tier, now: DateTime<Utc>) -> Self {
        let difficulty_level = input
            .difficulty_level
            .as_deref()
            .and_then(Tier::parse)
            .unwrap_or(current_tier);
        let response_time = input
            .response_time
            .filter(|t| t.is_finite())
            .unwrap_or(0.0)
            .max(0.0);
        let accuracy = input
            .accuracy
            .filter(|a| a.is_finite())
            .unwrap_or(0.0)
            .clamp(0.0, 1.0);

        Self {
            timestamp: now,
            question_id: input.question_id,
            difficulty_level,
            response_time,
            accuracy,
            confidence_level: input.confidence_level.unwrap_or(DEFAULT_CONFIDENCE).clamp(1, 5),
            hint_usage: input.hint_usage.unwrap_or(0),
            attempt_count: input.attempt_count.unwrap_or(1).max(1),
            topic: input.topic.unwrap_or_default(),
            question_type: input
                .question_type
                .unwrap_or_else(|| DEFAULT_QUESTION_TYPE.to_string()),
        }
    }

    pub fn has_response_time(&self) -> bool {
        self.response_time > 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSample {
    pub accuracy: f64,
    pub response_time: f64,
    pub difficulty: Tier,
    pub confidence: u8,
}

impl From<&PerformanceRecord> for SessionSample {
    fn from(record: &PerformanceRecord) -> Self {
        Self {
            accuracy: record.accuracy,
            response_time: record.response_time,
            difficulty: record.difficulty_level,
            confidence: record.confidence_level,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub session_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub questions_in_session: u32,
    pub samples: Vec<SessionSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPatternProfile {
    pub optimal_difficulty: Tier,
    pub learning_velocity: f64,
    pub retention_strength: f64,
    pub challenge_tolerance: f64,
    pub consistency_score: f64,
}

impl Default for LearningPatternProfile {
    fn default() -> Self {
        Self {
            optimal_difficulty: Tier::Intermediate,
            learning_velocity: 0.5,
            retention_strength: 0.5,
            challenge_tolerance: 0.5,
            consistency_score: 0.5,
        }
    }
}

/// Audit entry written only when the tier actually moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptationEvent {
    pub timestamp: DateTime<Utc>,
    pub from_difficulty: Tier,
    pub to_difficulty: Tier,
    pub reason: String,
    pub trigger_metrics: TriggerMetrics,
    pub confidence_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectProfile {
    pub learner_id: String,
    pub subject_key: String,
    pub current_difficulty: Tier,
    pub performance_history: Vec<PerformanceRecord>,
    pub adaptation_events: Vec<AdaptationEvent>,
    pub learning_patterns: LearningPatternProfile,
    pub session: SessionState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubjectProfile {
    /// Fresh profile at the middle tier with default patterns and no session.
    pub fn new(key: &ProfileKey, now: DateTime<Utc>) -> Self {
        Self {
            learner_id: key.learner_id.clone(),
            subject_key: key.subject_key.clone(),
            current_difficulty: Tier::default(),
            performance_history: Vec::new(),
            adaptation_events: Vec::new(),
            learning_patterns: LearningPatternProfile::default(),
            session: SessionState::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> ProfileKey {
        ProfileKey::new(self.learner_id.clone(), self.subject_key.clone())
    }

    /// Accuracy of the trailing `n` records, oldest first.
    pub fn recent_accuracies(&self, n: usize) -> Vec<f64> {
        let start = self.performance_history.len().saturating_sub(n);
        self.performance_history[start..]
            .iter()
            .map(|p| p.accuracy)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionQuality {
    InsufficientData,
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl SessionQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InsufficientData => "insufficient_data",
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::NeedsImprovement => "needs_improvement",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInsights {
    pub questions_answered: usize,
    pub session_accuracy: f64,
    pub accuracy_trend: f64,
    pub avg_response_time: f64,
    pub performance_stability: f64,
    pub session_quality: SessionQuality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LearningInsights {
    Building {
        message: String,
    },
    Detailed {
        insights: Vec<String>,
        learning_strengths: Vec<String>,
        improvement_areas: Vec<String>,
    },
}

/// Result of reporting one answered question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordOutcome {
    pub recorded: bool,
    pub current_tier: Tier,
    pub adaptation_triggered: bool,
    pub adaptation_reason: String,
    pub next_tier: Tier,
    pub insights: LearningInsights,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub recommended_tier: Tier,
    pub confidence: f64,
    pub rationale: String,
    pub learning_patterns: Option<LearningPatternProfile>,
    pub session_insights: Option<SessionInsights>,
}
