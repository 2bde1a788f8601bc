use chrono::{DateTime, Utc};

use crate::config::EngineConfig;
use crate::difficulty::decision::{self, AdaptationDecision, HoldReason};
use crate::difficulty::insights;
use crate::difficulty::locks::KeyedLocks;
use crate::difficulty::metrics::MetricsSet;
use crate::difficulty::patterns;
use crate::difficulty::recommendation;
use crate::difficulty::session;
use crate::difficulty::types::*;
use crate::store::{ProfileStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Outcome of running the decision procedure against a freshly extended history.
struct Adaptation {
    adapted: bool,
    reason: String,
}

/// Per-(learner, subject) tier engine over an injected [`ProfileStore`].
///
/// Writes for the same key are serialized; reads take no lock.
pub struct DifficultyEngine<S> {
    config: EngineConfig,
    store: S,
    locks: KeyedLocks,
}

impl<S: ProfileStore> DifficultyEngine<S> {
    /// Builds an engine over `store`. No profile is touched until the first call.
    pub fn new(config: EngineConfig, store: S) -> Self {
        Self {
            config,
            store,
            locks: KeyedLocks::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the stored profile, creating and saving a default one if absent.
    pub fn initialize_profile(&self, learner_id: &str, subject_key: &str) -> EngineResult<SubjectProfile> {
        let key = ProfileKey::new(learner_id, subject_key);
        let handle = self.locks.handle(&key);
        let _guard = handle.lock();
        self.load_or_init(&key, Utc::now())
    }

    /// [`Self::record_performance_at`] with the wall clock.
    pub fn record_performance(
        &self,
        learner_id: &str,
        subject_key: &str,
        input: PerformanceInput,
    ) -> EngineResult<RecordOutcome> {
        self.record_performance_at(learner_id, subject_key, input, Utc::now())
    }

    /// Appends one answer, re-evaluates the tier and saves the profile.
    pub fn record_performance_at(
        &self,
        learner_id: &str,
        subject_key: &str,
        input: PerformanceInput,
        now: DateTime<Utc>,
    ) -> EngineResult<RecordOutcome> {
        let key = ProfileKey::new(learner_id, subject_key);
        let handle = self.locks.handle(&key);
        let _guard = handle.lock();

        let mut profile = self.load_or_init(&key, now)?;

        // history stays chronological even if the caller's clock runs backwards
        let now = match profile.performance_history.last() {
            Some(last) if now < last.timestamp => {
                tracing::warn!(
                    key = %key,
                    supplied = %now,
                    last = %last.timestamp,
                    "timestamp older than last record, clamping"
                );
                last.timestamp
            }
            _ => now,
        };

        let record = PerformanceRecord::from_input(input, profile.current_difficulty, now);
        if session::track(&mut profile.session, &record, now, self.config.session_timeout_hours) {
            tracing::debug!(
                learner_id,
                subject = subject_key,
                session_id = ?profile.session.session_id,
                "started new study session"
            );
        }
        profile.performance_history.push(record);

        let adaptation = self.analyze_and_adapt(&mut profile, now);

        if patterns::update_learning_patterns(
            &mut profile.learning_patterns,
            &profile.performance_history,
            &self.config,
        ) {
            tracing::debug!(
                learner_id,
                subject = subject_key,
                optimal = %profile.learning_patterns.optimal_difficulty,
                "learning patterns updated"
            );
        }

        profile.updated_at = now;
        self.save(&key, &profile)?;

        Ok(RecordOutcome {
            recorded: true,
            current_tier: profile.current_difficulty,
            adaptation_triggered: adaptation.adapted,
            adaptation_reason: adaptation.reason,
            next_tier: profile.current_difficulty,
            insights: insights::learning_insights(&profile),
            recommendations: insights::recommended_actions(&profile),
        })
    }

    /// [`Self::get_recommendation_at`] with the wall clock.
    pub fn get_recommendation(
        &self,
        learner_id: &str,
        subject_key: &str,
        question_type: Option<&str>,
    ) -> EngineResult<Recommendation> {
        self.get_recommendation_at(learner_id, subject_key, question_type, Utc::now())
    }

    /// Read-only; an unknown key yields the default recommendation.
    pub fn get_recommendation_at(
        &self,
        learner_id: &str,
        subject_key: &str,
        question_type: Option<&str>,
        now: DateTime<Utc>,
    ) -> EngineResult<Recommendation> {
        let key = ProfileKey::new(learner_id, subject_key);

        let Some(profile) = self.store.get(&key)? else {
            let rationale = if self.store.subjects_for(learner_id)?.is_empty() {
                "No performance history available"
            } else {
                "No subject-specific performance history"
            };
            return Ok(Recommendation::fallback(rationale));
        };

        let rec = recommendation::recommend(&profile, now, &self.config);
        tracing::debug!(
            learner_id,
            subject = subject_key,
            question_type = question_type.unwrap_or("any"),
            tier = %rec.recommended_tier,
            confidence = rec.confidence,
            "difficulty recommended"
        );
        Ok(rec)
    }

    /// Tier-change audit log, oldest first; empty for an unknown key.
    pub fn adaptation_history(&self, learner_id: &str, subject_key: &str) -> EngineResult<Vec<AdaptationEvent>> {
        let key = ProfileKey::new(learner_id, subject_key);
        Ok(self
            .store
            .get(&key)?
            .map(|p| p.adaptation_events)
            .unwrap_or_default())
    }

    fn analyze_and_adapt(&self, profile: &mut SubjectProfile, now: DateTime<Utc>) -> Adaptation {
        if profile.performance_history.len() < self.config.min_history_for_adaptation {
            return Adaptation {
                adapted: false,
                reason: HoldReason::InsufficientData.to_string(),
            };
        }

        let metrics = MetricsSet::calculate(&profile.performance_history, &self.config);
        let from = profile.current_difficulty;

        match decision::decide(&metrics, from, &self.config) {
            AdaptationDecision::Hold(reason) => {
                tracing::debug!(
                    learner_id = %profile.learner_id,
                    subject = %profile.subject_key,
                    tier = %from,
                    reason = %reason,
                    "holding difficulty"
                );
                Adaptation {
                    adapted: false,
                    reason: reason.to_string(),
                }
            }
            AdaptationDecision::Demote { to, reason, trigger, confidence }
            | AdaptationDecision::Promote { to, reason, trigger, confidence } => {
                profile.adaptation_events.push(AdaptationEvent {
                    timestamp: now,
                    from_difficulty: from,
                    to_difficulty: to,
                    reason: reason.clone(),
                    trigger_metrics: trigger,
                    confidence_score: confidence,
                });
                profile.current_difficulty = to;

                tracing::info!(
                    learner_id = %profile.learner_id,
                    subject = %profile.subject_key,
                    from = %from,
                    to = %to,
                    confidence,
                    reason = %reason,
                    "difficulty adapted"
                );
                Adaptation { adapted: true, reason }
            }
        }
    }

    fn load_or_init(&self, key: &ProfileKey, now: DateTime<Utc>) -> EngineResult<SubjectProfile> {
        if let Some(profile) = self.store.get(key).map_err(|err| {
            tracing::warn!(key = %key, error = %err, "failed to load profile");
            err
        })? {
            return Ok(profile);
        }

        let profile = SubjectProfile::new(key, now);
        self.save(key, &profile)?;
        tracing::info!(key = %key, "initialized subject profile");
        Ok(profile)
    }

    fn save(&self, key: &ProfileKey, profile: &SubjectProfile) -> EngineResult<()> {
        self.store.put(key, profile).map_err(|err| {
            tracing::warn!(key = %key, error = %err, "failed to save profile");
            EngineError::from(err)
        })
    }
}
