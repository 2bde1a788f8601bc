use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::difficulty::metrics::{MasteryIndicators, MetricsSet, StruggleIndicators};
use crate::difficulty::types::Tier;

/// Indicator bundle that justified a tier change; stored on the audit event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerMetrics {
    Struggle(StruggleIndicators),
    Mastery(MasteryIndicators),
}

#[derive(Debug, Clone, PartialEq)]
pub enum HoldReason {
    InsufficientData,
    Stabilization { volatility: f64 },
    WithinOptimalRange,
}

impl fmt::Display for HoldReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientData => f.write_str("insufficient_data"),
            Self::Stabilization { volatility } => write!(
                f,
                "High performance volatility ({volatility:.2}) - maintaining current level for stabilization"
            ),
            Self::WithinOptimalRange => f.write_str("performance_within_optimal_range"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdaptationDecision {
    Hold(HoldReason),
    Demote {
        to: Tier,
        reason: String,
        trigger: TriggerMetrics,
        confidence: f64,
    },
    Promote {
        to: Tier,
        reason: String,
        trigger: TriggerMetrics,
        confidence: f64,
    },
}

impl AdaptationDecision {
    /// The new tier, or `None` for a hold.
    pub fn target(&self) -> Option<Tier> {
        match self {
            Self::Hold(_) => None,
            Self::Demote { to, .. } | Self::Promote { to, .. } => Some(*to),
        }
    }

    /// Human-readable reason, as reported in `RecordOutcome::adaptation_reason`.
    pub fn reason(&self) -> String {
        match self {
            Self::Hold(reason) => reason.to_string(),
            Self::Demote { reason, .. } | Self::Promote { reason, .. } => reason.clone(),
        }
    }
}

/// Evaluates, in order: missing data, struggle, mastery, volatility.
///
/// Struggle is checked first so an erratic learner is never promoted on the
/// same call that shows distress. At most one step is taken per call.
pub fn decide(metrics: &MetricsSet, current: Tier, config: &EngineConfig) -> AdaptationDecision {
    let Some(primary) = metrics.primary() else {
        return AdaptationDecision::Hold(HoldReason::InsufficientData);
    };

    if primary.struggle.struggling {
        if let Some(to) = current.easier() {
            return AdaptationDecision::Demote {
                to,
                reason: format!("Struggling detected: {}", primary.struggle.describe()),
                confidence: primary.struggle.struggle_score,
                trigger: TriggerMetrics::Struggle(primary.struggle.clone()),
            };
        }
    }

    if primary.mastery.mastery && primary.avg_accuracy >= config.mastery_threshold {
        if let Some(to) = current.harder() {
            return AdaptationDecision::Promote {
                to,
                reason: format!("Mastery achieved: {}", primary.mastery.describe()),
                confidence: primary.mastery.mastery_score,
                trigger: TriggerMetrics::Mastery(primary.mastery.clone()),
            };
        }
    }

    if primary.performance_volatility > config.volatility_threshold {
        return AdaptationDecision::Hold(HoldReason::Stabilization {
            volatility: primary.performance_volatility,
        });
    }

    AdaptationDecision::Hold(HoldReason::WithinOptimalRange)
}
