use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSizes {
    pub immediate: usize,
    pub recent: usize,
    pub session: usize,
    pub historical: usize,
}

impl Default for WindowSizes {
    fn default() -> Self {
        Self {
            immediate: 5,
            recent: 15,
            session: 30,
            historical: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationWeights {
    pub data_volume: f64,
    pub stability: f64,
    pub consistency: f64,
    /// History length at which data-volume confidence saturates.
    pub data_volume_saturation: usize,
    pub stability_penalty_per_change: f64,
    pub min_stability: f64,
}

impl Default for RecommendationWeights {
    fn default() -> Self {
        Self {
            data_volume: 0.4,
            stability: 0.3,
            consistency: 0.3,
            data_volume_saturation: 50,
            stability_penalty_per_change: 0.2,
            min_stability: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub windows: WindowSizes,
    pub recommendation: RecommendationWeights,
    pub struggle_threshold: f64,
    pub mastery_threshold: f64,
    pub volatility_threshold: f64,
    pub session_timeout_hours: i64,
    pub min_history_for_adaptation: usize,
    pub min_history_for_patterns: usize,
    pub pattern_window: usize,
    pub stability_lookback_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            windows: WindowSizes::default(),
            recommendation: RecommendationWeights::default(),
            struggle_threshold: 0.45,
            mastery_threshold: 0.90,
            volatility_threshold: 0.3,
            session_timeout_hours: 2,
            min_history_for_adaptation: 3,
            min_history_for_patterns: 10,
            pattern_window: 20,
            stability_lookback_days: 7,
        }
    }
}

/// Upper bound for `DIFFICULTY_SESSION_TIMEOUT_HOURS` (one year).
pub const MAX_SESSION_TIMEOUT_HOURS: i64 = 24 * 365;

impl EngineConfig {
    /// Defaults overridden by any `DIFFICULTY_*` variable that parses.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(val) = env_f64("DIFFICULTY_STRUGGLE_THRESHOLD") {
            config.struggle_threshold = val.clamp(0.0, 1.0);
        }
        if let Some(val) = env_f64("DIFFICULTY_MASTERY_THRESHOLD") {
            config.mastery_threshold = val.clamp(0.0, 1.0);
        }
        if let Some(val) = env_f64("DIFFICULTY_VOLATILITY_THRESHOLD") {
            config.volatility_threshold = val.max(0.0);
        }
        if let Ok(val) = std::env::var("DIFFICULTY_SESSION_TIMEOUT_HOURS") {
            if let Ok(hours) = val.parse::<i64>() {
                if hours > 0 {
                    config.session_timeout_hours = hours.min(MAX_SESSION_TIMEOUT_HOURS);
                }
            }
        }

        config
    }

    /// `RUST_LOG`, or the crate's default directive.
    pub fn log_level() -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| crate::logging::DEFAULT_DIRECTIVE.to_string())
    }
}

fn env_f64(name: &str) -> Option<f64> {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_thresholds() {
        let config = EngineConfig::default();
        assert_eq!(config.windows.immediate, 5);
        assert_eq!(config.windows.recent, 15);
        assert_eq!(config.windows.session, 30);
        assert_eq!(config.windows.historical, 100);
        assert!((config.struggle_threshold - 0.45).abs() < 1e-12);
        assert!((config.mastery_threshold - 0.90).abs() < 1e-12);
        assert!((config.volatility_threshold - 0.3).abs() < 1e-12);
        assert_eq!(config.session_timeout_hours, 2);
    }

    #[test]
    fn recommendation_weights_sum_to_one() {
        let w = RecommendationWeights::default();
        assert!((w.data_volume + w.stability + w.consistency - 1.0).abs() < 1e-12);
    }

    #[test]
    fn from_env_ignores_malformed_values() {
        std::env::set_var("DIFFICULTY_VOLATILITY_THRESHOLD", "not-a-number");
        std::env::set_var("DIFFICULTY_SESSION_TIMEOUT_HOURS", "3");
        let config = EngineConfig::from_env();
        std::env::remove_var("DIFFICULTY_VOLATILITY_THRESHOLD");
        std::env::remove_var("DIFFICULTY_SESSION_TIMEOUT_HOURS");

        assert!((config.volatility_threshold - 0.3).abs() < 1e-12);
        assert_eq!(config.session_timeout_hours, 3);

        std::env::set_var("DIFFICULTY_SESSION_TIMEOUT_HOURS", "9000000000000");
        let config = EngineConfig::from_env();
        std::env::remove_var("DIFFICULTY_SESSION_TIMEOUT_HOURS");

        assert_eq!(config.session_timeout_hours, MAX_SESSION_TIMEOUT_HOURS);
    }
}
