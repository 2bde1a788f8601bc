use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::difficulty::types::{PerformanceRecord, DEFAULT_CONFIDENCE};

const STRUGGLE_LOOKBACK: usize = 5;
const MASTERY_LOOKBACK: usize = 10;

const STRUGGLE_RT_MIN_SAMPLES: usize = 3;
const STRUGGLE_RT_SLOPE: f64 = 0.5;
const STRUGGLE_CONFIDENCE: f64 = 2.5;
const STRUGGLE_HINTS: f64 = 0.5;
const STRUGGLE_ATTEMPTS: f64 = 1.5;
const STRUGGLE_MIN_SIGNALS: usize = 2;

const MASTERY_RT_MIN_SAMPLES: usize = 5;
const MASTERY_RT_SLOPE: f64 = -0.3;
const MASTERY_CONFIDENCE: f64 = 4.0;
const MASTERY_HINTS: f64 = 0.1;
const MASTERY_ATTEMPTS: f64 = 1.1;
const MASTERY_CONSISTENCY: f64 = 0.8;
const MASTERY_MIN_SIGNALS: usize = 3;

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Least-squares slope of `values` against their index.
pub fn trend_slope(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let n = values.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }

    if denominator == 0.0 {
        return 0.0;
    }
    numerator / denominator
}

/// Sample (n - 1) standard deviation.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = values.iter().sum::<f64>() / values.len() as f64;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// `1 - coefficient of variation`, floored at 0.
pub fn consistency(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 1.0;
    }
    let m = values.iter().sum::<f64>() / values.len() as f64;
    if m == 0.0 {
        return 0.0;
    }
    (1.0 - sample_std_dev(values) / m).max(0.0)
}

fn tail<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

fn tail_mean<F>(records: &[PerformanceRecord], n: usize, f: F) -> f64
where
    F: Fn(&PerformanceRecord) -> f64,
{
    let values: Vec<f64> = tail(records, n).iter().map(f).collect();
    mean(&values).unwrap_or(0.0)
}

fn measured_response_times(records: &[PerformanceRecord]) -> Vec<f64> {
    records
        .iter()
        .filter(|p| p.has_response_time())
        .map(|p| p.response_time)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StruggleSignal {
    LowAccuracy,
    IncreasingResponseTime,
    LowConfidence,
    HighHintUsage,
    MultipleAttempts,
}

impl StruggleSignal {
    pub const COUNT: usize = 5;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LowAccuracy => "low_accuracy",
            Self::IncreasingResponseTime => "increasing_response_time",
            Self::LowConfidence => "low_confidence",
            Self::HighHintUsage => "high_hint_usage",
            Self::MultipleAttempts => "multiple_attempts",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasterySignal {
    HighAccuracy,
    DecreasingResponseTime,
    HighConfidence,
    MinimalHints,
    SingleAttempts,
    ConsistentPerformance,
}

impl MasterySignal {
    pub const COUNT: usize = 6;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighAccuracy => "high_accuracy",
            Self::DecreasingResponseTime => "decreasing_response_time",
            Self::HighConfidence => "high_confidence",
            Self::MinimalHints => "minimal_hints",
            Self::SingleAttempts => "single_attempts",
            Self::ConsistentPerformance => "consistent_performance",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StruggleIndicators {
    pub struggling: bool,
    pub indicators: Vec<StruggleSignal>,
    pub struggle_score: f64,
}

impl StruggleIndicators {
    pub fn detect(window: &[PerformanceRecord], struggle_threshold: f64) -> Self {
        if window.is_empty() {
            return Self::default();
        }

        let mut indicators = Vec::new();

        if tail_mean(window, STRUGGLE_LOOKBACK, |p| p.accuracy) < struggle_threshold {
            indicators.push(StruggleSignal::LowAccuracy);
        }

        let response_times = measured_response_times(window);
        if response_times.len() >= STRUGGLE_RT_MIN_SAMPLES
            && trend_slope(tail(&response_times, STRUGGLE_LOOKBACK)) > STRUGGLE_RT_SLOPE
        {
            indicators.push(StruggleSignal::IncreasingResponseTime);
        }

        if tail_mean(window, STRUGGLE_LOOKBACK, |p| p.confidence_level as f64) < STRUGGLE_CONFIDENCE {
            indicators.push(StruggleSignal::LowConfidence);
        }

        if tail_mean(window, STRUGGLE_LOOKBACK, |p| p.hint_usage as f64) > STRUGGLE_HINTS {
            indicators.push(StruggleSignal::HighHintUsage);
        }

        if tail_mean(window, STRUGGLE_LOOKBACK, |p| p.attempt_count as f64) > STRUGGLE_ATTEMPTS {
            indicators.push(StruggleSignal::MultipleAttempts);
        }

        Self {
            struggling: indicators.len() >= STRUGGLE_MIN_SIGNALS,
            struggle_score: indicators.len() as f64 / StruggleSignal::COUNT as f64,
            indicators,
        }
    }

    /// Fired signal names joined with ", ".
    pub fn describe(&self) -> String {
        join_names(self.indicators.iter().map(StruggleSignal::as_str))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryIndicators {
    pub mastery: bool,
    pub indicators: Vec<MasterySignal>,
    pub mastery_score: f64,
}

impl MasteryIndicators {
    pub fn detect(window: &[PerformanceRecord], mastery_threshold: f64) -> Self {
        if window.is_empty() {
            return Self::default();
        }

        let mut indicators = Vec::new();

        if tail_mean(window, MASTERY_LOOKBACK, |p| p.accuracy) >= mastery_threshold {
            indicators.push(MasterySignal::HighAccuracy);
        }

        let response_times = measured_response_times(window);
        if response_times.len() >= MASTERY_RT_MIN_SAMPLES
            && trend_slope(tail(&response_times, MASTERY_LOOKBACK)) < MASTERY_RT_SLOPE
        {
            indicators.push(MasterySignal::DecreasingResponseTime);
        }

        if tail_mean(window, MASTERY_LOOKBACK, |p| p.confidence_level as f64) >= MASTERY_CONFIDENCE {
            indicators.push(MasterySignal::HighConfidence);
        }

        if tail_mean(window, MASTERY_LOOKBACK, |p| p.hint_usage as f64) < MASTERY_HINTS {
            indicators.push(MasterySignal::MinimalHints);
        }

        if tail_mean(window, MASTERY_LOOKBACK, |p| p.attempt_count as f64) <= MASTERY_ATTEMPTS {
            indicators.push(MasterySignal::SingleAttempts);
        }

        let accuracies: Vec<f64> = tail(window, MASTERY_LOOKBACK).iter().map(|p| p.accuracy).collect();
        if consistency(&accuracies) > MASTERY_CONSISTENCY {
            indicators.push(MasterySignal::ConsistentPerformance);
        }

        Self {
            mastery: indicators.len() >= MASTERY_MIN_SIGNALS,
            mastery_score: indicators.len() as f64 / MasterySignal::COUNT as f64,
            indicators,
        }
    }

    /// Fired signal names joined with ", ".
    pub fn describe(&self) -> String {
        join_names(self.indicators.iter().map(MasterySignal::as_str))
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowMetrics {
    pub sample_size: usize,
    pub avg_accuracy: f64,
    pub accuracy_trend: f64,
    pub avg_response_time: f64,
    pub response_time_trend: f64,
    pub avg_confidence: f64,
    pub performance_volatility: f64,
    pub consistency: f64,
    pub struggle: StruggleIndicators,
    pub mastery: MasteryIndicators,
}

impl WindowMetrics {
    /// Statistics for one trailing slice. An empty slice yields zeros, default
    /// confidence and no struggle or mastery.
    pub fn compute(window: &[PerformanceRecord], config: &EngineConfig) -> Self {
        let accuracies: Vec<f64> = window.iter().map(|p| p.accuracy).collect();
        let response_times = measured_response_times(window);
        let confidences: Vec<f64> = window.iter().map(|p| p.confidence_level as f64).collect();

        Self {
            sample_size: window.len(),
            avg_accuracy: mean(&accuracies).unwrap_or(0.0),
            accuracy_trend: trend_slope(&accuracies),
            avg_response_time: mean(&response_times).unwrap_or(0.0),
            response_time_trend: trend_slope(&response_times),
            avg_confidence: mean(&confidences).unwrap_or(DEFAULT_CONFIDENCE as f64),
            performance_volatility: sample_std_dev(&accuracies),
            consistency: consistency(&accuracies),
            struggle: StruggleIndicators::detect(window, config.struggle_threshold),
            mastery: MasteryIndicators::detect(window, config.mastery_threshold),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Window {
    Immediate,
    Recent,
    Session,
    Historical,
}

impl Window {
    pub const ALL: [Window; 4] = [
        Window::Immediate,
        Window::Recent,
        Window::Session,
        Window::Historical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::Recent => "recent",
            Self::Session => "session",
            Self::Historical => "historical",
        }
    }

    /// Maximum number of trailing records this window covers.
    pub fn size(&self, config: &EngineConfig) -> usize {
        match self {
            Self::Immediate => config.windows.immediate,
            Self::Recent => config.windows.recent,
            Self::Session => config.windows.session,
            Self::Historical => config.windows.historical,
        }
    }
}

/// Metrics for every window; a window is absent when the history is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSet {
    pub immediate: Option<WindowMetrics>,
    pub recent: Option<WindowMetrics>,
    pub session: Option<WindowMetrics>,
    pub historical: Option<WindowMetrics>,
}

impl MetricsSet {
    pub fn calculate(history: &[PerformanceRecord], config: &EngineConfig) -> Self {
        let mut set = Self::default();
        if history.is_empty() {
            return set;
        }

        for window in Window::ALL {
            let metrics = WindowMetrics::compute(tail(history, window.size(config)), config);
            *set.slot_mut(window) = Some(metrics);
        }
        set
    }

    pub fn get(&self, window: Window) -> Option<&WindowMetrics> {
        match window {
            Window::Immediate => self.immediate.as_ref(),
            Window::Recent => self.recent.as_ref(),
            Window::Session => self.session.as_ref(),
            Window::Historical => self.historical.as_ref(),
        }
    }

    /// The window decisions are made on: recent, else immediate.
    pub fn primary(&self) -> Option<&WindowMetrics> {
        self.recent.as_ref().or(self.immediate.as_ref())
    }

    fn slot_mut(&mut self, window: Window) -> &mut Option<WindowMetrics> {
        match window {
            Window::Immediate => &mut self.immediate,
            Window::Recent => &mut self.recent,
            Window::Session => &mut self.session,
            Window::Historical => &mut self.historical,
        }
    }
}
