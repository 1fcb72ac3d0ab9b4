//! Degradation detection: windowed statistics, per-dimension detectors,
//! orchestration, and customer-level alert rollup.

pub mod alert;
pub mod confidence;
pub mod detector;
pub mod engine;
pub mod stats;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a detected pattern or alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// The dimension along which an integration is degrading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    ErrorRate,
    Latency,
    Availability,
    RateLimit,
    Auth,
    Webhook,
}

impl std::fmt::Display for PatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternType::ErrorRate => write!(f, "error_rate"),
            PatternType::Latency => write!(f, "latency"),
            PatternType::Availability => write!(f, "availability"),
            PatternType::RateLimit => write!(f, "rate_limit"),
            PatternType::Auth => write!(f, "auth"),
            PatternType::Webhook => write!(f, "webhook"),
        }
    }
}

/// Baseline-vs-current movement of one window metric.
///
/// `baseline` and `current` carry the metric's unit (percent or ms);
/// `change_percent` is always relative, rounded to 1 decimal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trend {
    pub baseline: f64,
    pub current: f64,
    pub change: f64,
    pub change_percent: f64,
}

/// One window's metric value in a pattern timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// Timestamp of the window's first record.
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub label: String,
}

/// One detected dimension of decline for one integration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DegradationPattern {
    pub id: String,
    #[serde(rename = "type")]
    pub pattern_type: PatternType,
    pub severity: Severity,
    pub integration_name: String,
    pub description: String,
    pub trend: Trend,
    pub timeline: Vec<TrendPoint>,
    pub predicted_impact: String,
    pub detected_at: DateTime<Utc>,
    /// First window whose metric clearly left the baseline.
    pub first_signal_at: DateTime<Utc>,
    /// Heuristic 0-100 trust score from sample volume and change magnitude.
    pub confidence: u8,
}

/// Customer-level rollup of every pattern found in one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DegradationAlert {
    pub id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub patterns: Vec<DegradationPattern>,
    pub overall_severity: Severity,
    pub summary: String,
    pub recommended_actions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Output contract of one detection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionOutcome {
    pub patterns: Vec<DegradationPattern>,
    pub alerts: Vec<DegradationAlert>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Warning.to_string(), "warning");
        assert_eq!(Severity::Critical.to_string(), "critical");
    }

    #[test]
    fn test_pattern_type_wire_tags() {
        let json = serde_json::to_string(&PatternType::RateLimit).unwrap();
        assert_eq!(json, "\"rate_limit\"");
        let parsed: PatternType = serde_json::from_str("\"error_rate\"").unwrap();
        assert_eq!(parsed, PatternType::ErrorRate);
    }

    #[test]
    fn test_trend_serializes_camel_case() {
        let trend = Trend {
            baseline: 2.5,
            current: 7.5,
            change: 5.0,
            change_percent: 200.0,
        };
        let json = serde_json::to_value(trend).unwrap();
        assert!(json.get("changePercent").is_some());
        assert!(json.get("change_percent").is_none());
    }
}
