//! The parameterized per-dimension detector and its six variants.
//!
//! Every dimension follows the same shape: sort the applicable records by
//! time, window them, reduce each window to one metric value, compare the
//! last window against the baseline formed by the first two, and emit a
//! pattern when the warning rule fires. What varies per dimension is data:
//! the metric, the sample floor, the trigger rules, and the wording.

use chrono::{DateTime, Datelike, Utc};

use crate::config::DimensionThresholds;
use crate::detect::{
    confidence, stats, DegradationPattern, PatternType, Severity, Trend, TrendPoint,
};
use crate::records::{IntegrationUsageRecord, WebhookDeliveryRecord, WebhookStatus};

/// Integration label used for the customer-wide webhook dimension.
pub(crate) const WEBHOOK_INTEGRATION: &str = "webhooks";

/// The five dimensions computed over one integration's API calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UsageDimension {
    ErrorRate,
    Latency,
    RateLimit,
    Auth,
    Timeout,
}

/// How a dimension's trend values are rounded in the output contract.
#[derive(Clone, Copy)]
enum Unit {
    Percent,
    Millis,
}

impl Unit {
    fn round(self, value: f64) -> f64 {
        match self {
            Unit::Percent => stats::round2(value),
            Unit::Millis => value.round(),
        }
    }
}

impl UsageDimension {
    pub(crate) const ALL: [UsageDimension; 5] = [
        UsageDimension::ErrorRate,
        UsageDimension::Latency,
        UsageDimension::RateLimit,
        UsageDimension::Auth,
        UsageDimension::Timeout,
    ];

    fn pattern_type(self) -> PatternType {
        match self {
            UsageDimension::ErrorRate => PatternType::ErrorRate,
            UsageDimension::Latency => PatternType::Latency,
            UsageDimension::RateLimit => PatternType::RateLimit,
            UsageDimension::Auth => PatternType::Auth,
            UsageDimension::Timeout => PatternType::Availability,
        }
    }

    fn unit(self) -> Unit {
        match self {
            UsageDimension::Latency => Unit::Millis,
            _ => Unit::Percent,
        }
    }

    fn status_matches(self, status: u16) -> bool {
        match self {
            UsageDimension::ErrorRate => status >= 400,
            UsageDimension::Latency => false,
            UsageDimension::RateLimit => status == 429,
            UsageDimension::Auth => matches!(status, 401 | 403),
            UsageDimension::Timeout => matches!(status, 408 | 504),
        }
    }

    /// Volume dimensions gate on total call count; incident dimensions gate
    /// on how many calls actually hit the failing status codes.
    fn gates_on_matching(self) -> bool {
        matches!(
            self,
            UsageDimension::RateLimit | UsageDimension::Auth | UsageDimension::Timeout
        )
    }
}

/// Run one usage dimension over a single integration's calls.
pub(crate) fn detect_usage_dimension(
    dimension: UsageDimension,
    integration: &str,
    calls: &[&IntegrationUsageRecord],
    thresholds: &DimensionThresholds,
    window_count: usize,
    seq: usize,
    now: DateTime<Utc>,
) -> Option<DegradationPattern> {
    let samples = if dimension.gates_on_matching() {
        calls
            .iter()
            .filter(|c| dimension.status_matches(c.status_code))
            .count()
    } else {
        calls.len()
    };
    if samples < thresholds.min_samples {
        return None;
    }

    let mut sorted: Vec<&IntegrationUsageRecord> = calls.to_vec();
    sorted.sort_by_key(|c| c.timestamp);

    let wins = stats::windows(&sorted, window_count);
    if wins.len() < 2 {
        return None;
    }

    let values: Vec<f64> = wins
        .iter()
        .map(|w| match dimension {
            UsageDimension::Latency => {
                let latencies: Vec<f64> = w.iter().map(|c| c.latency_ms as f64).collect();
                stats::p95(&latencies)
            }
            _ => stats::rate(w, |c| dimension.status_matches(c.status_code)),
        })
        .collect();
    let starts: Vec<DateTime<Utc>> = wins.iter().map(|w| w[0].timestamp).collect();

    let mut pattern = evaluate(
        dimension.pattern_type(),
        dimension.unit(),
        integration,
        &values,
        &starts,
        sorted.len(),
        thresholds,
        seq,
        now,
    )?;

    if dimension == UsageDimension::Auth {
        let failures: Vec<&IntegrationUsageRecord> = sorted
            .iter()
            .copied()
            .filter(|c| dimension.status_matches(c.status_code))
            .collect();
        if let Some(hint) = weekday_hint(&failures) {
            pattern.description.push_str(&hint);
        }
    }

    Some(pattern)
}

/// Run the customer-wide webhook delivery dimension.
pub(crate) fn detect_webhook_dimension(
    webhooks: &[WebhookDeliveryRecord],
    thresholds: &DimensionThresholds,
    window_count: usize,
    seq: usize,
    now: DateTime<Utc>,
) -> Option<DegradationPattern> {
    if webhooks.len() < thresholds.min_samples {
        return None;
    }

    let mut sorted: Vec<&WebhookDeliveryRecord> = webhooks.iter().collect();
    sorted.sort_by_key(|w| w.timestamp);

    let wins = stats::windows(&sorted, window_count);
    if wins.len() < 2 {
        return None;
    }

    let values: Vec<f64> = wins
        .iter()
        .map(|w| stats::rate(w, |r| r.status == WebhookStatus::Delivered))
        .collect();
    let starts: Vec<DateTime<Utc>> = wins.iter().map(|w| w[0].timestamp).collect();

    evaluate(
        PatternType::Webhook,
        Unit::Percent,
        WEBHOOK_INTEGRATION,
        &values,
        &starts,
        sorted.len(),
        thresholds,
        seq,
        now,
    )
}

/// Shared trend evaluation: baseline vs current, trigger rules, pattern
/// assembly. Returns None when the warning rule stays quiet.
#[allow(clippy::too_many_arguments)]
fn evaluate(
    pattern_type: PatternType,
    unit: Unit,
    integration: &str,
    values: &[f64],
    starts: &[DateTime<Utc>],
    sample_size: usize,
    thresholds: &DimensionThresholds,
    seq: usize,
    now: DateTime<Utc>,
) -> Option<DegradationPattern> {
    let baseline = stats::mean(&values[..values.len().min(2)]);
    let current = *values.last()?;
    let change = current - baseline;
    let change_percent = if baseline > 0.0 {
        change / baseline * 100.0
    } else if current > 0.0 {
        100.0
    } else {
        0.0
    };

    if !thresholds.warning.fires(baseline, current, change_percent) {
        return None;
    }
    // Critical only ever upgrades a window that already warrants a warning.
    let severity = if thresholds.critical.fires(baseline, current, change_percent) {
        Severity::Critical
    } else {
        Severity::Warning
    };

    let timeline: Vec<TrendPoint> = values
        .iter()
        .zip(starts)
        .enumerate()
        .map(|(i, (&value, &timestamp))| TrendPoint {
            timestamp,
            value: stats::round2(value),
            label: format!("Window {}", i + 1),
        })
        .collect();

    let first_signal_at = values
        .iter()
        .zip(starts)
        .find(|(&value, _)| value > baseline * 1.5)
        .map(|(_, &start)| start)
        .unwrap_or(*starts.last()?);

    Some(DegradationPattern {
        id: format!("deg-{seq}"),
        pattern_type,
        severity,
        integration_name: integration.to_string(),
        description: describe(pattern_type, integration, unit, baseline, current),
        trend: Trend {
            baseline: unit.round(baseline),
            current: unit.round(current),
            change: unit.round(change),
            change_percent: stats::round1(change_percent),
        },
        timeline,
        predicted_impact: predicted_impact(pattern_type, current),
        detected_at: now,
        first_signal_at,
        confidence: confidence::score(sample_size, change_percent),
    })
}

fn describe(
    pattern_type: PatternType,
    integration: &str,
    unit: Unit,
    baseline: f64,
    current: f64,
) -> String {
    let baseline = unit.round(baseline);
    let current = unit.round(current);
    match pattern_type {
        PatternType::ErrorRate => format!(
            "Error rate for {integration} climbed from {baseline}% to {current}% of calls"
        ),
        PatternType::Latency => {
            format!("p95 latency for {integration} rose from {baseline}ms to {current}ms")
        }
        PatternType::RateLimit => format!(
            "Rate limiting on {integration} is tightening: {current}% of calls now return 429 (was {baseline}%)"
        ),
        PatternType::Auth => format!(
            "Authentication failures on {integration} rising from {baseline}% to {current}% of calls"
        ),
        PatternType::Availability => format!(
            "Timeouts on {integration} rising from {baseline}% to {current}% of calls"
        ),
        PatternType::Webhook => {
            format!("Webhook delivery rate fell from {baseline}% to {current}%")
        }
    }
}

fn predicted_impact(pattern_type: PatternType, current: f64) -> String {
    let high = match pattern_type {
        PatternType::ErrorRate => current >= 10.0,
        PatternType::Latency => current > 2000.0,
        PatternType::RateLimit => current > 5.0,
        PatternType::Auth => current > 2.0,
        PatternType::Availability => current > 5.0,
        PatternType::Webhook => current < 95.0,
    };
    let text = match (pattern_type, high) {
        (PatternType::ErrorRate, true) => "High user impact: integration calls are failing outright",
        (PatternType::ErrorRate, false) => "Moderate impact: users will see intermittent integration errors",
        (PatternType::Latency, true) => "High user impact: significant delays on integration calls",
        (PatternType::Latency, false) => "Moderate impact: noticeable slowdown on integration calls",
        (PatternType::RateLimit, true) => "High user impact: throttling is blocking a meaningful share of calls",
        (PatternType::RateLimit, false) => "Moderate impact: occasional calls delayed or dropped by throttling",
        (PatternType::Auth, true) => "High user impact: integration may lose access entirely",
        (PatternType::Auth, false) => "Moderate impact: sporadic authentication failures",
        (PatternType::Availability, true) => "High user impact: integration frequently unreachable",
        (PatternType::Availability, false) => "Moderate impact: intermittent timeouts on integration calls",
        (PatternType::Webhook, true) => "High user impact: inbound updates are being missed",
        (PatternType::Webhook, false) => "Moderate impact: some inbound updates delayed or retried",
    };
    text.to_string()
}

/// If one weekday carries more than 30% of auth failures, surface it; bursts
/// pinned to a day of the week usually track a token refresh schedule.
fn weekday_hint(failures: &[&IntegrationUsageRecord]) -> Option<String> {
    const DAYS: [&str; 7] = [
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
        "Sunday",
    ];
    if failures.is_empty() {
        return None;
    }
    let mut counts = [0usize; 7];
    for call in failures {
        counts[call.timestamp.weekday().num_days_from_monday() as usize] += 1;
    }
    let (day, &max) = counts.iter().enumerate().max_by_key(|(_, &count)| count)?;
    if max as f64 / failures.len() as f64 > 0.3 {
        Some(format!(
            " Most failures land on {}s, which may point at token refresh timing.",
            DAYS[day]
        ))
    } else {
        None
    }
}
