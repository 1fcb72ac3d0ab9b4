//! Customer-level alert rollup.

use chrono::{DateTime, Utc};

use crate::detect::{DegradationAlert, DegradationPattern, PatternType, Severity};
use crate::records::ParsedIntegrationData;

/// Fixed action catalog, checked in stable order. One line per pattern type
/// present, regardless of how many patterns share the type. Availability
/// patterns contribute no action line.
const ACTIONS: [(PatternType, &str); 5] = [
    (
        PatternType::RateLimit,
        "Reduce API call frequency or batch requests to stay inside the provider's rate limits",
    ),
    (
        PatternType::ErrorRate,
        "Check the provider's status page and review recent API errors for this integration",
    ),
    (
        PatternType::Latency,
        "Review payload sizes and consider tightening timeouts on slow integration calls",
    ),
    (
        PatternType::Auth,
        "Verify API credentials and the token refresh schedule before access is lost",
    ),
    (
        PatternType::Webhook,
        "Confirm the webhook endpoint is reachable and review recent delivery failures",
    ),
];

/// Roll a run's patterns up into at most one alert for the customer.
pub(crate) fn build(
    data: &ParsedIntegrationData,
    patterns: &[DegradationPattern],
    now: DateTime<Utc>,
) -> Option<DegradationAlert> {
    if patterns.is_empty() {
        return None;
    }

    let critical = patterns
        .iter()
        .filter(|p| p.severity == Severity::Critical)
        .count();
    let warning = patterns.len() - critical;
    let overall_severity = if critical > 0 {
        Severity::Critical
    } else {
        Severity::Warning
    };

    let summary = format!(
        "{}: {} critical degradation(s), {} warning(s) detected",
        data.customer_name, critical, warning
    );

    let recommended_actions = ACTIONS
        .iter()
        .filter(|(pattern_type, _)| patterns.iter().any(|p| p.pattern_type == *pattern_type))
        .map(|(_, action)| (*action).to_string())
        .collect();

    Some(DegradationAlert {
        id: format!("alert-{}", data.customer_id),
        customer_id: data.customer_id.clone(),
        customer_name: data.customer_name.clone(),
        patterns: patterns.to_vec(),
        overall_severity,
        summary,
        recommended_actions,
        created_at: now,
    })
}
