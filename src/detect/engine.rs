//! Orchestrates every detector over one customer's history.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::{DetectionConfig, DimensionThresholds};
use crate::detect::detector::{self, UsageDimension};
use crate::detect::{alert, DegradationPattern, DetectionOutcome};
use crate::records::{IntegrationUsageRecord, ParsedIntegrationData};

/// Stateless detection engine: configuration in, patterns and alerts out.
pub struct DetectionEngine {
    config: DetectionConfig,
}

impl DetectionEngine {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(DetectionConfig::default())
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Run all detectors for one customer, stamping outputs with the current
    /// wall-clock time.
    pub fn run(&self, data: &ParsedIntegrationData) -> DetectionOutcome {
        self.run_at(data, Utc::now())
    }

    /// Run all detectors with an explicit reference time. The run is a pure
    /// function of `data` and `now`: identical inputs produce identical
    /// output, pattern ids included.
    pub fn run_at(&self, data: &ParsedIntegrationData, now: DateTime<Utc>) -> DetectionOutcome {
        let mut patterns: Vec<DegradationPattern> = Vec::new();

        // Group calls per integration. A sorted map keeps grouping order,
        // and with it `deg-N` id assignment, independent of arrival order.
        let mut by_integration: BTreeMap<&str, Vec<&IntegrationUsageRecord>> = BTreeMap::new();
        for call in &data.api_calls {
            by_integration
                .entry(call.integration_name.as_str())
                .or_default()
                .push(call);
        }

        for (integration, calls) in &by_integration {
            for dimension in UsageDimension::ALL {
                if let Some(pattern) = detector::detect_usage_dimension(
                    dimension,
                    integration,
                    calls,
                    self.thresholds_for(dimension),
                    self.config.window_count,
                    patterns.len() + 1,
                    now,
                ) {
                    debug!(
                        integration = %integration,
                        pattern_type = %pattern.pattern_type,
                        severity = %pattern.severity,
                        "Degradation pattern detected"
                    );
                    patterns.push(pattern);
                }
            }
        }

        if !data.webhooks.is_empty() {
            if let Some(pattern) = detector::detect_webhook_dimension(
                &data.webhooks,
                &self.config.webhook,
                self.config.window_count,
                patterns.len() + 1,
                now,
            ) {
                debug!(
                    severity = %pattern.severity,
                    "Webhook delivery degradation detected"
                );
                patterns.push(pattern);
            }
        }

        let alerts: Vec<_> = alert::build(data, &patterns, now).into_iter().collect();
        info!(
            customer = %data.customer_name,
            patterns = patterns.len(),
            alerts = alerts.len(),
            "Degradation scan complete"
        );
        DetectionOutcome { patterns, alerts }
    }

    /// Runs never share state, so a batch of customers fans out across the
    /// rayon pool with no coordination.
    pub fn run_batch(&self, customers: &[ParsedIntegrationData]) -> Vec<DetectionOutcome> {
        customers.par_iter().map(|data| self.run(data)).collect()
    }

    fn thresholds_for(&self, dimension: UsageDimension) -> &DimensionThresholds {
        match dimension {
            UsageDimension::ErrorRate => &self.config.error_rate,
            UsageDimension::Latency => &self.config.latency,
            UsageDimension::RateLimit => &self.config.rate_limit,
            UsageDimension::Auth => &self.config.auth,
            UsageDimension::Timeout => &self.config.timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{WebhookDeliveryRecord, WebhookStatus};
    use chrono::TimeZone;

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap() + chrono::Duration::minutes(minute)
    }

    fn failing_calls(integration: &str, n: usize) -> Vec<IntegrationUsageRecord> {
        // Clean first half, 10% server errors in the second half.
        (0..n)
            .map(|i| IntegrationUsageRecord {
                timestamp: at(i as i64),
                integration_name: integration.to_string(),
                status_code: if i >= n / 2 && i % 10 == 0 { 500 } else { 200 },
                latency_ms: 150,
            })
            .collect()
    }

    #[test]
    fn test_ids_are_sequential_across_integrations() {
        let mut api_calls = failing_calls("hubspot", 200);
        api_calls.extend(failing_calls("salesforce", 200));
        let data = ParsedIntegrationData {
            customer_id: "cus_1".to_string(),
            customer_name: "Acme Corp".to_string(),
            api_calls,
            webhooks: Vec::new(),
        };

        let outcome = DetectionEngine::with_defaults().run_at(&data, at(500));
        assert_eq!(outcome.patterns.len(), 2);
        assert_eq!(outcome.patterns[0].id, "deg-1");
        assert_eq!(outcome.patterns[0].integration_name, "hubspot");
        assert_eq!(outcome.patterns[1].id, "deg-2");
        assert_eq!(outcome.patterns[1].integration_name, "salesforce");
        assert_eq!(outcome.alerts.len(), 1);
    }

    #[test]
    fn test_grouping_is_arrival_order_independent() {
        let mut api_calls = failing_calls("salesforce", 200);
        api_calls.extend(failing_calls("hubspot", 200));
        let data = ParsedIntegrationData {
            customer_id: "cus_1".to_string(),
            customer_name: "Acme Corp".to_string(),
            api_calls,
            webhooks: Vec::new(),
        };

        let outcome = DetectionEngine::with_defaults().run_at(&data, at(500));
        // hubspot still sorts first despite arriving second.
        assert_eq!(outcome.patterns[0].integration_name, "hubspot");
    }

    #[test]
    fn test_webhook_detector_skipped_without_webhooks() {
        let data = ParsedIntegrationData {
            customer_id: "cus_1".to_string(),
            customer_name: "Acme Corp".to_string(),
            api_calls: Vec::new(),
            webhooks: Vec::new(),
        };
        let outcome = DetectionEngine::with_defaults().run_at(&data, at(0));
        assert!(outcome.patterns.is_empty());
        assert!(outcome.alerts.is_empty());
    }

    #[test]
    fn test_webhook_pattern_appended_after_api_patterns() {
        let webhooks: Vec<WebhookDeliveryRecord> = (0..400)
            .map(|i| {
                let delivered = match i / 100 {
                    0 | 1 | 2 => i % 100 >= 1, // 99%
                    _ => i % 100 >= 10,        // 90%
                };
                WebhookDeliveryRecord {
                    timestamp: at(i as i64),
                    status: if delivered {
                        WebhookStatus::Delivered
                    } else {
                        WebhookStatus::Failed
                    },
                }
            })
            .collect();
        let data = ParsedIntegrationData {
            customer_id: "cus_1".to_string(),
            customer_name: "Acme Corp".to_string(),
            api_calls: failing_calls("hubspot", 200),
            webhooks,
        };

        let outcome = DetectionEngine::with_defaults().run_at(&data, at(500));
        assert_eq!(outcome.patterns.len(), 2);
        assert_eq!(outcome.patterns[1].id, "deg-2");
        assert_eq!(
            outcome.patterns[1].pattern_type,
            crate::detect::PatternType::Webhook
        );
    }

    #[test]
    fn test_run_batch_matches_individual_runs() {
        let customers: Vec<ParsedIntegrationData> = (0..4)
            .map(|i| ParsedIntegrationData {
                customer_id: format!("cus_{i}"),
                customer_name: format!("Customer {i}"),
                api_calls: failing_calls("hubspot", 200),
                webhooks: Vec::new(),
            })
            .collect();

        let engine = DetectionEngine::with_defaults();
        let outcomes = engine.run_batch(&customers);
        assert_eq!(outcomes.len(), 4);
        for (customer, outcome) in customers.iter().zip(&outcomes) {
            let solo = engine.run_at(customer, at(500));
            assert_eq!(solo.patterns.len(), outcome.patterns.len());
            assert_eq!(solo.patterns[0].id, outcome.patterns[0].id);
        }
    }
}
