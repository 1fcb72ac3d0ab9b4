//! Input records handed to the engine by the upstream usage collector.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One logged API call against a third-party integration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationUsageRecord {
    pub timestamp: DateTime<Utc>,
    pub integration_name: String,
    pub status_code: u16,
    pub latency_ms: i64, // signed: upstream data is taken as-is, even when malformed
}

/// Outcome of one webhook delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookStatus {
    Delivered,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookDeliveryRecord {
    pub timestamp: DateTime<Utc>,
    pub status: WebhookStatus,
}

/// Everything the collector gathered for one customer, for one detection run.
///
/// The engine never mutates this; it is read once and discarded by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedIntegrationData {
    pub customer_id: String,
    pub customer_name: String,
    #[serde(default)]
    pub api_calls: Vec<IntegrationUsageRecord>,
    #[serde(default)]
    pub webhooks: Vec<WebhookDeliveryRecord>,
}
