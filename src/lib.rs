//! apipulse -- early-warning degradation detection for third-party API integrations.
//!
//! Feed one customer's recent integration call history in, get structured,
//! confidence-scored degradation patterns and a customer-level alert out.
//! The engine performs no I/O and keeps no state between runs; collecting
//! the records and delivering the alerts belong to the callers on either
//! side of it.

pub mod config;
pub mod detect;
pub mod records;

pub use config::{ConfigError, DetectionConfig, DimensionThresholds, Trigger};
pub use detect::engine::DetectionEngine;
pub use detect::{
    DegradationAlert, DegradationPattern, DetectionOutcome, PatternType, Severity, Trend,
    TrendPoint,
};
pub use records::{
    IntegrationUsageRecord, ParsedIntegrationData, WebhookDeliveryRecord, WebhookStatus,
};

/// Run degradation detection for one customer with the default thresholds.
pub fn detect_degradation(data: &ParsedIntegrationData) -> DetectionOutcome {
    DetectionEngine::with_defaults().run(data)
}
