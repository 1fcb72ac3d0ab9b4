//! Detection thresholds and windowing configuration.
//!
//! Every numeric cutoff the detectors use lives here so deployments can tune
//! individual dimensions without touching detection code. The built-in
//! defaults are the shipped behavior.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// One firing rule evaluated against a window trend.
///
/// Rules compare the raw (unrounded) baseline/current/change-percent values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// Relative growth or an absolute level, whichever crosses first.
    GrowthOrLevel { change_pct: f64, level: f64 },
    /// Current at or above a floor while clearly above baseline.
    SurgeAboveBaseline { floor: f64, factor: f64 },
    /// Current strictly above a ceiling.
    Exceeds { value: f64 },
    /// Current below a ceiling while clearly below baseline.
    SagBelowBaseline { ceiling: f64, margin: f64 },
    /// Current strictly below a floor.
    FallsBelow { value: f64 },
}

impl Trigger {
    pub fn fires(&self, baseline: f64, current: f64, change_percent: f64) -> bool {
        match *self {
            Trigger::GrowthOrLevel { change_pct, level } => {
                change_percent >= change_pct || current >= level
            }
            Trigger::SurgeAboveBaseline { floor, factor } => {
                current >= floor && current > baseline * factor
            }
            Trigger::Exceeds { value } => current > value,
            Trigger::SagBelowBaseline { ceiling, margin } => {
                current < ceiling && current < baseline - margin
            }
            Trigger::FallsBelow { value } => current < value,
        }
    }
}

/// Sample floor plus the warning/critical rules for one dimension.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DimensionThresholds {
    /// Minimum applicable records before the dimension is evaluated at all.
    pub min_samples: usize,
    pub warning: Trigger,
    pub critical: Trigger,
}

/// Full engine configuration: window count plus thresholds per dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Number of windows the sorted history is split into. The first two
    /// windows form the baseline, the last one is "current".
    pub window_count: usize,
    pub error_rate: DimensionThresholds,
    pub latency: DimensionThresholds,
    pub rate_limit: DimensionThresholds,
    pub auth: DimensionThresholds,
    pub timeout: DimensionThresholds,
    pub webhook: DimensionThresholds,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            window_count: 4,
            error_rate: DimensionThresholds {
                min_samples: 100,
                warning: Trigger::GrowthOrLevel {
                    change_pct: 50.0,
                    level: 5.0,
                },
                critical: Trigger::GrowthOrLevel {
                    change_pct: 100.0,
                    level: 10.0,
                },
            },
            latency: DimensionThresholds {
                min_samples: 100,
                warning: Trigger::GrowthOrLevel {
                    change_pct: 50.0,
                    level: 1000.0,
                },
                critical: Trigger::GrowthOrLevel {
                    change_pct: 100.0,
                    level: 2000.0,
                },
            },
            rate_limit: DimensionThresholds {
                min_samples: 10,
                warning: Trigger::SurgeAboveBaseline {
                    floor: 1.0,
                    factor: 1.2,
                },
                critical: Trigger::Exceeds { value: 5.0 },
            },
            auth: DimensionThresholds {
                min_samples: 5,
                warning: Trigger::SurgeAboveBaseline {
                    floor: 0.5,
                    factor: 1.0,
                },
                critical: Trigger::Exceeds { value: 2.0 },
            },
            timeout: DimensionThresholds {
                min_samples: 10,
                warning: Trigger::SurgeAboveBaseline {
                    floor: 1.0,
                    factor: 1.0,
                },
                critical: Trigger::Exceeds { value: 5.0 },
            },
            webhook: DimensionThresholds {
                min_samples: 50,
                warning: Trigger::SagBelowBaseline {
                    ceiling: 98.0,
                    margin: 1.0,
                },
                critical: Trigger::FallsBelow { value: 95.0 },
            },
        }
    }
}

impl DetectionConfig {
    /// Parse a TOML document. Missing fields fall back to the defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Load config from a TOML file, surfacing read and parse failures.
    pub fn try_load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid detection config at {}", path.display()))
    }

    /// Load config from a TOML file, falling back to built-in defaults if
    /// the file is missing or invalid.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Detection config unusable. Using defaults.");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_window_count_is_four() {
        assert_eq!(DetectionConfig::default().window_count, 4);
    }

    #[test]
    fn test_default_error_rate_thresholds() {
        let config = DetectionConfig::default();
        assert_eq!(config.error_rate.min_samples, 100);
        assert!(config.error_rate.warning.fires(2.0, 5.0, 0.0)); // absolute level
        assert!(config.error_rate.warning.fires(2.0, 3.0, 50.0)); // relative growth
        assert!(!config.error_rate.warning.fires(2.0, 2.5, 25.0));
    }

    #[test]
    fn test_webhook_sag_boundary_does_not_fire() {
        let config = DetectionConfig::default();
        // Exactly 98.0 delivered against a 99.0 baseline: neither clause holds.
        assert!(!config.webhook.warning.fires(99.0, 98.0, -1.0));
        assert!(config.webhook.warning.fires(99.0, 97.9, -1.1));
        assert!(config.webhook.critical.fires(99.0, 94.9, -4.1));
        assert!(!config.webhook.critical.fires(99.0, 95.0, -4.0));
    }

    #[test]
    fn test_surge_requires_both_clauses() {
        let trigger = Trigger::SurgeAboveBaseline {
            floor: 1.0,
            factor: 1.2,
        };
        assert!(trigger.fires(1.0, 1.5, 50.0));
        assert!(!trigger.fires(2.0, 1.5, -25.0)); // floor met, not above baseline
        assert!(!trigger.fires(0.1, 0.5, 400.0)); // above baseline, under floor
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let raw = r#"
            window_count = 6

            [latency]
            min_samples = 50
            warning = { kind = "growth_or_level", change_pct = 25.0, level = 500.0 }
            critical = { kind = "growth_or_level", change_pct = 75.0, level = 1500.0 }
        "#;
        let config = DetectionConfig::from_toml_str(raw).unwrap();
        assert_eq!(config.window_count, 6);
        assert_eq!(config.latency.min_samples, 50);
        // Untouched dimensions keep shipped defaults.
        assert_eq!(config.error_rate.min_samples, 100);
        assert_eq!(config.webhook.min_samples, 50);
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let config = DetectionConfig::load("does/not/exist.toml");
        assert_eq!(config.window_count, 4);
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "window_count = 8").unwrap();
        let config = DetectionConfig::load(file.path());
        assert_eq!(config.window_count, 8);
    }

    #[test]
    fn test_try_load_surfaces_parse_errors() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "window_count = \"not a number\"").unwrap();
        assert!(DetectionConfig::try_load(file.path()).is_err());
    }
}
