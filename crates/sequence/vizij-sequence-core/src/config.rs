//! Core configuration for vizij-sequence-core.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SequenceError};
use crate::host::{ColorProperty, Space};

/// Scheduler sizing and authoring defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Duration (seconds) given to instructions authored without one.
    pub default_duration: f32,
    pub default_space: Space,
    /// Material color property faded when none is named.
    pub default_color_property: ColorProperty,

    /// Initial capacity hint for the job list.
    pub job_capacity: usize,

    /// Maximum events to retain per tick; overflow is logged and dropped.
    pub max_events_per_tick: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_duration: 1.0,
            default_space: Space::Local,
            default_color_property: ColorProperty::default(),
            job_capacity: 16,
            max_events_per_tick: 1024,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if !self.default_duration.is_finite() || self.default_duration < 0.0 {
            return Err(SequenceError::InvalidConfig {
                reason: format!(
                    "default_duration must be finite and >= 0 (got {})",
                    self.default_duration
                ),
            });
        }
        if self.default_color_property.as_str().is_empty() {
            return Err(SequenceError::InvalidConfig {
                reason: "default_color_property must not be empty".to_string(),
            });
        }
        if self.max_events_per_tick == 0 {
            return Err(SequenceError::InvalidConfig {
                reason: "max_events_per_tick must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_negative_duration_and_zero_event_cap() {
        let cfg = Config {
            default_duration: -1.0,
            ..Config::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(SequenceError::InvalidConfig { .. })
        ));

        let cfg = Config {
            max_events_per_tick: 0,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: Config = serde_json::from_str(r#"{ "default_duration": 0.25 }"#).unwrap();
        assert_eq!(cfg.default_duration, 0.25);
        assert_eq!(cfg.max_events_per_tick, 1024);
        assert_eq!(cfg.default_color_property.as_str(), "color");
    }
}
