use formats::PlaceSearchConfig;
use foundation::math::LonLat;
use navigation::{AccessConfig, OrientationConfig, SimulatorConfig, TrackingConfig};
use serde::{Deserialize, Serialize};
use view::{AnimatorConfig, FlightConfig};

use crate::window::WindowConfig;

#[derive(Debug)]
pub enum ConfigError {
    Json(serde_json::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Json(e) => write!(f, "config parse error: {e}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Json(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

/// Every tunable of the session, loadable from a partial JSON document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub access: AccessConfig,
    pub tracking: TrackingConfig,
    pub simulator: SimulatorConfig,
    pub orientation: OrientationConfig,
    pub animator: AnimatorConfig,
    pub flight: FlightConfig,
    pub window: WindowConfig,
    pub search: PlaceSearchConfig,
    /// Compass target for the heading arrow.
    pub target: Option<LonLat>,
}

impl AppConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let cfg: AppConfig = serde_json::from_str(json).map_err(ConfigError::Json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.access.max_accuracy_m > 0.0) {
            return Err(ConfigError::Invalid(
                "access.max_accuracy_m must be positive".to_string(),
            ));
        }
        if self.simulator.interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "simulator.interval_ms must be non-zero".to_string(),
            ));
        }
        if self.flight.waypoint_count == 0 {
            return Err(ConfigError::Invalid(
                "flight.waypoint_count must be non-zero".to_string(),
            ));
        }
        if self.animator.min_zoom > self.animator.max_zoom {
            return Err(ConfigError::Invalid(
                "animator.min_zoom exceeds max_zoom".to_string(),
            ));
        }
        Ok(())
    }
}
