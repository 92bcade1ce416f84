use foundation::Position;
use serde::{Deserialize, Serialize};

use crate::geolocation::{Geolocation, GeolocationError, PositionOptions};
use crate::platform::DeviceProfile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Worst accuracy (meters) still granted.
    pub max_accuracy_m: f64,
    pub timeout_ms: u64,
    pub max_age_ms: u64,
    pub high_accuracy: bool,
    /// Development shortcut: desktops are granted without asking the device.
    pub simulate_on_desktop: bool,
    /// Accuracy reported by the desktop shortcut.
    pub simulated_accuracy_m: f64,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            max_accuracy_m: 100.0,
            timeout_ms: 10_000,
            max_age_ms: 60_000,
            high_accuracy: true,
            simulate_on_desktop: false,
            simulated_accuracy_m: 10.0,
        }
    }
}

impl AccessConfig {
    pub fn position_options(&self) -> PositionOptions {
        PositionOptions {
            high_accuracy: self.high_accuracy,
            timeout_ms: self.timeout_ms,
            max_age_ms: self.max_age_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DenialReason {
    Unavailable,
    LowAccuracy { accuracy_m: f64, required_m: f64 },
    Platform { message: String },
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenialReason::Unavailable => write!(f, "Geolocation API not available"),
            DenialReason::LowAccuracy {
                accuracy_m,
                required_m,
            } => write!(f, "Accuracy too low: {accuracy_m}m (required: ≤{required_m}m)"),
            DenialReason::Platform { message } => write!(f, "{message}"),
        }
    }
}

/// Outcome of [`check_access`]. Failures are values, never errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "access", rename_all = "snake_case")]
pub enum AccessDecision {
    Granted {
        accuracy_m: f64,
        is_mobile: bool,
    },
    Denied {
        reason: DenialReason,
        accuracy_m: Option<f64>,
        is_mobile: bool,
        error_code: Option<u16>,
    },
}

impl AccessDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, AccessDecision::Granted { .. })
    }

    pub fn accuracy_m(&self) -> Option<f64> {
        match self {
            AccessDecision::Granted { accuracy_m, .. } => Some(*accuracy_m),
            AccessDecision::Denied { accuracy_m, .. } => *accuracy_m,
        }
    }

    pub fn reason(&self) -> Option<String> {
        match self {
            AccessDecision::Granted { .. } => None,
            AccessDecision::Denied { reason, .. } => Some(reason.to_string()),
        }
    }

    fn from_fix(fix: &Position, cfg: &AccessConfig, is_mobile: bool) -> Self {
        if fix.accuracy_m <= cfg.max_accuracy_m {
            AccessDecision::Granted {
                accuracy_m: fix.accuracy_m,
                is_mobile,
            }
        } else {
            AccessDecision::Denied {
                reason: DenialReason::LowAccuracy {
                    accuracy_m: fix.accuracy_m,
                    required_m: cfg.max_accuracy_m,
                },
                accuracy_m: Some(fix.accuracy_m),
                is_mobile,
                error_code: None,
            }
        }
    }

    fn from_error(err: GeolocationError, is_mobile: bool) -> Self {
        let error_code = err.code();
        let reason = match err {
            GeolocationError::Unavailable => DenialReason::Unavailable,
            other => DenialReason::Platform {
                message: other.to_string(),
            },
        };
        AccessDecision::Denied {
            reason,
            accuracy_m: None,
            is_mobile,
            error_code,
        }
    }
}

/// Asks the device for one fix and decides whether it is good enough to play.
pub async fn check_access(
    geo: &dyn Geolocation,
    cfg: &AccessConfig,
    device: DeviceProfile,
) -> AccessDecision {
    if cfg.simulate_on_desktop && !device.is_mobile {
        return AccessDecision::Granted {
            accuracy_m: cfg.simulated_accuracy_m,
            is_mobile: false,
        };
    }

    if !geo.is_available() {
        tracing::info!("geolocation access denied: api unavailable");
        return AccessDecision::from_error(GeolocationError::Unavailable, device.is_mobile);
    }

    let decision = match geo.current_position(cfg.position_options()).await {
        Ok(fix) => AccessDecision::from_fix(&fix, cfg, device.is_mobile),
        Err(err) => AccessDecision::from_error(err, device.is_mobile),
    };
    if let Some(reason) = decision.reason() {
        tracing::info!(%reason, "geolocation access denied");
    }
    decision
}
