use serde::{Deserialize, Serialize};

use crate::math::{LonLat, distance_meters};

/// A single location fix.
///
/// Positions are immutable snapshots: consumers replace the whole value and
/// never patch individual fields.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Radius of the confidence circle in meters.
    pub accuracy_m: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64, accuracy_m: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m: accuracy_m.max(0.0),
        }
    }

    pub fn lon_lat(&self) -> LonLat {
        LonLat::new(self.longitude, self.latitude)
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        distance_meters(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}
