use foundation::Position;
use foundation::math::{LonLat, bearing, normalize_degrees};
use runtime::{EventBus, Metrics};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventFamily {
    DeviceOrientationAbsolute,
    DeviceOrientation,
}

impl EventFamily {
    pub const ALL: [EventFamily; 2] = [
        EventFamily::DeviceOrientationAbsolute,
        EventFamily::DeviceOrientation,
    ];

    pub fn event_name(self) -> &'static str {
        match self {
            EventFamily::DeviceOrientationAbsolute => "deviceorientationabsolute",
            EventFamily::DeviceOrientation => "deviceorientation",
        }
    }
}

/// Raw orientation payload as delivered by the platform.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrientationEvent {
    pub family: EventFamily,
    pub webkit_compass_heading: Option<f64>,
    pub alpha: Option<f64>,
    pub absolute: bool,
}

/// The payload shapes we know how to read a heading from, in precedence order.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum OrientationShape {
    /// Vendor compass heading, already clockwise from north.
    VendorCompass(f64),
    /// Absolute alpha (counter-clockwise from north).
    AbsoluteAlpha(f64),
    /// Alpha relative to an arbitrary start frame.
    RelativeAlpha(f64),
    Unresolved,
}

impl OrientationShape {
    pub fn parse(ev: &OrientationEvent) -> Self {
        if let Some(h) = ev.webkit_compass_heading {
            return OrientationShape::VendorCompass(h);
        }
        match ev.alpha {
            Some(a) if ev.absolute => OrientationShape::AbsoluteAlpha(a),
            Some(a) => OrientationShape::RelativeAlpha(a),
            None => OrientationShape::Unresolved,
        }
    }

    /// Heading in `[0, 360)` clockwise from north, or `None` when the shape
    /// carries no usable number.
    pub fn heading(self, accept_relative_alpha: bool) -> Option<f64> {
        let raw = match self {
            OrientationShape::VendorCompass(h) => h,
            OrientationShape::AbsoluteAlpha(a) => 360.0 - a,
            OrientationShape::RelativeAlpha(a) if accept_relative_alpha => 360.0 - a,
            OrientationShape::RelativeAlpha(_) | OrientationShape::Unresolved => return None,
        };
        raw.is_finite().then(|| normalize_degrees(raw))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct HeadingSample {
    pub heading_deg: f64,
    pub bearing_deg: Option<f64>,
    pub arrow_angle_deg: Option<f64>,
}

/// Rotation for an arrow pointing from `heading` toward `bearing`.
pub fn arrow_angle(bearing_deg: f64, heading_deg: f64) -> f64 {
    (bearing_deg - heading_deg + 360.0) % 360.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationConfig {
    /// Use non-absolute alpha when nothing better is available. Such headings
    /// are relative to the device's start frame, not to north.
    pub accept_relative_alpha: bool,
}

impl Default for OrientationConfig {
    fn default() -> Self {
        Self {
            accept_relative_alpha: true,
        }
    }
}

/// Platform side of orientation listening.
pub trait OrientationSource {
    fn add_listener(&mut self, family: EventFamily);
    fn remove_listener(&mut self, family: EventFamily);
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub enum TrackerState {
    Inactive,
    Active { target: Option<LonLat> },
}

/// Compass arrow state: device heading plus bearing toward a target.
#[derive(Debug)]
pub struct OrientationTracker {
    config: OrientationConfig,
    state: TrackerState,
    heading: Option<f64>,
    bearing: Option<f64>,
    pub headings: EventBus<HeadingSample>,
    metrics: Metrics,
}

impl OrientationTracker {
    pub fn new(config: OrientationConfig) -> Self {
        Self {
            config,
            state: TrackerState::Inactive,
            heading: None,
            bearing: None,
            headings: EventBus::new(),
            metrics: Metrics::new(),
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, TrackerState::Active { .. })
    }

    pub fn heading(&self) -> Option<f64> {
        self.heading
    }

    pub fn bearing(&self) -> Option<f64> {
        self.bearing
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Registers one listener per event family. No-op while active.
    pub fn start(&mut self, target: Option<LonLat>, source: &mut dyn OrientationSource) -> bool {
        if self.is_active() {
            return false;
        }
        for family in EventFamily::ALL {
            source.add_listener(family);
        }
        self.state = TrackerState::Active { target };
        tracing::debug!(?target, "heading tracking started");
        true
    }

    /// Processes one platform event.
    ///
    /// Returns the computed sample when the event carried a heading. Subscribers
    /// are only notified when both a position and a target are known.
    pub fn handle_event(
        &mut self,
        ev: &OrientationEvent,
        current: Option<&Position>,
    ) -> Option<HeadingSample> {
        let TrackerState::Active { target } = self.state else {
            return None;
        };
        let Some(heading) = OrientationShape::parse(ev).heading(self.config.accept_relative_alpha)
        else {
            self.metrics.increment("orientation.dropped");
            return None;
        };
        self.heading = Some(heading);

        let (Some(position), Some(target)) = (current, target) else {
            return Some(HeadingSample {
                heading_deg: heading,
                bearing_deg: None,
                arrow_angle_deg: None,
            });
        };

        let brg = bearing(position.lon_lat(), target);
        self.bearing = Some(brg);
        let sample = HeadingSample {
            heading_deg: heading,
            bearing_deg: Some(brg),
            arrow_angle_deg: Some(arrow_angle(brg, heading)),
        };
        self.headings.emit(&sample);
        Some(sample)
    }

    /// Removes listeners and forgets heading, bearing and subscribers. Idempotent.
    pub fn stop(&mut self, source: &mut dyn OrientationSource) {
        if self.is_active() {
            for family in EventFamily::ALL {
                source.remove_listener(family);
            }
            tracing::debug!("heading tracking stopped");
        }
        self.state = TrackerState::Inactive;
        self.heading = None;
        self.bearing = None;
        self.headings.clear();
    }
}
