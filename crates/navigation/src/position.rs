use foundation::{Millis, Position};
use runtime::{EventBus, Metrics};
use serde::{Deserialize, Serialize};

use crate::geolocation::{Geolocation, GeolocationError, PositionOptions, WatchId};
use crate::platform::DeviceProfile;
use crate::simulator::{Simulator, SimulatorConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub timeout_ms: u64,
    pub max_age_ms: u64,
    pub high_accuracy: bool,
    /// Desktops get the simulator instead of a hardware watch.
    pub simulate_on_desktop: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_age_ms: 5_000,
            high_accuracy: true,
            simulate_on_desktop: true,
        }
    }
}

impl TrackingConfig {
    pub fn watch_options(&self) -> PositionOptions {
        PositionOptions {
            high_accuracy: self.high_accuracy,
            timeout_ms: self.timeout_ms,
            max_age_ms: self.max_age_ms,
        }
    }

    pub fn plan(&self, device: DeviceProfile) -> TrackingPlan {
        if device.is_mobile || !self.simulate_on_desktop {
            TrackingPlan::Watch
        } else {
            TrackingPlan::Simulate
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum TrackingPlan {
    Watch,
    Simulate,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum PositionState {
    Idle,
    Watching(WatchId),
    Simulating,
}

/// Owner of the current device position.
///
/// Every accepted update replaces the current position and is emitted on
/// [`PositionService::positions`], so all subscribers see every update.
#[derive(Debug)]
pub struct PositionService {
    tracking: TrackingConfig,
    state: PositionState,
    current: Option<Position>,
    last_error: Option<GeolocationError>,
    simulator: Simulator,
    pub positions: EventBus<Position>,
    metrics: Metrics,
}

impl PositionService {
    pub fn new(tracking: TrackingConfig, simulator: SimulatorConfig) -> Self {
        Self {
            tracking,
            state: PositionState::Idle,
            current: None,
            last_error: None,
            simulator: Simulator::new(simulator),
            positions: EventBus::new(),
            metrics: Metrics::new(),
        }
    }

    pub fn state(&self) -> PositionState {
        self.state
    }

    pub fn current(&self) -> Option<Position> {
        self.current
    }

    pub fn last_error(&self) -> Option<&GeolocationError> {
        self.last_error.as_ref()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn tracking_config(&self) -> &TrackingConfig {
        &self.tracking
    }

    pub fn simulator_config(&self) -> &SimulatorConfig {
        self.simulator.config()
    }

    pub fn plan(&self, device: DeviceProfile) -> TrackingPlan {
        self.tracking.plan(device)
    }

    /// Installs a hardware watch. Already watching is a no-op; a running
    /// simulation is stopped first.
    pub fn watch(&mut self, geo: &mut dyn Geolocation) -> Result<WatchId, GeolocationError> {
        match self.state {
            PositionState::Watching(id) => return Ok(id),
            PositionState::Simulating => self.stop_simulation(),
            PositionState::Idle => {}
        }
        let id = geo.watch_position(self.tracking.watch_options())?;
        self.state = PositionState::Watching(id);
        self.last_error = None;
        tracing::info!(watch = id.0, "position tracking started");
        Ok(id)
    }

    /// Feeds a fix from the hardware watch. Fixes arriving without an active
    /// watch are ignored and return `false`.
    pub fn handle_fix(&mut self, fix: Position) -> bool {
        if !matches!(self.state, PositionState::Watching(_)) {
            tracing::debug!("dropping fix without an active watch");
            return false;
        }
        self.publish(fix);
        true
    }

    /// Watch errors do not cancel the watch; the platform keeps retrying.
    pub fn handle_watch_error(&mut self, err: GeolocationError) {
        tracing::warn!(error = %err, "position watch error");
        self.metrics.increment("position.watch_errors");
        self.last_error = Some(err);
    }

    /// Starts the simulator and publishes its first position immediately.
    ///
    /// The seed comes from `seed` (a coarse fix), else the last known
    /// position, else the configured fallback. Returns whether a simulation
    /// is running after the call; an active hardware watch is left alone.
    pub fn begin_simulation(&mut self, seed: Option<Position>, now: Millis) -> bool {
        match self.state {
            PositionState::Simulating => return true,
            PositionState::Watching(_) => {
                tracing::warn!("simulation refused while a hardware watch is active");
                return false;
            }
            PositionState::Idle => {}
        }
        let seed = seed
            .or(self.current)
            .unwrap_or_else(|| self.simulator.config().fallback());
        let first = self.simulator.start(seed, now);
        self.state = PositionState::Simulating;
        tracing::info!(
            lat = first.latitude,
            lon = first.longitude,
            "position simulation started"
        );
        self.publish(first);
        true
    }

    /// Advances the simulator; returns whether an update was published.
    pub fn tick(&mut self, now: Millis) -> bool {
        if self.state != PositionState::Simulating {
            return false;
        }
        let Some(p) = self.simulator.tick(now) else {
            return false;
        };
        tracing::debug!(lat = p.latitude, lon = p.longitude, "simulated position");
        self.publish(p);
        true
    }

    pub fn poll_at(&self) -> Option<Millis> {
        match self.state {
            PositionState::Simulating => self.simulator.next_deadline(),
            _ => None,
        }
    }

    /// Clears the hardware watch and forgets the cached position. Idempotent.
    pub fn stop_tracking(&mut self, geo: &mut dyn Geolocation) {
        if let PositionState::Watching(id) = self.state {
            geo.clear_watch(id);
            self.state = PositionState::Idle;
            tracing::info!(watch = id.0, "position tracking stopped");
        }
        self.current = None;
    }

    /// Cancels the simulator timer. Idempotent.
    pub fn stop_simulation(&mut self) {
        if self.state == PositionState::Simulating {
            self.simulator.stop();
            self.state = PositionState::Idle;
            tracing::info!("position simulation stopped");
        }
    }

    fn publish(&mut self, p: Position) {
        self.current = Some(p);
        self.metrics.increment("position.updates");
        self.positions.emit(&p);
    }
}

#[cfg(test)]
mod tests {
    use super::{PositionService, PositionState, TrackingConfig, TrackingPlan};
    use crate::geolocation::GeolocationError;
    use crate::mock::MockGeolocation;
    use crate::platform::DeviceProfile;
    use crate::simulator::SimulatorConfig;
    use foundation::{Millis, Position};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn service() -> PositionService {
        PositionService::new(
            TrackingConfig::default(),
            SimulatorConfig {
                rng_seed: Some(1),
                ..SimulatorConfig::default()
            },
        )
    }

    #[test]
    fn plan_follows_device() {
        let svc = service();
        assert_eq!(svc.plan(DeviceProfile::MOBILE), TrackingPlan::Watch);
        assert_eq!(svc.plan(DeviceProfile::DESKTOP), TrackingPlan::Simulate);
        let cfg = TrackingConfig {
            simulate_on_desktop: false,
            ..TrackingConfig::default()
        };
        assert_eq!(cfg.plan(DeviceProfile::DESKTOP), TrackingPlan::Watch);
    }

    #[test]
    fn every_subscriber_sees_every_fix() {
        let mut svc = service();
        let mut geo = MockGeolocation::new();
        let map_seen = Rc::new(RefCell::new(Vec::new()));
        let store_seen = Rc::new(RefCell::new(0usize));
        {
            let map_seen = map_seen.clone();
            svc.positions.subscribe(move |p| map_seen.borrow_mut().push(*p));
        }
        {
            let store_seen = store_seen.clone();
            svc.positions.subscribe(move |_| *store_seen.borrow_mut() += 1);
        }

        svc.watch(&mut geo).expect("watch");
        let opts = geo.active_watches()[0].1;
        assert!(opts.high_accuracy);
        assert_eq!((opts.timeout_ms, opts.max_age_ms), (10_000, 5_000));

        assert!(svc.handle_fix(Position::new(50.69, 16.62, 8.0)));
        assert!(svc.handle_fix(Position::new(50.70, 16.63, 6.0)));
        assert_eq!(map_seen.borrow().len(), 2);
        assert_eq!(*store_seen.borrow(), 2);
        assert_eq!(svc.current(), Some(Position::new(50.70, 16.63, 6.0)));
    }

    #[test]
    fn watch_is_idempotent_and_stop_clears() {
        let mut svc = service();
        let mut geo = MockGeolocation::new();
        let a = svc.watch(&mut geo).expect("watch");
        let b = svc.watch(&mut geo).expect("watch");
        assert_eq!(a, b);
        assert_eq!(geo.active_watches().len(), 1);

        svc.handle_fix(Position::new(1.0, 2.0, 3.0));
        svc.stop_tracking(&mut geo);
        svc.stop_tracking(&mut geo);
        assert_eq!(svc.state(), PositionState::Idle);
        assert!(svc.current().is_none());
        assert!(geo.active_watches().is_empty());
        assert!(!svc.handle_fix(Position::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn watch_errors_are_recorded_not_fatal() {
        let mut svc = service();
        let mut geo = MockGeolocation::new();
        svc.watch(&mut geo).expect("watch");
        svc.handle_watch_error(GeolocationError::from_code(3, "Timeout expired"));
        assert!(matches!(svc.state(), PositionState::Watching(_)));
        assert_eq!(svc.last_error().and_then(|e| e.code()), Some(3));
        assert_eq!(svc.metrics().counter("position.watch_errors"), 1);
    }

    #[test]
    fn watch_fails_without_api() {
        let mut svc = service();
        let mut geo = MockGeolocation::unavailable();
        assert_eq!(svc.watch(&mut geo), Err(GeolocationError::Unavailable));
        assert_eq!(svc.state(), PositionState::Idle);
    }

    #[test]
    fn simulation_falls_back_and_publishes_immediately() {
        let mut svc = service();
        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let seen = seen.clone();
            svc.positions.subscribe(move |p: &Position| seen.borrow_mut().push(*p));
        }
        assert!(svc.begin_simulation(None, Millis(0)));
        assert_eq!(seen.borrow()[0], Position::new(50.5, 19.5, 10.0));
        assert_eq!(svc.poll_at(), Some(Millis(15_000)));

        assert!(svc.tick(Millis(15_000)));
        assert!(!svc.tick(Millis(20_000)));
        assert_eq!(seen.borrow().len(), 2);

        assert!(svc.begin_simulation(None, Millis(20_000)));
        assert_eq!(seen.borrow().len(), 2);

        svc.stop_simulation();
        svc.stop_simulation();
        assert!(!svc.tick(Millis(90_000)));
        assert!(svc.poll_at().is_none());
    }

    #[test]
    fn simulation_prefers_seed_fix() {
        let mut svc = service();
        svc.begin_simulation(Some(Position::new(52.2, 21.0, 1500.0)), Millis(0));
        let current = svc.current().expect("position");
        assert_eq!((current.latitude, current.longitude), (52.2, 21.0));
        assert_eq!(current.accuracy_m, 10.0);
    }

    #[test]
    fn watch_replaces_simulation() {
        let mut svc = service();
        let mut geo = MockGeolocation::new();
        svc.begin_simulation(None, Millis(0));
        svc.watch(&mut geo).expect("watch");
        assert!(matches!(svc.state(), PositionState::Watching(_)));
        assert!(!svc.tick(Millis(60_000)));
        assert!(!svc.begin_simulation(None, Millis(60_000)));
    }
}
