use std::f64::consts::TAU;

use foundation::Millis;
use foundation::math::{LonLat, Vec2, mercator};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::config::FlightConfig;
use crate::view::{CameraAnimation, MapView};

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct FlightWaypoint {
    pub center: Vec2,
    pub zoom: f64,
    pub duration_ms: u64,
}

/// Generates one loop of waypoints around `cfg.center`.
///
/// Angles are evenly spaced with up to a quarter step of noise either way, so
/// consecutive waypoints keep circling in the same direction.
pub fn generate_plan(cfg: &FlightConfig, rng: &mut StdRng) -> Vec<FlightWaypoint> {
    let n = cfg.waypoint_count.max(1);
    let step = TAU / n as f64;
    let (r_min, r_max) = ordered(cfg.radius_min_deg, cfg.radius_max_deg);
    let (d_min, d_max) = ordered(cfg.duration_min_ms, cfg.duration_max_ms);

    (0..n)
        .map(|i| {
            let angle = i as f64 * step + rng.gen_range(-0.25..=0.25) * step;
            let radius = rng.gen_range(r_min..=r_max);
            let at = LonLat::new(
                cfg.center.lon + radius * angle.cos(),
                cfg.center.lat + radius * angle.sin(),
            );
            let zoom = cfg.base_zoom + rng.gen_range(-1.0..=1.0) * cfg.zoom_jitter;
            FlightWaypoint {
                center: mercator::from_lon_lat(at),
                zoom,
                duration_ms: rng.gen_range(d_min..=d_max).max(1),
            }
        })
        .collect()
}

fn ordered<T: PartialOrd>(a: T, b: T) -> (T, T) {
    if a <= b { (a, b) } else { (b, a) }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub enum FlightState {
    Stopped,
    Scheduled { at: Millis },
    Moving { index: usize, anim: CameraAnimation },
    Pausing { index: usize, until: Millis },
}

/// Ambient camera loop through a generated plan.
#[derive(Debug)]
pub struct Flight {
    config: FlightConfig,
    rng: StdRng,
    plan: Vec<FlightWaypoint>,
    state: FlightState,
    legs_started: u64,
}

impl Flight {
    pub fn new(config: FlightConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng,
            plan: Vec::new(),
            state: FlightState::Stopped,
            legs_started: 0,
        }
    }

    pub fn state(&self) -> FlightState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != FlightState::Stopped
    }

    pub fn plan(&self) -> &[FlightWaypoint] {
        &self.plan
    }

    /// Total number of waypoint legs started over the flight's lifetime.
    pub fn legs_started(&self) -> u64 {
        self.legs_started
    }

    /// Arms the flight to begin at `at`. No-op (returns false) if already active.
    pub fn schedule(&mut self, at: Millis) -> bool {
        if self.is_active() {
            return false;
        }
        self.state = FlightState::Scheduled { at };
        tracing::debug!(at = at.0, "flight scheduled");
        true
    }

    /// Starts immediately with a fresh plan. No-op (returns false) if already active.
    pub fn start(&mut self, now: Millis, view: &MapView) -> bool {
        if self.is_active() {
            return false;
        }
        self.launch(now, view);
        true
    }

    /// Cancels any pending pause or in-flight camera move. Idempotent.
    pub fn stop(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.state = FlightState::Stopped;
        tracing::info!("flight stopped");
        true
    }

    /// Next wake-up that is not driven by animation frames.
    pub fn next_deadline(&self) -> Option<Millis> {
        match self.state {
            FlightState::Scheduled { at } => Some(at),
            FlightState::Pausing { until, .. } => Some(until),
            FlightState::Stopped | FlightState::Moving { .. } => None,
        }
    }

    pub fn is_moving(&self) -> bool {
        matches!(self.state, FlightState::Moving { .. })
    }

    /// Advances the loop to `now`, writing the camera into `view`.
    ///
    /// Phase boundaries are chained on their own deadlines, so a late tick
    /// replays the missed legs instead of bunching them up. Returns whether
    /// the view moved.
    pub fn tick(&mut self, now: Millis, view: &mut MapView) -> bool {
        let mut moved = false;
        loop {
            match self.state {
                FlightState::Stopped => return moved,
                FlightState::Scheduled { at } => {
                    if now < at {
                        return moved;
                    }
                    self.launch(now, view);
                }
                FlightState::Moving { index, anim } => {
                    let done = anim.apply(now, view);
                    moved = true;
                    if !done {
                        return moved;
                    }
                    let (p_min, p_max) = ordered(self.config.pause_min_ms, self.config.pause_max_ms);
                    let pause = self.rng.gen_range(p_min..=p_max).max(1);
                    self.state = FlightState::Pausing {
                        index,
                        until: now.after(pause),
                    };
                }
                FlightState::Pausing { index, until } => {
                    if now < until {
                        return moved;
                    }
                    let next = (index + 1) % self.plan.len().max(1);
                    self.begin_leg(next, now, view);
                }
            }
        }
    }

    fn launch(&mut self, start: Millis, view: &MapView) {
        self.plan = generate_plan(&self.config, &mut self.rng);
        tracing::info!(waypoints = self.plan.len(), "flight started");
        self.begin_leg(0, start, view);
    }

    fn begin_leg(&mut self, index: usize, start: Millis, view: &MapView) {
        let Some(wp) = self.plan.get(index).copied() else {
            self.state = FlightState::Stopped;
            return;
        };
        self.legs_started += 1;
        self.state = FlightState::Moving {
            index,
            anim: CameraAnimation::new(view, wp.center, wp.zoom, start, wp.duration_ms),
        };
    }
}
