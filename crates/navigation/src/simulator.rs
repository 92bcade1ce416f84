use foundation::{Millis, Position};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use runtime::Timer;
use serde::{Deserialize, Serialize};

use crate::geolocation::{Geolocation, PositionOptions};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub fallback_latitude: f64,
    pub fallback_longitude: f64,
    pub interval_ms: u64,
    /// Full width of the per-axis uniform step; each update moves at most half
    /// of it in either direction.
    pub step_deg: f64,
    pub accuracy_m: f64,
    pub seed_timeout_ms: u64,
    pub seed_max_age_ms: u64,
    /// RNG seed for deterministic runs. None = random.
    pub rng_seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            fallback_latitude: 50.5,
            fallback_longitude: 19.5,
            interval_ms: 15_000,
            step_deg: 0.001,
            accuracy_m: 10.0,
            seed_timeout_ms: 5_000,
            seed_max_age_ms: 60_000,
            rng_seed: None,
        }
    }
}

impl SimulatorConfig {
    pub fn seed_options(&self) -> PositionOptions {
        PositionOptions {
            high_accuracy: false,
            timeout_ms: self.seed_timeout_ms,
            max_age_ms: self.seed_max_age_ms,
        }
    }

    pub fn fallback(&self) -> Position {
        Position::new(self.fallback_latitude, self.fallback_longitude, self.accuracy_m)
    }
}

/// Best-effort coarse fix used to seed the simulator. Failures are ignored.
pub async fn acquire_seed(geo: &dyn Geolocation, cfg: &SimulatorConfig) -> Option<Position> {
    if !geo.is_available() {
        return None;
    }
    match geo.current_position(cfg.seed_options()).await {
        Ok(fix) => Some(fix),
        Err(err) => {
            tracing::debug!(error = %err, "could not get a seed position, using default");
            None
        }
    }
}

/// Synthetic random walk standing in for GPS on desktops.
#[derive(Debug)]
pub struct Simulator {
    config: SimulatorConfig,
    rng: StdRng,
    timer: Timer,
    position: Option<Position>,
}

impl Simulator {
    pub fn new(config: SimulatorConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng,
            timer: Timer::idle(),
            position: None,
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_armed()
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.timer.deadline()
    }

    /// Starts the walk at `seed` and returns the immediate first update.
    pub fn start(&mut self, seed: Position, now: Millis) -> Position {
        let first = Position::new(seed.latitude, seed.longitude, self.config.accuracy_m);
        self.position = Some(first);
        self.timer.arm_repeating(now, self.config.interval_ms);
        first
    }

    /// One perturbed position once the interval is due. A late tick still
    /// yields a single step.
    pub fn tick(&mut self, now: Millis) -> Option<Position> {
        if !self.timer.fired(now) {
            return None;
        }
        let next = self.step(self.position?);
        self.position = Some(next);
        Some(next)
    }

    pub fn stop(&mut self) {
        self.timer.cancel();
    }

    fn step(&mut self, from: Position) -> Position {
        let step = self.config.step_deg;
        let d_lat = (self.rng.gen_range(0.0..1.0) - 0.5) * step;
        let d_lon = (self.rng.gen_range(0.0..1.0) - 0.5) * step;
        Position::new(
            from.latitude + d_lat,
            from.longitude + d_lon,
            self.config.accuracy_m,
        )
    }
}
