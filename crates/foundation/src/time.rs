use serde::{Deserialize, Serialize};

/// Monotonic host time in milliseconds.
///
/// The host decides the epoch (page load, process start, or a virtual clock in
/// tests); components only ever compare and subtract instants.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Millis(pub u64);

impl Millis {
    pub const ZERO: Millis = Millis(0);

    pub fn from_f64(ms: f64) -> Self {
        if ms.is_finite() && ms > 0.0 {
            Millis(ms as u64)
        } else {
            Millis::ZERO
        }
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    pub fn saturating_since(self, earlier: Millis) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    pub fn after(self, delay_ms: u64) -> Millis {
        Millis(self.0.saturating_add(delay_ms))
    }
}

/// Time window for an animation: `start` plus a fixed duration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TimeSpan {
    pub start: Millis,
    pub duration_ms: u64,
}

impl TimeSpan {
    pub fn new(start: Millis, duration_ms: u64) -> Self {
        Self { start, duration_ms }
    }

    pub fn end(&self) -> Millis {
        self.start.after(self.duration_ms)
    }

    /// Linear progress in `[0, 1]`. Zero-length spans are complete immediately.
    pub fn progress(&self, now: Millis) -> f64 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        let elapsed = now.saturating_since(self.start) as f64;
        (elapsed / self.duration_ms as f64).min(1.0)
    }

    pub fn is_complete(&self, now: Millis) -> bool {
        now >= self.end()
    }
}
