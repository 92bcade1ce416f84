use foundation::time::Millis;

/// Deadline-based timer for poll-driven components.
///
/// Nothing here sleeps or spawns: the owner calls [`Timer::poll`] with the
/// current host time and reacts to the number of firings it reports. This keeps
/// every timer deterministic and replayable under a virtual clock.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Timer {
    deadline: Option<Millis>,
    period_ms: Option<u64>,
}

impl Timer {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn arm_once(&mut self, now: Millis, delay_ms: u64) {
        self.deadline = Some(now.after(delay_ms));
        self.period_ms = None;
    }

    /// First firing happens one full period after `now`.
    pub fn arm_repeating(&mut self, now: Millis, period_ms: u64) {
        let period_ms = period_ms.max(1);
        self.deadline = Some(now.after(period_ms));
        self.period_ms = Some(period_ms);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
        self.period_ms = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Millis> {
        self.deadline
    }

    /// Returns how many times the timer fired up to and including `now`.
    ///
    /// One-shot timers disarm after firing. Repeating timers report every
    /// period that elapsed since the last poll, so a late poll catches up
    /// instead of drifting.
    pub fn poll(&mut self, now: Millis) -> u32 {
        let Some(deadline) = self.deadline else {
            return 0;
        };
        if now < deadline {
            return 0;
        }
        match self.period_ms {
            None => {
                self.deadline = None;
                1
            }
            Some(period) => {
                let fires = now.saturating_since(deadline) / period + 1;
                self.deadline = Some(deadline.after(fires * period));
                u32::try_from(fires).unwrap_or(u32::MAX)
            }
        }
    }

    /// Like [`Timer::poll`] but reports a late poll as a single firing.
    /// Missed periods are dropped; the next deadline keeps the original phase.
    pub fn fired(&mut self, now: Millis) -> bool {
        self.poll(now) > 0
    }
}

/// Earliest of several optional deadlines, for `poll_at` style scheduling.
pub fn earliest<I>(deadlines: I) -> Option<Millis>
where
    I: IntoIterator<Item = Option<Millis>>,
{
    deadlines.into_iter().flatten().min()
}
