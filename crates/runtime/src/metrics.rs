use std::collections::BTreeMap;

use serde::Serialize;

/// Named event counters kept by each component (fade frames, dropped
/// orientation events, position updates, ...).
///
/// Keys are static names so components never allocate on the hot path; the
/// sorted map keeps snapshots stable for the debug overlay and tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Metrics {
    counters: BTreeMap<&'static str, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub counters: BTreeMap<&'static str, u64>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn increment(&mut self, name: &'static str) {
        self.add(name, 1);
    }

    pub fn add(&mut self, name: &'static str, by: u64) {
        if by > 0 {
            *self.counters.entry(name).or_insert(0) += by;
        }
    }

    /// Sums another component's counters into this one.
    pub fn merge(&mut self, other: &Metrics) {
        for (name, by) in &other.counters {
            self.add(*name, *by);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self.counters.clone(),
        }
    }
}
