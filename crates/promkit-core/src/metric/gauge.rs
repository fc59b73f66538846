use std::time::{SystemTime, UNIX_EPOCH};

use crate::snapshot::{MetricKind, MetricValue};

use super::{AtomicF64, Metric};

/// Arbitrary value that can go up and down.
#[derive(Debug)]
pub struct Gauge {
    value: AtomicF64,
}

impl Gauge {
    /// Increment by 1.
    pub fn inc(&self) {
        self.value.add(1.0);
    }

    /// Decrement by 1.
    pub fn dec(&self) {
        self.value.add(-1.0);
    }

    /// Add `delta`, which may be negative.
    pub fn increment(&self, delta: f64) {
        self.value.add(delta);
    }

    /// Subtract `delta`.
    pub fn decrement(&self, delta: f64) {
        self.value.add(-delta);
    }

    /// Overwrite the current value.
    pub fn set(&self, value: f64) {
        self.value.store(value);
    }

    /// Set to the current Unix time in seconds.
    pub fn set_to_current_time(&self) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();
        self.set(now);
    }

    /// Current value.
    pub fn value(&self) -> f64 {
        self.value.load()
    }
}

impl Default for Gauge {
    fn default() -> Self {
        Self {
            value: AtomicF64::new(0.0),
        }
    }
}

impl Metric for Gauge {
    const KIND: MetricKind = MetricKind::Gauge;
    type Config = ();

    fn new(_config: &()) -> Self {
        Self::default()
    }

    fn collect(&self) -> MetricValue {
        MetricValue::Gauge(self.value())
    }
}
