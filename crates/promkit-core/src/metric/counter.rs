use crate::error::{MetricsError, Result};
use crate::snapshot::{MetricKind, MetricValue};

use super::{AtomicF64, Metric};

/// Monotonically non-decreasing value starting at 0.
#[derive(Debug)]
pub struct Counter {
    value: AtomicF64,
}

impl Counter {
    /// Increment by 1.
    pub fn inc(&self) {
        self.value.add(1.0);
    }

    /// Increment by `delta`. Negative and NaN deltas are rejected and the
    /// value is left unchanged.
    pub fn increment(&self, delta: f64) -> Result<()> {
        if delta.is_nan() || delta < 0.0 {
            return Err(MetricsError::NegativeDelta(delta));
        }
        self.value.add(delta);
        Ok(())
    }

    /// Increment by a whole number of units. Cannot fail.
    pub fn inc_by(&self, n: u64) {
        self.value.add(n as f64);
    }

    /// Current value.
    pub fn value(&self) -> f64 {
        self.value.load()
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self {
            value: AtomicF64::new(0.0),
        }
    }
}

impl Metric for Counter {
    const KIND: MetricKind = MetricKind::Counter;
    type Config = ();

    fn new(_config: &()) -> Self {
        Self::default()
    }

    fn collect(&self) -> MetricValue {
        MetricValue::Counter(self.value())
    }
}
