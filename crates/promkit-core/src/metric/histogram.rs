//! Bucketed histogram.
//!
//! Counts are stored per bucket (non-cumulative) in atomics and turned into
//! cumulative counts at collect time. An observation touches exactly one
//! bucket, so the exposed `le` series are always non-decreasing and the
//! `+Inf` bucket always equals the count. `sum` is a separate atomic and may
//! trail the counts by observations still in flight during a scrape.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{MetricsError, Result};
use crate::snapshot::{Bucket, HistogramSnapshot, MetricKind, MetricValue};

use super::{AtomicF64, Metric};

/// Default bounds, tuned for request latencies in seconds.
pub const DEFAULT_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Validated, strictly increasing finite upper bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Buckets {
    bounds: Arc<[f64]>,
}

impl Buckets {
    /// A trailing `+Inf` is accepted and dropped; the `+Inf` bucket is implicit.
    pub fn new(mut bounds: Vec<f64>) -> Result<Self> {
        if bounds.last() == Some(&f64::INFINITY) {
            bounds.pop();
        }
        for (i, b) in bounds.iter().enumerate() {
            if !b.is_finite() {
                return Err(MetricsError::InvalidBuckets(format!(
                    "bound #{i} is not finite ({b})"
                )));
            }
            if i > 0 && bounds[i - 1] >= *b {
                return Err(MetricsError::InvalidBuckets(format!(
                    "bounds must be strictly increasing ({} >= {b})",
                    bounds[i - 1]
                )));
            }
        }
        Ok(Self {
            bounds: bounds.into(),
        })
    }

    /// `count` bounds: `start`, `start + width`, ...
    pub fn linear(start: f64, width: f64, count: usize) -> Result<Self> {
        if count == 0 {
            return Err(MetricsError::InvalidBuckets("linear count must be >= 1".into()));
        }
        if !(width > 0.0) {
            return Err(MetricsError::InvalidBuckets(format!(
                "linear width must be positive, got {width}"
            )));
        }
        Self::new((0..count).map(|i| start + width * i as f64).collect())
    }

    /// `count` bounds: `start`, `start * factor`, ...
    pub fn exponential(start: f64, factor: f64, count: usize) -> Result<Self> {
        if count == 0 {
            return Err(MetricsError::InvalidBuckets(
                "exponential count must be >= 1".into(),
            ));
        }
        if !(start > 0.0) {
            return Err(MetricsError::InvalidBuckets(format!(
                "exponential start must be positive, got {start}"
            )));
        }
        if !(factor > 1.0) {
            return Err(MetricsError::InvalidBuckets(format!(
                "exponential factor must be > 1, got {factor}"
            )));
        }
        let mut bounds = Vec::with_capacity(count);
        let mut b = start;
        for _ in 0..count {
            bounds.push(b);
            b *= factor;
        }
        Self::new(bounds)
    }

    /// Finite bounds, without the implicit `+Inf`.
    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }
}

impl Default for Buckets {
    fn default() -> Self {
        Self {
            bounds: DEFAULT_BUCKETS.to_vec().into(),
        }
    }
}

#[derive(Debug)]
pub struct Histogram {
    bounds: Arc<[f64]>,
    /// One slot per finite bound plus `+Inf`.
    counts: Box<[AtomicU64]>,
    sum: AtomicF64,
}

impl Histogram {
    pub fn with_buckets(buckets: &Buckets) -> Self {
        let counts = (0..=buckets.bounds.len())
            .map(|_| AtomicU64::new(0))
            .collect();
        Self {
            bounds: Arc::clone(&buckets.bounds),
            counts,
            sum: AtomicF64::new(0.0),
        }
    }

    /// Record one value in the bucket of the first bound `>= value`.
    pub fn observe(&self, value: f64) {
        let idx = if value.is_nan() {
            self.bounds.len()
        } else {
            self.bounds.partition_point(|b| *b < value)
        };
        self.counts[idx].fetch_add(1, Ordering::Relaxed);
        self.sum.add(value);
    }

    /// Batch update: adds `increments[i]` to bucket `i` directly, no bound
    /// search, then adds `sum_increment` to the sum.
    ///
    /// Increments are per bucket, not cumulative: one for each finite bound
    /// followed by one for `+Inf`. This is not equivalent to calling
    /// [`observe`](Self::observe) repeatedly. The caller vouches that
    /// `sum_increment` matches the values it accounts for; it is not checked.
    pub fn observe_multiple(&self, increments: &[u64], sum_increment: f64) -> Result<()> {
        if increments.len() != self.counts.len() {
            return Err(MetricsError::BucketCountMismatch {
                expected: self.counts.len(),
                got: increments.len(),
            });
        }
        for (slot, inc) in self.counts.iter().zip(increments) {
            if *inc > 0 {
                slot.fetch_add(*inc, Ordering::Relaxed);
            }
        }
        self.sum.add(sum_increment);
        Ok(())
    }

    pub fn sum(&self) -> f64 {
        self.sum.load()
    }

    pub fn count(&self) -> u64 {
        self.counts.iter().map(|c| c.load(Ordering::Relaxed)).sum()
    }

    fn snapshot(&self) -> HistogramSnapshot {
        let mut buckets = Vec::with_capacity(self.counts.len());
        let mut cumulative = 0u64;
        for (i, slot) in self.counts.iter().enumerate() {
            cumulative = cumulative.saturating_add(slot.load(Ordering::Relaxed));
            let upper_bound = self.bounds.get(i).copied().unwrap_or(f64::INFINITY);
            buckets.push(Bucket {
                upper_bound,
                cumulative_count: cumulative,
            });
        }
        HistogramSnapshot {
            buckets,
            sum: self.sum.load(),
            count: cumulative,
        }
    }
}

impl Metric for Histogram {
    const KIND: MetricKind = MetricKind::Histogram;
    const RESERVED_LABEL: Option<&'static str> = Some("le");
    type Config = Buckets;

    fn new(config: &Buckets) -> Self {
        Self::with_buckets(config)
    }

    fn collect(&self) -> MetricValue {
        MetricValue::Histogram(self.snapshot())
    }
}
