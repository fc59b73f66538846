//! Metric types.
//!
//! Every series type implements [`Metric`]: a kind tag, a per-family
//! configuration shared by all series of the family, and a single
//! `collect` capability producing a [`MetricValue`]. Counters, gauges and
//! histograms are lock-free; summaries hold a short mutex around the sketch.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Result;
use crate::snapshot::{MetricKind, MetricValue};

pub mod counter;
pub mod gauge;
pub mod histogram;
pub mod summary;

pub use counter::Counter;
pub use gauge::Gauge;
pub use histogram::{Buckets, Histogram};
pub use summary::{Quantile, Summary, SummaryConfig};

/// A single time series type.
pub trait Metric: Send + Sync + 'static {
    const KIND: MetricKind;

    /// Family-level options (bucket bounds, quantile targets).
    type Config: Clone + PartialEq + fmt::Debug + Send + Sync + 'static;

    /// Label name series of this type may not use.
    const RESERVED_LABEL: Option<&'static str> = None;

    /// Checked once when the family is constructed.
    fn validate(_config: &Self::Config) -> Result<()> {
        Ok(())
    }

    fn new(config: &Self::Config) -> Self;

    /// Consistent snapshot of this series.
    fn collect(&self) -> MetricValue;
}

/// `f64` stored as its bit pattern in an `AtomicU64`.
pub(crate) struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub(crate) fn new(v: f64) -> Self {
        Self(AtomicU64::new(v.to_bits()))
    }

    pub(crate) fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub(crate) fn store(&self, v: f64) {
        self.0.store(v.to_bits(), Ordering::Relaxed);
    }

    /// CAS loop; returns the new value.
    pub(crate) fn add(&self, delta: f64) -> f64 {
        let mut cur = self.0.load(Ordering::Relaxed);
        loop {
            let next = f64::from_bits(cur) + delta;
            match self.0.compare_exchange_weak(
                cur,
                next.to_bits(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(actual) => cur = actual,
            }
        }
    }
}

impl fmt::Debug for AtomicF64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.load())
    }
}
