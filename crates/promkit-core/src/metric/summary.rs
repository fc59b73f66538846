use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{MetricsError, Result};
use crate::quantile::TimeWindowQuantiles;
use crate::snapshot::{MetricKind, MetricValue, QuantileValue, SummarySnapshot};

use super::Metric;

/// Quantile target `φ` with allowed rank error `ε`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Quantile {
    pub quantile: f64,
    pub error: f64,
}

/// Family-level summary options.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryConfig {
    pub quantiles: Vec<Quantile>,
    /// Length of the sliding window quantiles are computed over.
    pub max_age: Duration,
    /// Number of rotating sketches the window is split into.
    pub age_buckets: usize,
}

impl SummaryConfig {
    pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(60);
    pub const DEFAULT_AGE_BUCKETS: usize = 5;
    /// Every observation is written into each age bucket, so the count is bounded.
    pub const MAX_AGE_BUCKETS: usize = 64;

    pub fn new(quantiles: Vec<Quantile>) -> Self {
        Self {
            quantiles,
            max_age: Self::DEFAULT_MAX_AGE,
            age_buckets: Self::DEFAULT_AGE_BUCKETS,
        }
    }

    fn validate(&self) -> Result<()> {
        for (i, q) in self.quantiles.iter().enumerate() {
            if !(q.quantile > 0.0 && q.quantile < 1.0) {
                return Err(MetricsError::InvalidQuantile(format!(
                    "quantile must be in (0, 1), got {}",
                    q.quantile
                )));
            }
            if !(q.error > 0.0 && q.error < 1.0) {
                return Err(MetricsError::InvalidQuantile(format!(
                    "error for quantile {} must be in (0, 1), got {}",
                    q.quantile, q.error
                )));
            }
            if self.quantiles[..i].iter().any(|p| p.quantile == q.quantile) {
                return Err(MetricsError::InvalidQuantile(format!(
                    "quantile {} listed twice",
                    q.quantile
                )));
            }
        }
        if !(1..=Self::MAX_AGE_BUCKETS).contains(&self.age_buckets) {
            return Err(MetricsError::InvalidQuantile(format!(
                "age_buckets must be in 1..={}, got {}",
                Self::MAX_AGE_BUCKETS,
                self.age_buckets
            )));
        }
        if self.max_age.is_zero() {
            return Err(MetricsError::InvalidQuantile("max_age must be non-zero".into()));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct SummaryState {
    window: TimeWindowQuantiles,
    count: u64,
    sum: f64,
}

/// Count, sum and sliding-window quantile estimates.
#[derive(Debug)]
pub struct Summary {
    targets: Vec<f64>,
    state: Mutex<SummaryState>,
}

impl Summary {
    pub fn observe(&self, value: f64) {
        let mut st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        st.window.insert(value);
        st.count += 1;
        st.sum += value;
    }

    pub fn count(&self) -> u64 {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).count
    }

    pub fn sum(&self) -> f64 {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).sum
    }

    fn snapshot(&self) -> SummarySnapshot {
        let mut st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let quantiles = self
            .targets
            .iter()
            .map(|&q| QuantileValue {
                quantile: q,
                value: st.window.query(q),
            })
            .collect();
        SummarySnapshot {
            quantiles,
            sum: st.sum,
            count: st.count,
        }
    }
}

impl Metric for Summary {
    const KIND: MetricKind = MetricKind::Summary;
    const RESERVED_LABEL: Option<&'static str> = Some("quantile");
    type Config = SummaryConfig;

    fn validate(config: &SummaryConfig) -> Result<()> {
        config.validate()
    }

    fn new(config: &SummaryConfig) -> Self {
        Self {
            targets: config.quantiles.iter().map(|q| q.quantile).collect(),
            state: Mutex::new(SummaryState {
                window: TimeWindowQuantiles::new(
                    &config.quantiles,
                    config.max_age,
                    config.age_buckets,
                ),
                count: 0,
                sum: 0.0,
            }),
        }
    }

    fn collect(&self) -> MetricValue {
        MetricValue::Summary(self.snapshot())
    }
}
