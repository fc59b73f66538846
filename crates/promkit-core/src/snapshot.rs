//! Point-in-time snapshot model handed from collectables to encoders.

use crate::labels::LabelSet;

/// Metric type tag shared by a whole family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
    Summary,
}

impl MetricKind {
    /// Name used on the `# TYPE` line.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
            MetricKind::Summary => "summary",
        }
    }
}

/// One cumulative histogram bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub upper_bound: f64,
    pub cumulative_count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    /// Finite buckets followed by the `+Inf` bucket.
    pub buckets: Vec<Bucket>,
    pub sum: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuantileValue {
    pub quantile: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummarySnapshot {
    pub quantiles: Vec<QuantileValue>,
    pub sum: f64,
    pub count: u64,
}

/// Value of one series.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Counter(f64),
    Gauge(f64),
    Histogram(HistogramSnapshot),
    Summary(SummarySnapshot),
}

impl MetricValue {
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricValue::Counter(_) => MetricKind::Counter,
            MetricValue::Gauge(_) => MetricKind::Gauge,
            MetricValue::Histogram(_) => MetricKind::Histogram,
            MetricValue::Summary(_) => MetricKind::Summary,
        }
    }
}

/// One series inside a family snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientMetric {
    pub labels: LabelSet,
    pub value: MetricValue,
}

/// Snapshot of a whole family.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    pub metrics: Vec<ClientMetric>,
}
