//! Label-dimensioned metric families.

use std::any::Any;
use std::sync::Arc;

use dashmap::DashMap;

use crate::collectable::Collectable;
use crate::error::{MetricsError, Result};
use crate::labels::{check_metric_name, LabelSet};
use crate::metric::Metric;
use crate::snapshot::{ClientMetric, MetricFamily, MetricKind};

/// Everything needed to construct a family, consumed by one call.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyOpts<C = ()> {
    pub name: String,
    pub help: String,
    /// Labels attached to every series of the family.
    pub const_labels: LabelSet,
    /// Per-type options: `()` for counters and gauges, `Buckets` for
    /// histograms, `SummaryConfig` for summaries.
    pub config: C,
}

impl<C> FamilyOpts<C> {
    pub fn new(name: impl Into<String>, help: impl Into<String>, config: C) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            const_labels: LabelSet::new(),
            config,
        }
    }
}

impl<C: Default> Default for FamilyOpts<C> {
    fn default() -> Self {
        Self::new(String::new(), String::new(), C::default())
    }
}

/// Series of one metric type sharing a name, keyed by label set.
///
/// `add` hands out `Arc`s; callers keep them and mutate the metric directly,
/// so the map is only touched when a new label combination shows up.
pub struct Family<M: Metric> {
    name: String,
    help: String,
    const_labels: LabelSet,
    config: M::Config,
    metrics: DashMap<LabelSet, Arc<M>>,
}

impl<M: Metric> Family<M> {
    /// Validate options and build an empty family.
    pub fn new(opts: FamilyOpts<M::Config>) -> Result<Self> {
        check_metric_name(&opts.name)?;
        M::validate(&opts.config)?;
        if let Some(reserved) = M::RESERVED_LABEL {
            if opts.const_labels.contains(reserved) {
                return Err(MetricsError::ReservedLabel {
                    label: reserved.to_string(),
                    kind: M::KIND.as_str(),
                });
            }
        }
        Ok(Self {
            name: opts.name,
            help: opts.help,
            const_labels: opts.const_labels,
            config: opts.config,
            metrics: DashMap::new(),
        })
    }

    /// Return the series for `labels`, creating it on first use.
    ///
    /// Concurrent callers with equal label sets receive the same instance.
    pub fn add(&self, labels: &LabelSet) -> Result<Arc<M>> {
        if let Some(m) = self.metrics.get(labels) {
            return Ok(Arc::clone(m.value()));
        }
        self.check_series_labels(labels)?;
        let m = self
            .metrics
            .entry(labels.clone())
            .or_insert_with(|| Arc::new(M::new(&self.config)));
        Ok(Arc::clone(m.value()))
    }

    /// `add` from borrowed pairs.
    pub fn add_pairs(&self, pairs: &[(&str, &str)]) -> Result<Arc<M>> {
        self.add(&LabelSet::try_from(pairs)?)
    }

    /// Drop a series. Holders of its `Arc` keep a detached instance.
    pub fn remove(&self, labels: &LabelSet) -> bool {
        self.metrics.remove(labels).is_some()
    }

    pub fn contains(&self, labels: &LabelSet) -> bool {
        self.metrics.contains_key(labels)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn const_labels(&self) -> &LabelSet {
        &self.const_labels
    }

    pub fn config(&self) -> &M::Config {
        &self.config
    }

    /// Snapshot every series, ordered by label set.
    pub fn collect(&self) -> MetricFamily {
        // Copy out the handles first so no shard lock is held while reading.
        let mut series: Vec<(LabelSet, Arc<M>)> = self
            .metrics
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect();
        series.sort_by(|a, b| a.0.cmp(&b.0));

        let metrics = series
            .into_iter()
            .map(|(labels, m)| ClientMetric {
                labels: if self.const_labels.is_empty() {
                    labels
                } else {
                    labels.union(&self.const_labels)
                },
                value: m.collect(),
            })
            .collect();

        MetricFamily {
            name: self.name.clone(),
            help: self.help.clone(),
            kind: M::KIND,
            metrics,
        }
    }

    pub(crate) fn same_opts(&self, opts: &FamilyOpts<M::Config>) -> bool {
        self.help == opts.help && self.const_labels == opts.const_labels && self.config == opts.config
    }

    fn check_series_labels(&self, labels: &LabelSet) -> Result<()> {
        if let Some(reserved) = M::RESERVED_LABEL {
            if labels.contains(reserved) {
                return Err(MetricsError::ReservedLabel {
                    label: reserved.to_string(),
                    kind: M::KIND.as_str(),
                });
            }
        }
        if let Some(dup) = labels.first_overlap(&self.const_labels) {
            return Err(MetricsError::DuplicateLabel(dup.to_string()));
        }
        Ok(())
    }
}

impl<M: Metric> Collectable for Family<M> {
    fn collect(&self) -> Result<Vec<MetricFamily>> {
        Ok(vec![Family::collect(self)])
    }
}

/// Type-erased view the registry stores.
pub(crate) trait ErasedFamily: Send + Sync {
    fn kind(&self) -> MetricKind;
    fn collect(&self) -> MetricFamily;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<M: Metric> ErasedFamily for Family<M> {
    fn kind(&self) -> MetricKind {
        M::KIND
    }

    fn collect(&self) -> MetricFamily {
        Family::collect(self)
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
