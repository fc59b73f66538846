//! Registry: name -> family, with type-checked registration.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::collectable::Collectable;
use crate::error::{MetricsError, Result};
use crate::family::{ErasedFamily, Family, FamilyOpts};
use crate::labels::check_metric_name;
use crate::metric::{Buckets, Counter, Gauge, Histogram, Metric, Summary, SummaryConfig};
use crate::snapshot::MetricFamily;

struct Registered {
    /// Registration order, used to keep scrape output stable.
    seq: u64,
    family: Arc<dyn ErasedFamily>,
}

/// Owns every family created through it.
///
/// Share it behind an `Arc`: application code keeps one handle, exposers keep
/// weak ones and read snapshots on demand.
#[derive(Default)]
pub struct Registry {
    families: DashMap<String, Registered>,
    seq: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a family, or return the existing one when name, type and
    /// options all match.
    ///
    /// Fails without touching the registry when the name is invalid, taken
    /// by another type, or taken by the same type with different options.
    pub fn add_family<M: Metric>(&self, opts: FamilyOpts<M::Config>) -> Result<Arc<Family<M>>> {
        check_metric_name(&opts.name)?;

        match self.families.entry(opts.name.clone()) {
            Entry::Occupied(e) => {
                let existing = e.get().family.kind();
                if existing != M::KIND {
                    tracing::warn!(
                        name = %opts.name,
                        existing = existing.as_str(),
                        requested = M::KIND.as_str(),
                        "family name already registered with another type"
                    );
                    return Err(MetricsError::DuplicateName {
                        name: opts.name,
                        existing: existing.as_str(),
                        requested: M::KIND.as_str(),
                    });
                }
                let family = Arc::clone(&e.get().family)
                    .into_any()
                    .downcast::<Family<M>>()
                    .map_err(|_| {
                        MetricsError::Internal(format!(
                            "family {:?} stored with mismatched type",
                            opts.name
                        ))
                    })?;
                if !family.same_opts(&opts) {
                    tracing::warn!(name = %opts.name, "family re-registered with different options");
                    return Err(MetricsError::ConflictingFamily(opts.name));
                }
                Ok(family)
            }
            Entry::Vacant(v) => {
                let family = Arc::new(Family::<M>::new(opts)?);
                let seq = self.seq.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(name = family.name(), kind = M::KIND.as_str(), "family registered");
                v.insert(Registered {
                    seq,
                    family: Arc::clone(&family) as Arc<dyn ErasedFamily>,
                });
                Ok(family)
            }
        }
    }

    pub fn add_counter(&self, opts: FamilyOpts) -> Result<Arc<Family<Counter>>> {
        self.add_family::<Counter>(opts)
    }

    pub fn add_gauge(&self, opts: FamilyOpts) -> Result<Arc<Family<Gauge>>> {
        self.add_family::<Gauge>(opts)
    }

    pub fn add_histogram(&self, opts: FamilyOpts<Buckets>) -> Result<Arc<Family<Histogram>>> {
        self.add_family::<Histogram>(opts)
    }

    pub fn add_summary(&self, opts: FamilyOpts<SummaryConfig>) -> Result<Arc<Family<Summary>>> {
        self.add_family::<Summary>(opts)
    }

    /// Look up a registered family by name and type.
    pub fn get<M: Metric>(&self, name: &str) -> Option<Arc<Family<M>>> {
        let family = Arc::clone(&self.families.get(name)?.family);
        family.into_any().downcast::<Family<M>>().ok()
    }

    /// Unregister a family. Existing handles keep working but are no longer
    /// collected.
    pub fn remove_family(&self, name: &str) -> bool {
        self.families.remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Snapshot every family in registration order.
    pub fn gather(&self) -> Vec<MetricFamily> {
        let mut families: Vec<(u64, Arc<dyn ErasedFamily>)> = self
            .families
            .iter()
            .map(|e| (e.value().seq, Arc::clone(&e.value().family)))
            .collect();
        families.sort_by_key(|(seq, _)| *seq);
        families.into_iter().map(|(_, f)| f.collect()).collect()
    }
}

impl Collectable for Registry {
    fn collect(&self) -> Result<Vec<MetricFamily>> {
        Ok(self.gather())
    }
}
