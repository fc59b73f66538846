//! A served path and the collectables registered on it.
//!
//! Collectables are held weakly: the exposer never keeps user data alive, and
//! a collectable whose last strong reference is dropped disappears from the
//! next scrape.

use std::sync::{Arc, PoisonError, RwLock, Weak};

use promkit_core::error::Result;
use promkit_core::{Collectable, MetricFamily};

use crate::obs::metrics::ScrapeMetrics;

pub struct Endpoint {
    path: String,
    collectables: RwLock<Vec<Weak<dyn Collectable>>>,
    metrics: ScrapeMetrics,
}

impl Endpoint {
    pub fn new(path: impl Into<String>) -> Result<Self> {
        Ok(Self {
            path: path.into(),
            collectables: RwLock::new(Vec::new()),
            metrics: ScrapeMetrics::new()?,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn metrics(&self) -> &ScrapeMetrics {
        &self.metrics
    }

    /// Add a collectable. Registering the same instance twice is a no-op.
    pub fn register(&self, collectable: Weak<dyn Collectable>) -> bool {
        let mut list = self
            .collectables
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        list.retain(|w| w.strong_count() > 0);
        if list.iter().any(|w| Weak::ptr_eq(w, &collectable)) {
            return false;
        }
        list.push(collectable);
        true
    }

    /// Remove the collectable living at `target`. Returns whether it was present.
    pub fn remove<T: ?Sized>(&self, target: *const T) -> bool {
        let mut list = self
            .collectables
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = list.len();
        list.retain(|w| w.strong_count() > 0 && !std::ptr::addr_eq(w.as_ptr(), target));
        list.len() != before
    }

    /// Number of live collectables (self-metrics excluded).
    pub fn len(&self) -> usize {
        self.collectables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot the self-metrics followed by every live collectable, in
    /// registration order. The first failing collectable aborts the scrape.
    pub fn collect(&self) -> Result<Vec<MetricFamily>> {
        // Upgrade under the read lock, collect outside it.
        let live: Vec<Arc<dyn Collectable>> = self
            .collectables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(Weak::upgrade)
            .collect();

        let mut out = self.metrics.registry().gather();
        for c in live {
            out.extend(c.collect()?);
        }
        Ok(out)
    }
}
