//! The one capability the exposer needs from a metric source.

use crate::error::Result;
use crate::snapshot::MetricFamily;

/// Anything that can produce a snapshot of its current families.
///
/// [`Registry`](crate::Registry) and every [`Family`](crate::Family)
/// implement it; external sources (process stats, bridges to other systems)
/// can implement it too. Errors are reported to the scraper as a server
/// error and never produce a partial body.
pub trait Collectable: Send + Sync {
    fn collect(&self) -> Result<Vec<MetricFamily>>;
}
