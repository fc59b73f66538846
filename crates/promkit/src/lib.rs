//! promkit: Prometheus-style metrics with an embedded HTTP exposer.
//!
//! Most programs only need the flat re-exports below: build families in a
//! [`Registry`], keep the returned handles on the hot path, and hand the
//! registry to an [`Exposer`]. The full crates stay reachable as
//! `core` and `exposer`.

pub use promkit_core::{
    Buckets, Collectable, Counter, ErrorClass, Family, FamilyOpts, Gauge, Histogram, LabelSet,
    MetricFamily, MetricsError, Quantile, Registry, Result, Summary, SummaryConfig,
};
pub use promkit_exposer::config::ExposerSection;
pub use promkit_exposer::Exposer;

pub mod core {
    pub use promkit_core::*;
}

pub mod exposer {
    pub use promkit_exposer::*;
}

/// Glob-import to get metric handles and their registration types in scope.
pub mod prelude {
    pub use promkit_core::{
        Buckets, Collectable, Counter, FamilyOpts, Gauge, Histogram, LabelSet, Quantile, Registry,
        Summary, SummaryConfig,
    };
    pub use promkit_exposer::Exposer;
}
