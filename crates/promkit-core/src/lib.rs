//! promkit core: metric types, families, registry and the text encoder.
//!
//! This crate is transport-agnostic. It owns the metric engine and the wire
//! format, and carries no runtime or HTTP dependencies, so it can be embedded
//! anywhere and exposed by any server (see `promkit-exposer`).
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Every fallible
//! path surfaces as `MetricsError`, so a misconfigured family or a bad
//! external snapshot never takes the process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod collectable;
pub mod error;
pub mod family;
pub mod labels;
pub mod metric;
mod quantile;
pub mod registry;
pub mod snapshot;
pub mod text;

pub use collectable::Collectable;
pub use error::{ErrorClass, MetricsError, Result};
pub use family::{Family, FamilyOpts};
pub use labels::LabelSet;
pub use metric::{Buckets, Counter, Gauge, Histogram, Metric, Quantile, Summary, SummaryConfig};
pub use registry::Registry;
pub use snapshot::{MetricFamily, MetricKind, MetricValue};
