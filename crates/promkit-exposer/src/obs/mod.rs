//! Exposer self-metrics.
//!
//! Every endpoint reports on its own scrapes through a private registry that
//! is served alongside the user's collectables.

pub mod metrics;
