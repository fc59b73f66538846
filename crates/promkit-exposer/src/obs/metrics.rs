//! Per-endpoint scrape accounting.
//!
//! Latency is tracked in microseconds to keep the summary free of tiny
//! fractional values.

use std::sync::Arc;
use std::time::Duration;

use promkit_core::error::Result;
use promkit_core::{Counter, FamilyOpts, LabelSet, Quantile, Registry, Summary, SummaryConfig};

pub const TRANSFERRED_BYTES: &str = "exposer_transferred_bytes_total";
pub const SCRAPES: &str = "exposer_scrapes_total";
pub const REQUEST_LATENCIES: &str = "exposer_request_latencies";

/// Self-metrics of one endpoint, recorded after each successful scrape.
pub struct ScrapeMetrics {
    registry: Arc<Registry>,
    bytes_transferred: Arc<Counter>,
    scrapes: Arc<Counter>,
    latencies: Arc<Summary>,
}

impl ScrapeMetrics {
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        let none = LabelSet::new();

        let bytes_transferred = registry
            .add_counter(FamilyOpts::new(
                TRANSFERRED_BYTES,
                "Transferred bytes to metrics services",
                (),
            ))?
            .add(&none)?;
        let scrapes = registry
            .add_counter(FamilyOpts::new(
                SCRAPES,
                "Number of times metrics were scraped",
                (),
            ))?
            .add(&none)?;
        let latencies = registry
            .add_summary(FamilyOpts::new(
                REQUEST_LATENCIES,
                "Latencies of serving scrape requests, in microseconds",
                SummaryConfig::new(vec![
                    Quantile { quantile: 0.5, error: 0.05 },
                    Quantile { quantile: 0.9, error: 0.01 },
                    Quantile { quantile: 0.99, error: 0.001 },
                ]),
            ))?
            .add(&none)?;

        Ok(Self {
            registry,
            bytes_transferred,
            scrapes,
            latencies,
        })
    }

    /// Account one served scrape.
    pub fn record(&self, bytes: usize, elapsed: Duration) {
        self.bytes_transferred.inc_by(bytes as u64);
        self.scrapes.inc();
        self.latencies.observe(elapsed.as_secs_f64() * 1e6);
    }

    /// Registry holding the self-metric families.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn scrapes(&self) -> f64 {
        self.scrapes.value()
    }

    pub fn bytes_transferred(&self) -> f64 {
        self.bytes_transferred.value()
    }
}
