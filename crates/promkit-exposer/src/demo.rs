//! Sample families driven by a pseudo-random tick, for manual scraping.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use promkit_core::error::Result;
use promkit_core::{
    Buckets, Counter, Family, FamilyOpts, Gauge, Histogram, LabelSet, Quantile, Registry, Summary,
    SummaryConfig,
};

const METHODS: [&str; 4] = ["GET", "PUT", "POST", "HEAD"];
const NUM_BUCKETS: usize = 10;

/// Xorshift64; the demo only needs cheap noise, not quality randomness.
pub struct XorShift(u64);

impl XorShift {
    pub fn seeded() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self(nanos | 1)
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
}

pub struct SampleMetrics {
    packets: [Arc<Counter>; 4],
    http_requests: Arc<Family<Counter>>,
    gauge_tx: Arc<Gauge>,
    gauge_rx: Arc<Gauge>,
    histogram_single: Arc<Histogram>,
    histogram_multi: Arc<Histogram>,
    bucket_increments: Vec<u64>,
    summary: Arc<Summary>,
}

impl SampleMetrics {
    pub fn register(registry: &Registry) -> Result<Self> {
        let packet_family = registry.add_counter(FamilyOpts::new(
            "observed_packets_total",
            "Number of observed packets",
            (),
        ))?;
        let packets = [
            packet_family.add_pairs(&[("protocol", "tcp"), ("direction", "rx")])?,
            packet_family.add_pairs(&[("protocol", "tcp"), ("direction", "tx")])?,
            packet_family.add_pairs(&[("protocol", "udp"), ("direction", "rx")])?,
            packet_family.add_pairs(&[("protocol", "udp"), ("direction", "tx")])?,
        ];

        let http_requests = registry.add_counter(FamilyOpts::new(
            "http_requests_total",
            "Number of HTTP requests",
            (),
        ))?;

        let gauges = registry.add_gauge(FamilyOpts::new(
            "gauge_requests_total",
            "Number of gauge requests",
            (),
        ))?;
        let gauge_tx = gauges.add_pairs(&[("type", "gauge"), ("direction", "tx")])?;
        let gauge_rx = gauges.add_pairs(&[("type", "gauge"), ("direction", "rx")])?;

        let buckets = Buckets::linear(0.0, 1.0, NUM_BUCKETS)?;
        let histogram_single = registry
            .add_histogram(FamilyOpts::new("name_histogram", "help histogram", buckets.clone()))?
            .add(&LabelSet::new())?;
        let histogram_multi = registry
            .add_histogram(FamilyOpts::new(
                "name_histogram_multiple",
                "help histogram multiple",
                buckets,
            ))?
            .add(&LabelSet::new())?;

        let summary = registry
            .add_summary(FamilyOpts::new(
                "name_summary_family",
                "help summary_family",
                SummaryConfig::new(vec![
                    Quantile { quantile: 0.5, error: 0.05 },
                    Quantile { quantile: 0.9, error: 0.01 },
                    Quantile { quantile: 0.95, error: 0.005 },
                    Quantile { quantile: 0.99, error: 0.001 },
                ]),
            ))?
            .add(&LabelSet::new())?;

        Ok(Self {
            packets,
            http_requests,
            gauge_tx,
            gauge_rx,
            histogram_single,
            histogram_multi,
            bucket_increments: (0..=NUM_BUCKETS as u64).collect(),
            summary,
        })
    }

    /// Advance every sample metric using one random draw.
    pub fn step(&self, r: u64) -> Result<()> {
        for (bit, counter) in self.packets.iter().enumerate() {
            if r & (1 << bit) != 0 {
                counter.inc();
            }
        }

        let method = METHODS[(r % METHODS.len() as u64) as usize];
        self.http_requests.add_pairs(&[("method", method)])?.inc();

        self.gauge_tx.set_to_current_time();
        self.gauge_rx.inc();

        self.histogram_single.observe((r % 10) as f64);
        let weighted: f64 = self
            .bucket_increments
            .iter()
            .enumerate()
            .map(|(i, n)| i as f64 * *n as f64)
            .sum();
        self.histogram_multi
            .observe_multiple(&self.bucket_increments, weighted)?;

        self.summary.observe((r % 1000) as f64);

        tracing::debug!(r, method, "sample metrics updated");
        Ok(())
    }
}
