//! Sliding time window over rotating CKMS streams.
//!
//! Every observation goes into all `age_buckets` streams. Queries read the
//! oldest live stream, which covers roughly the last `max_age`. Every
//! `max_age / age_buckets` the head stream is reset and the head advances.

use std::time::{Duration, Instant};

use crate::metric::Quantile;

use super::ckms::CkmsStream;

#[derive(Debug)]
pub(crate) struct TimeWindowQuantiles {
    streams: Vec<CkmsStream>,
    head: usize,
    last_rotation: Instant,
    rotation_interval: Duration,
}

impl TimeWindowQuantiles {
    /// `age_buckets` must be in range and `max_age` non-zero (checked by the caller).
    pub(crate) fn new(targets: &[Quantile], max_age: Duration, age_buckets: usize) -> Self {
        let age_buckets = age_buckets.max(1);
        let rotation_interval = max_age / u32::try_from(age_buckets).unwrap_or(u32::MAX);
        Self {
            streams: (0..age_buckets).map(|_| CkmsStream::new(targets)).collect(),
            head: 0,
            last_rotation: Instant::now(),
            rotation_interval: rotation_interval.max(Duration::from_nanos(1)),
        }
    }

    pub(crate) fn insert(&mut self, value: f64) {
        self.rotate(Instant::now());
        for s in &mut self.streams {
            s.insert(value);
        }
    }

    pub(crate) fn query(&mut self, q: f64) -> f64 {
        self.rotate(Instant::now());
        self.streams[self.head].query(q)
    }

    fn rotate(&mut self, now: Instant) {
        let mut elapsed = now.saturating_duration_since(self.last_rotation);
        if elapsed <= self.rotation_interval {
            return;
        }
        let window = self
            .rotation_interval
            .saturating_mul(u32::try_from(self.streams.len()).unwrap_or(u32::MAX));
        if elapsed > window {
            // Idle for longer than the whole window: everything is stale.
            for s in &mut self.streams {
                s.reset();
            }
            self.last_rotation = now;
            return;
        }
        while elapsed > self.rotation_interval {
            self.streams[self.head].reset();
            self.head = (self.head + 1) % self.streams.len();
            self.last_rotation += self.rotation_interval;
            elapsed -= self.rotation_interval;
        }
    }
}
