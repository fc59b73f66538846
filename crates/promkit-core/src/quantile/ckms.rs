//! Targeted-quantile stream (Cormode, Korn, Muthukrishnan, Srivastava).
//!
//! Observations are buffered, then merged into a sorted sample list in
//! batches and compressed. Each sample carries its width `g` (rank gap to
//! the previous sample) and `delta` (rank uncertainty). The invariant
//! function keeps the rank error of every target `(φ, ε)` within `ε·n`.

use crate::metric::Quantile;

const BUFFER_CAPACITY: usize = 500;

#[derive(Debug, Clone, Copy)]
struct Sample {
    value: f64,
    width: f64,
    delta: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct CkmsStream {
    targets: Vec<Quantile>,
    samples: Vec<Sample>,
    buffer: Vec<f64>,
    /// Observations merged into `samples`.
    n: f64,
}

impl CkmsStream {
    pub(crate) fn new(targets: &[Quantile]) -> Self {
        Self {
            targets: targets.to_vec(),
            samples: Vec::new(),
            buffer: Vec::with_capacity(BUFFER_CAPACITY),
            n: 0.0,
        }
    }

    pub(crate) fn insert(&mut self, value: f64) {
        self.buffer.push(value);
        if self.buffer.len() >= BUFFER_CAPACITY {
            self.flush();
        }
    }

    pub(crate) fn reset(&mut self) {
        self.samples.clear();
        self.buffer.clear();
        self.n = 0.0;
    }

    pub(crate) fn count(&self) -> u64 {
        self.n as u64 + self.buffer.len() as u64
    }

    /// Estimate quantile `q`; NaN when nothing was observed.
    pub(crate) fn query(&mut self, q: f64) -> f64 {
        if self.samples.is_empty() {
            // Nothing merged yet: the buffer is still exact.
            if self.buffer.is_empty() {
                return f64::NAN;
            }
            self.buffer.sort_by(f64::total_cmp);
            let mut i = (self.buffer.len() as f64 * q).ceil() as usize;
            i = i.saturating_sub(1).min(self.buffer.len() - 1);
            return self.buffer[i];
        }
        self.flush();

        let mut target = (q * self.n).ceil();
        target += (self.invariant(target) / 2.0).ceil();

        let mut prev = self.samples[0];
        let mut rank = 0.0;
        for cur in &self.samples[1..] {
            rank += prev.width;
            if rank + cur.width + cur.delta > target {
                return prev.value;
            }
            prev = *cur;
        }
        prev.value
    }

    /// Allowed rank error at rank `r`: the minimum over all targets.
    fn invariant(&self, r: f64) -> f64 {
        let mut min = f64::MAX;
        for t in &self.targets {
            let f = if t.quantile * self.n <= r {
                2.0 * t.error * r / t.quantile
            } else {
                2.0 * t.error * (self.n - r) / (1.0 - t.quantile)
            };
            if f < min {
                min = f;
            }
        }
        min
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let mut batch = std::mem::take(&mut self.buffer);
        batch.sort_by(f64::total_cmp);
        self.merge(&batch);
        batch.clear();
        self.buffer = batch;
        self.compress();
    }

    fn merge(&mut self, sorted: &[f64]) {
        let mut rank = 0.0;
        let mut i = 0;
        for &value in sorted {
            let mut inserted = false;
            while i < self.samples.len() {
                let cur = self.samples[i];
                if cur.value > value {
                    let delta = (self.invariant(rank).floor() - 1.0).max(0.0);
                    self.samples.insert(
                        i,
                        Sample {
                            value,
                            width: 1.0,
                            delta,
                        },
                    );
                    i += 1;
                    inserted = true;
                    break;
                }
                rank += cur.width;
                i += 1;
            }
            if !inserted {
                self.samples.push(Sample {
                    value,
                    width: 1.0,
                    delta: 0.0,
                });
                i += 1;
            }
            self.n += 1.0;
            rank += 1.0;
        }
    }

    fn compress(&mut self) {
        if self.samples.len() < 2 {
            return;
        }
        let mut xi = self.samples.len() - 1;
        let mut x = self.samples[xi];
        let mut rank = self.n - 1.0 - x.width;

        let mut i = self.samples.len() - 1;
        while i > 0 {
            i -= 1;
            let c = self.samples[i];
            if c.width + x.width + x.delta <= self.invariant(rank) {
                x.width += c.width;
                self.samples[xi] = x;
                self.samples.remove(i);
                xi -= 1;
            } else {
                x = c;
                xi = i;
            }
            rank -= c.width;
        }
    }

    #[cfg(test)]
    fn sample_len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets() -> Vec<Quantile> {
        vec![
            Quantile { quantile: 0.5, error: 0.05 },
            Quantile { quantile: 0.9, error: 0.01 },
            Quantile { quantile: 0.99, error: 0.001 },
        ]
    }

    #[test]
    fn empty_stream_is_nan() {
        let mut s = CkmsStream::new(&targets());
        assert!(s.query(0.5).is_nan());
    }

    #[test]
    fn small_stream_is_exact() {
        let mut s = CkmsStream::new(&targets());
        for v in [3.0, 1.0, 2.0, 5.0, 4.0] {
            s.insert(v);
        }
        assert_eq!(s.query(0.5), 3.0);
        assert_eq!(s.query(0.99), 5.0);
    }

    #[test]
    fn rank_error_within_targets() {
        let mut s = CkmsStream::new(&targets());
        let n = 10_000u64;
        // Deterministic permutation of 0..n (n and 7919 are coprime).
        for i in 0..n {
            s.insert(((i * 7919) % n) as f64);
        }
        assert_eq!(s.count(), n);
        for t in targets() {
            let got = s.query(t.quantile);
            let want = t.quantile * n as f64;
            let allowed = t.error * n as f64 * 2.0 + 1.0;
            assert!(
                (got - want).abs() <= allowed,
                "q={} got={} want={} allowed={}",
                t.quantile,
                got,
                want,
                allowed
            );
        }
    }

    #[test]
    fn compression_bounds_memory() {
        let mut s = CkmsStream::new(&targets());
        for i in 0..100_000u64 {
            s.insert(((i * 7919) % 100_000) as f64);
        }
        s.query(0.5);
        assert!(s.sample_len() < 5_000, "samples={}", s.sample_len());
    }

    #[test]
    fn reset_clears() {
        let mut s = CkmsStream::new(&targets());
        for i in 0..1000 {
            s.insert(i as f64);
        }
        s.reset();
        assert_eq!(s.count(), 0);
        assert!(s.query(0.5).is_nan());
    }
}
