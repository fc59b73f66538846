#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::thread;

use promkit_core::snapshot::HistogramSnapshot;
use promkit_core::{Buckets, Histogram, Metric, MetricValue, MetricsError};

fn snapshot(h: &Histogram) -> HistogramSnapshot {
    match h.collect() {
        MetricValue::Histogram(s) => s,
        other => panic!("unexpected value {other:?}"),
    }
}

fn assert_cumulative(s: &HistogramSnapshot) {
    for w in s.buckets.windows(2) {
        assert!(w[0].cumulative_count <= w[1].cumulative_count, "{s:?}");
    }
    assert_eq!(s.buckets.last().unwrap().cumulative_count, s.count);
    assert_eq!(s.buckets.last().unwrap().upper_bound, f64::INFINITY);
}

#[test]
fn observe_five_and_fifteen() {
    let buckets = Buckets::linear(0.0, 1.0, 10).unwrap();
    assert_eq!(buckets.bounds(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    let h = Histogram::with_buckets(&buckets);
    h.observe(5.0);
    h.observe(15.0);

    let s = snapshot(&h);
    assert_eq!(s.buckets.len(), 11);
    assert_eq!(s.buckets[4].cumulative_count, 0);
    for b in &s.buckets[5..10] {
        assert_eq!(b.cumulative_count, 1, "bound {}", b.upper_bound);
    }
    assert_eq!(s.buckets[10].cumulative_count, 2);
    assert_eq!(s.sum, 20.0);
    assert_eq!(s.count, 2);
    assert_cumulative(&s);
}

#[test]
fn value_on_boundary_counts_in_that_bucket() {
    let h = Histogram::with_buckets(&Buckets::new(vec![1.0, 2.0]).unwrap());
    h.observe(1.0);
    let s = snapshot(&h);
    assert_eq!(s.buckets[0].cumulative_count, 1);
}

#[test]
fn invariant_holds_under_concurrent_observers() {
    let h = Arc::new(Histogram::with_buckets(&Buckets::default()));
    let threads: Vec<_> = (0..4)
        .map(|t| {
            let h = Arc::clone(&h);
            thread::spawn(move || {
                for i in 0..2_000u32 {
                    h.observe(((i * 37 + t) % 1_300) as f64 / 100.0);
                }
            })
        })
        .collect();

    // Scrape while writers run.
    for _ in 0..50 {
        assert_cumulative(&snapshot(&h));
    }
    for t in threads {
        t.join().unwrap();
    }
    let s = snapshot(&h);
    assert_cumulative(&s);
    assert_eq!(s.count, 8_000);
    assert_eq!(h.count(), 8_000);
}

#[test]
fn observe_multiple_adds_per_bucket() {
    let buckets = Buckets::linear(0.0, 1.0, 3).unwrap();
    let h = Histogram::with_buckets(&buckets);
    h.observe_multiple(&[1, 2, 3, 4], 17.5).unwrap();

    let s = snapshot(&h);
    let cumulative: Vec<u64> = s.buckets.iter().map(|b| b.cumulative_count).collect();
    assert_eq!(cumulative, vec![1, 3, 6, 10]);
    assert_eq!(s.count, 10);
    assert_eq!(s.sum, 17.5);
    assert_cumulative(&s);
}

#[test]
fn observe_multiple_rejects_wrong_length() {
    let h = Histogram::with_buckets(&Buckets::linear(0.0, 1.0, 3).unwrap());
    let err = h.observe_multiple(&[1, 2, 3], 1.0).expect_err("must fail");
    assert!(matches!(err, MetricsError::BucketCountMismatch { expected: 4, got: 3 }));
    assert_eq!(h.count(), 0);
    assert_eq!(h.sum(), 0.0);
}

#[test]
fn bucket_validation() {
    assert!(Buckets::new(vec![]).unwrap().bounds().is_empty());
    assert_eq!(
        Buckets::new(vec![1.0, f64::INFINITY]).unwrap().bounds(),
        &[1.0]
    );
    assert!(matches!(
        Buckets::new(vec![1.0, 1.0]),
        Err(MetricsError::InvalidBuckets(_))
    ));
    assert!(Buckets::new(vec![2.0, 1.0]).is_err());
    assert!(Buckets::new(vec![f64::NAN]).is_err());
    assert!(Buckets::linear(0.0, 0.0, 3).is_err());
    assert!(Buckets::linear(0.0, 1.0, 0).is_err());
    assert_eq!(
        Buckets::exponential(1.0, 2.0, 4).unwrap().bounds(),
        &[1.0, 2.0, 4.0, 8.0]
    );
    assert!(Buckets::exponential(0.0, 2.0, 4).is_err());
    assert!(Buckets::exponential(1.0, 1.0, 4).is_err());
}

#[test]
fn no_finite_buckets_only_inf() {
    let h = Histogram::with_buckets(&Buckets::new(vec![]).unwrap());
    h.observe(-3.0);
    let s = snapshot(&h);
    assert_eq!(s.buckets.len(), 1);
    assert_eq!(s.buckets[0].cumulative_count, 1);
    assert_eq!(s.sum, -3.0);
}
