#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::thread;

use promkit_core::{Counter, ErrorClass, Gauge, MetricsError};

#[test]
fn concurrent_increments_sum_exactly() {
    let c = Arc::new(Counter::default());
    let threads: Vec<_> = (0..8)
        .map(|t| {
            let c = Arc::clone(&c);
            thread::spawn(move || {
                for _ in 0..10_000 {
                    c.increment(0.5 + t as f64).unwrap();
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }
    let expected: f64 = (0..8).map(|t| 10_000.0 * (0.5 + t as f64)).sum();
    assert_eq!(c.value(), expected);
}

#[test]
fn negative_delta_is_rejected_and_value_kept() {
    let c = Counter::default();
    c.increment(3.0).unwrap();
    let err = c.increment(-1.0).expect_err("must reject");
    assert!(matches!(err, MetricsError::NegativeDelta(d) if d == -1.0));
    assert_eq!(err.class(), ErrorClass::Usage);
    assert!(c.increment(f64::NAN).is_err());
    assert_eq!(c.value(), 3.0);
}

#[test]
fn zero_delta_is_allowed() {
    let c = Counter::default();
    c.increment(0.0).unwrap();
    c.inc();
    assert_eq!(c.value(), 1.0);
}

#[test]
fn gauge_ops() {
    let g = Gauge::default();
    g.set(10.0);
    g.inc();
    g.dec();
    g.increment(2.5);
    g.decrement(0.5);
    assert_eq!(g.value(), 12.0);
    g.set(-4.0);
    assert_eq!(g.value(), -4.0);
}

#[test]
fn gauge_set_to_current_time() {
    let g = Gauge::default();
    g.set_to_current_time();
    // Any date after 2020-01-01.
    assert!(g.value() > 1_577_836_800.0);
}

#[test]
fn concurrent_gauge_up_down_nets_zero() {
    let g = Arc::new(Gauge::default());
    let threads: Vec<_> = (0..4)
        .map(|i| {
            let g = Arc::clone(&g);
            thread::spawn(move || {
                for _ in 0..5_000 {
                    if i % 2 == 0 {
                        g.inc();
                    } else {
                        g.dec();
                    }
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }
    assert_eq!(g.value(), 0.0);
}
