//! Request counter drain semantics.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tickmeter_core::{Metric, RequestCounter, RequestRateMetric};

#[test]
fn drains_increments_between_updates() {
    let counter = Arc::new(RequestCounter::new());
    let m = RequestRateMetric::new("PRS:", Duration::from_secs(1), Arc::clone(&counter));

    m.update();
    assert_eq!(m.collect(), "PRS: 0");

    for _ in 0..17 {
        m.counter().increment();
    }
    assert_eq!(counter.current(), 17);
    m.update();
    assert_eq!(m.collect(), "PRS: 17");
    assert_eq!(counter.current(), 0);

    m.update();
    assert_eq!(m.collect(), "PRS: 0");
}

#[test]
fn concurrent_producers_are_counted_exactly_once() {
    const PRODUCERS: usize = 8;
    const PER_PRODUCER: u64 = 10_000;

    let counter = Arc::new(RequestCounter::new());
    let m = RequestRateMetric::new("PRS:", Duration::ZERO, Arc::clone(&counter));
    let done = Arc::new(AtomicBool::new(false));

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|_| {
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                for _ in 0..PER_PRODUCER {
                    counter.increment();
                }
            })
        })
        .collect();

    let drainer = {
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut seen = 0u64;
            while !done.load(Ordering::Acquire) {
                m.update();
                seen += m.state().value().parse::<u64>().unwrap();
            }
            m.update();
            seen += m.state().value().parse::<u64>().unwrap();
            seen
        })
    };

    for p in producers {
        p.join().unwrap();
    }
    done.store(true, Ordering::Release);

    let seen = drainer.join().unwrap();
    assert_eq!(seen, PRODUCERS as u64 * PER_PRODUCER);
    assert_eq!(counter.current(), 0);
}
