//! Update gating and rendering shared by every metric kind.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tickmeter_core::{
    CpuMetric, DateMetric, Metric, MetricState, RequestCounter, RequestRateMetric,
};

/// Counts how many times `update` actually ran.
struct Probe {
    state: MetricState,
    updates: AtomicUsize,
}

impl Probe {
    fn new(interval: Duration) -> Self {
        Self {
            state: MetricState::new("Probe:", interval),
            updates: AtomicUsize::new(0),
        }
    }
}

impl Metric for Probe {
    fn state(&self) -> &MetricState {
        &self.state
    }

    fn update(&self) {
        let n = self.updates.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.set_value(n.to_string());
    }
}

#[test]
fn collect_is_empty_until_first_update() {
    let counter = Arc::new(RequestCounter::new());
    let metrics: Vec<Box<dyn Metric>> = vec![
        Box::new(DateMetric::new("Date:", Duration::from_secs(1))),
        Box::new(CpuMetric::new("CPU:", Duration::from_secs(1))),
        Box::new(RequestRateMetric::new("PRS:", Duration::from_secs(1), counter)),
    ];

    for m in &metrics {
        assert_eq!(m.collect(), "", "label={}", m.label());
        m.update();
        let out = m.collect();
        let prefix = format!("{} ", m.label());
        assert!(out.starts_with(&prefix), "label={} out={out}", m.label());
        assert!(out.len() > prefix.len(), "label={} out={out}", m.label());
    }
}

#[test]
fn date_metric_renders_timestamp_shape() {
    let m = DateMetric::new("Date:", Duration::from_secs(1));
    m.update();
    let value = m.state().value();

    // YYYY-MM-DD HH:MM:SS
    assert_eq!(value.len(), 19, "value={value}");
    let bytes = value.as_bytes();
    assert_eq!(bytes[4], b'-');
    assert_eq!(bytes[7], b'-');
    assert_eq!(bytes[10], b' ');
    assert_eq!(bytes[13], b':');
    assert_eq!(bytes[16], b':');
}

#[test]
fn try_update_respects_interval() {
    let m = Probe::new(Duration::from_millis(200));

    assert!(m.try_update());
    assert_eq!(m.updates.load(Ordering::SeqCst), 1);

    assert!(!m.try_update());
    assert!(!m.try_update());
    assert_eq!(m.updates.load(Ordering::SeqCst), 1);

    thread::sleep(Duration::from_millis(250));
    assert!(m.try_update());
    assert_eq!(m.updates.load(Ordering::SeqCst), 2);
    assert_eq!(m.collect(), "Probe: 2");
}

#[test]
fn default_interval_is_one_second() {
    let m = DateMetric::new("Date:", tickmeter_core::DEFAULT_INTERVAL);
    assert_eq!(m.interval(), Duration::from_secs(1));
}

#[test]
fn collect_never_sees_partial_values() {
    let m = Arc::new(Probe::new(Duration::ZERO));
    let reader = {
        let m = Arc::clone(&m);
        thread::spawn(move || {
            for _ in 0..2_000 {
                let out = m.collect();
                if out.is_empty() {
                    continue;
                }
                let value = out.strip_prefix("Probe: ").expect("label prefix");
                value.parse::<usize>().expect("whole number");
            }
        })
    };

    for _ in 0..2_000 {
        m.try_update();
    }
    reader.join().unwrap();
}
