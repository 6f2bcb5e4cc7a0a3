//! Config-driven wiring and the request simulator.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{sleep, timeout};

use tickmeter_agent::app_state::AppState;
use tickmeter_agent::{config, simulate};
use tickmeter_core::RequestCounter;

const STAT: &str = "cpu  2 0 2 8 0 0 0 0 0 0\ncpu0 1 0 1 4 0 0 0 0 0 0\ncpu1 1 0 1 4 0 0 0 0 0 0\n";

#[test]
fn builds_metrics_in_config_order() {
    let dir = tempfile::tempdir().unwrap();
    let stat = dir.path().join("stat");
    fs::write(&stat, STAT).unwrap();

    let yaml = format!(
        r#"
version: 1
metrics:
  - kind: request_rate
    label: "PRS:"
  - kind: cpu
    label: "CPU:"
    stat_path: "{}"
  - kind: date
    label: "Date:"
"#,
        stat.display()
    );
    let state = AppState::new(config::load_from_str(&yaml).unwrap()).unwrap();

    assert_eq!(state.manager().labels(), vec!["PRS:", "CPU:", "Date:"]);
    assert_eq!(state.manager().collect(), " |  |  | \n");
}

#[test]
fn rejects_invalid_config_built_in_code() {
    let mut cfg = config::AgentConfig::default();
    cfg.version = 3;
    let err = AppState::new(cfg).err().expect("must fail");
    assert_eq!(err.code().as_str(), "UNSUPPORTED_VERSION");
}

#[tokio::test]
async fn counter_feeds_request_rate_through_the_manager() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("metrics.txt");

    let yaml = format!(
        r#"
version: 1
sampler:
  tick_ms: 20
output:
  path: "{}"
  write_interval_ms: 40
metrics:
  - kind: request_rate
    label: "PRS:"
    interval_ms: 100000
"#,
        out.display()
    );
    let state = AppState::new(config::load_from_str(&yaml).unwrap()).unwrap();
    let counter = state.counter();
    for _ in 0..5 {
        counter.increment();
    }

    state.start().unwrap();
    sleep(Duration::from_millis(200)).await;
    state.manager().stop().await;

    // one real update (the interval is long), which drained all five
    assert_eq!(state.manager().collect(), "PRS: 5 | \n");
    assert_eq!(counter.current(), 0);
    let written = fs::read_to_string(&out).unwrap();
    assert!(written.lines().any(|l| l == "PRS: 5 | "), "written={written:?}");
}

#[tokio::test]
async fn simulator_counts_and_stops_promptly() {
    let counter = Arc::new(RequestCounter::new());
    let (stop_tx, stop_rx) = watch::channel(false);

    let task = simulate::spawn_traffic(Arc::clone(&counter), stop_rx);
    sleep(Duration::from_millis(150)).await;

    // first round: two requests, then a 2 s pause
    assert_eq!(counter.current(), 2);

    stop_tx.send(true).unwrap();
    timeout(Duration::from_secs(1), task)
        .await
        .expect("simulator must stop inside its pause")
        .unwrap();
}
