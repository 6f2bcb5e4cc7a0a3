//! Demo request traffic.
//!
//! Nothing in the agent serves real requests, so this task feeds the
//! request counter with an uneven pattern: rounds alternating two quick
//! requests followed by a 2 s pause with a burst of twenty requests spaced
//! 100 ms apart, and 1.5 s between rounds.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use tickmeter_core::RequestCounter;

use crate::shutdown;

const ROUNDS: usize = 20;
const BURST: usize = 20;
const QUIET_PAUSE: Duration = Duration::from_secs(2);
const BURST_SPACING: Duration = Duration::from_millis(100);
const ROUND_PAUSE: Duration = Duration::from_millis(1500);

/// Spawn the generator; it runs until `stop` turns true or its sender
/// is dropped.
pub fn spawn_traffic(
    counter: Arc<RequestCounter>,
    mut stop: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("request simulator started");
        'outer: loop {
            for round in 0..ROUNDS {
                counter.increment();
                if round % 2 == 0 {
                    counter.increment();
                    if !pause(QUIET_PAUSE, &mut stop).await {
                        break 'outer;
                    }
                } else {
                    for _ in 0..BURST {
                        counter.increment();
                        if !pause(BURST_SPACING, &mut stop).await {
                            break 'outer;
                        }
                    }
                }
                if !pause(ROUND_PAUSE, &mut stop).await {
                    break 'outer;
                }
            }
        }
        tracing::info!("request simulator stopped");
    })
}

/// Sleep for `d`; false if shutdown arrived first.
async fn pause(d: Duration, stop: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        biased;
        _ = shutdown::requested(stop) => false,
        _ = tokio::time::sleep(d) => true,
    }
}
