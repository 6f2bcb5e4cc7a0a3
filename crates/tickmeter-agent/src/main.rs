//! tickmeter agent
//!
//! - Samples date, CPU, and request-rate metrics on a fixed tick
//! - Appends one aggregated line per write interval to the output file
//! - Optionally echoes the line to stdout and simulates request traffic
//! - Ctrl-C stops both loops cleanly

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_subscriber::{fmt, EnvFilter};

use tickmeter_agent::{app_state::AppState, config, shutdown, simulate};
use tickmeter_core::error::{Result, TickError};

const DEFAULT_CONFIG_PATH: &str = "tickmeter.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    // An explicit path must exist; the default one may be absent.
    let cfg = match std::env::args().nth(1) {
        Some(path) => config::load_from_file(&path)?,
        None => config::load_from_file_or_default(DEFAULT_CONFIG_PATH)?,
    };

    let state = AppState::new(cfg)?;
    state.start()?;

    let (stop_tx, stop_rx) = watch::channel(false);
    let mut helpers = Vec::new();
    if state.cfg().simulate_requests {
        helpers.push(simulate::spawn_traffic(state.counter(), stop_rx.clone()));
    }
    if state.cfg().output.console {
        helpers.push(spawn_console(state.clone(), stop_rx));
    }

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| TickError::Internal(format!("ctrl-c handler failed: {e}")))?;
    tracing::info!("shutdown requested");

    let _ = stop_tx.send(true);
    for h in helpers {
        let _ = h.await;
    }
    state.manager().stop().await;
    Ok(())
}

fn spawn_console(state: AppState, mut stop: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let every = state.cfg().output.console_interval();
        loop {
            tokio::select! {
                biased;
                _ = shutdown::requested(&mut stop) => break,
                _ = tokio::time::sleep(every) => {}
            }
            // collect() already ends with a newline
            print!("{}", state.manager().collect());
        }
    })
}
