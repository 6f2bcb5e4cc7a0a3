//! MetricManager: owns the metric set and drives it from two tokio tasks.
//!
//! - update loop: every tick, `try_update` on each metric in registration order
//! - write loop: every write interval, append `collect()` to the output file
//!
//! Both loops watch one shutdown channel. Shutdown interrupts a sleep but
//! never an update pass or a write in progress.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use tickmeter_core::{Metric, Result, TickError};

use crate::shutdown;

/// Poll cadence of the update loop.
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);
/// Default pause between appended lines.
pub const DEFAULT_WRITE_INTERVAL: Duration = Duration::from_millis(1000);

const SEPARATOR: &str = " | ";
// tokio intervals reject a zero period
const MIN_PERIOD: Duration = Duration::from_millis(1);

type MetricList = Arc<RwLock<Vec<Arc<dyn Metric>>>>;

pub struct MetricManager {
    metrics: MetricList,
    tick: Duration,
    lifecycle: Mutex<Lifecycle>,
}

/// Stopped -> Running -> Stopping -> Stopped.
///
/// `Stopping` holds the path only; the handles are with the `stop` call
/// that is joining them.
enum Lifecycle {
    Stopped,
    Running(Loops),
    Stopping(PathBuf),
}

struct Loops {
    path: PathBuf,
    shutdown: watch::Sender<bool>,
    update: JoinHandle<()>,
    write: JoinHandle<()>,
}

impl MetricManager {
    pub fn new(metrics: Vec<Arc<dyn Metric>>) -> Self {
        Self::with_tick(metrics, DEFAULT_TICK)
    }

    pub fn with_tick(metrics: Vec<Arc<dyn Metric>>, tick: Duration) -> Self {
        Self {
            metrics: Arc::new(RwLock::new(metrics)),
            tick: tick.max(MIN_PERIOD),
            lifecycle: Mutex::new(Lifecycle::Stopped),
        }
    }

    /// Append a metric. Safe while running; the loops pick it up on
    /// their next pass.
    pub fn add_metric(&self, metric: Arc<dyn Metric>) {
        tracing::debug!(label = %metric.label(), "metric registered");
        self.metrics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(metric);
    }

    pub fn len(&self) -> usize {
        self.metrics.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Labels in registration order.
    pub fn labels(&self) -> Vec<String> {
        self.metrics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|m| m.label().to_string())
            .collect()
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Snapshot of every metric as one line: each metric's `collect()`
    /// followed by `" | "`, then a newline. Blank metrics leave an empty
    /// segment.
    pub fn collect(&self) -> String {
        render(&self.metrics)
    }

    /// True from `run` until `stop` has joined both loops.
    pub fn is_running(&self) -> bool {
        !matches!(*self.lock_lifecycle(), Lifecycle::Stopped)
    }

    /// Output file of the running (or still stopping) loops.
    pub fn path(&self) -> Option<PathBuf> {
        match &*self.lock_lifecycle() {
            Lifecycle::Stopped => None,
            Lifecycle::Running(loops) => Some(loops.path.clone()),
            Lifecycle::Stopping(path) => Some(path.clone()),
        }
    }

    /// Start the update and write loops on the current tokio runtime and
    /// return immediately.
    ///
    /// An output file that cannot be opened is logged and ends only the
    /// write loop; it is not an error here.
    pub fn run(&self, path: impl Into<PathBuf>, write_interval: Duration) -> Result<()> {
        let rt = tokio::runtime::Handle::try_current()
            .map_err(|e| TickError::NoRuntime(e.to_string()))?;

        let mut lifecycle = self.lock_lifecycle();
        if !matches!(*lifecycle, Lifecycle::Stopped) {
            return Err(TickError::AlreadyRunning);
        }

        let path = path.into();
        let write_interval = write_interval.max(MIN_PERIOD);
        let (shutdown, rx) = watch::channel(false);

        let update = rt.spawn(update_loop(Arc::clone(&self.metrics), self.tick, rx.clone()));
        let write = rt.spawn(write_loop(
            Arc::clone(&self.metrics),
            path.clone(),
            write_interval,
            rx,
        ));

        tracing::info!(
            path = %path.display(),
            tick_ms = self.tick.as_millis() as u64,
            write_interval_ms = write_interval.as_millis() as u64,
            metrics = self.len(),
            "metric manager started"
        );

        *lifecycle = Lifecycle::Running(Loops {
            path,
            shutdown,
            update,
            write,
        });
        Ok(())
    }

    /// Signal both loops and wait for them to exit. Returns immediately if
    /// stopped or if another `stop` is already joining, so repeated calls
    /// are fine. `run` keeps returning `AlreadyRunning` until the joins
    /// finish.
    pub async fn stop(&self) {
        let loops = {
            let mut lifecycle = self.lock_lifecycle();
            match std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
                Lifecycle::Running(loops) => {
                    *lifecycle = Lifecycle::Stopping(loops.path.clone());
                    loops
                }
                other => {
                    *lifecycle = other;
                    return;
                }
            }
        };
        // Back to Stopped even if this future is dropped mid-join; the
        // loops were already signalled and exit on their own.
        let _stopped = MarkStopped(&self.lifecycle);

        let _ = loops.shutdown.send(true);
        if let Err(e) = loops.update.await {
            tracing::error!(error = %e, "update loop aborted");
        }
        if let Err(e) = loops.write.await {
            tracing::error!(error = %e, "write loop aborted");
        }
        tracing::info!(path = %loops.path.display(), "metric manager stopped");
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct MarkStopped<'a>(&'a Mutex<Lifecycle>);

impl Drop for MarkStopped<'_> {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Lifecycle::Stopped;
    }
}

impl Default for MetricManager {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Drop for MetricManager {
    // Joining needs an await; signal and let the tasks wind down on their own.
    fn drop(&mut self) {
        let lifecycle = self
            .lifecycle
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Lifecycle::Running(loops) = lifecycle {
            let _ = loops.shutdown.send(true);
            tracing::debug!(path = %loops.path.display(), "metric manager dropped while running");
        }
    }
}

fn render(metrics: &RwLock<Vec<Arc<dyn Metric>>>) -> String {
    let metrics = metrics.read().unwrap_or_else(PoisonError::into_inner);
    let mut line = String::new();
    for m in metrics.iter() {
        line.push_str(&m.collect());
        line.push_str(SEPARATOR);
    }
    line.push('\n');
    line
}

fn snapshot(metrics: &RwLock<Vec<Arc<dyn Metric>>>) -> Vec<Arc<dyn Metric>> {
    metrics
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

async fn update_loop(metrics: MetricList, tick: Duration, mut stop: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // Tick instants are at least one tick apart under Delay, so a metric
        // whose interval equals the tick is due on every pass.
        let at = tokio::select! {
            biased;
            _ = shutdown::requested(&mut stop) => break,
            at = ticker.tick() => at.into_std(),
        };

        // Lock released before calling into metrics; each metric
        // serializes its own value. Sources may do blocking reads.
        let pass = snapshot(&metrics);
        let total = pass.len();
        let refreshed = tokio::task::spawn_blocking(move || {
            pass.iter().filter(|m| m.try_update_at(at)).count()
        })
        .await;

        match refreshed {
            Ok(refreshed) => tracing::trace!(refreshed, total, "update pass"),
            Err(e) => tracing::error!(error = %e, "update pass aborted"),
        }
    }

    tracing::debug!("update loop exited");
}

async fn write_loop(
    metrics: MetricList,
    path: PathBuf,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
) {
    let mut file = match open_append(&path).await {
        Ok(f) => f,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "cannot open metrics file; write loop not started");
            return;
        }
    };

    loop {
        tokio::select! {
            biased;
            _ = shutdown::requested(&mut stop) => break,
            _ = tokio::time::sleep(interval) => {}
        }

        let line = render(&metrics);
        if let Err(e) = append_line(&mut file, &line).await {
            tracing::error!(path = %path.display(), error = %e, "metrics write failed; write loop ending");
            break;
        }
        tracing::trace!(bytes = line.len(), "metrics line appended");
    }

    tracing::debug!(path = %path.display(), "write loop exited");
}

async fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path).await
}

async fn append_line(file: &mut File, line: &str) -> std::io::Result<()> {
    file.write_all(line.as_bytes()).await?;
    file.flush().await
}
