//! CPU utilization from cumulative kernel tick counters.
//!
//! Utilization is the busy share of ticks elapsed between two reads, so the
//! value produced by the first update after construction is measured against
//! the construction-time baseline and should not be trusted.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::metric::{lock, Metric, MetricState};

/// Linux kernel/system statistics file.
pub const DEFAULT_STAT_PATH: &str = "/proc/stat";

const PERCENT: f64 = 100.0;

/// Cumulative ticks summed over every logical core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    /// idle + iowait
    pub idle: u64,
    /// user + nice + system + irq + softirq + steal
    pub busy: u64,
    /// Number of per-core `cpuN` lines seen.
    pub cores: usize,
}

impl CpuTimes {
    /// Parse proc-stat text. Only per-core `cpuN` lines are summed; the
    /// aggregate `cpu` line is skipped. Missing or malformed fields read as 0.
    pub fn parse(stat: &str) -> Self {
        let mut times = Self::default();
        for line in stat.lines() {
            let mut fields = line.split_whitespace();
            let Some(name) = fields.next() else { continue };
            let Some(id) = name.strip_prefix("cpu") else { continue };
            if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }

            let mut ticks = [0u64; 8];
            for (slot, field) in ticks.iter_mut().zip(fields) {
                *slot = field.parse().unwrap_or(0);
            }
            let [user, nice, system, idle, iowait, irq, softirq, steal] = ticks;

            times.idle += idle + iowait;
            times.busy += user + nice + system + irq + softirq + steal;
            times.cores += 1;
        }
        times
    }

    pub fn total(&self) -> u64 {
        self.idle + self.busy
    }

    /// Busy percentage over the ticks elapsed since `prev`.
    /// Zero when no ticks elapsed.
    pub fn busy_percent_since(&self, prev: &CpuTimes) -> f64 {
        let d_total = self.total().saturating_sub(prev.total());
        if d_total == 0 {
            return 0.0;
        }
        let d_busy = self.busy.saturating_sub(prev.busy);
        (PERCENT * d_busy as f64 / d_total as f64).min(PERCENT)
    }
}

/// Renders `"<pct>% <load>/<cores>"`, where load is the percentage scaled to
/// the number of cores (8 cores at 50% is a load of 4.00).
#[derive(Debug)]
pub struct CpuMetric {
    state: MetricState,
    stat_path: PathBuf,
    cores: usize,
    prev: Mutex<CpuTimes>,
}

impl CpuMetric {
    pub fn new(label: impl Into<String>, interval: Duration) -> Self {
        Self::with_stat_path(label, interval, DEFAULT_STAT_PATH)
    }

    /// Read ticks from `stat_path` instead of `/proc/stat`.
    pub fn with_stat_path(
        label: impl Into<String>,
        interval: Duration,
        stat_path: impl Into<PathBuf>,
    ) -> Self {
        let stat_path = stat_path.into();
        let baseline = read_times(&stat_path).unwrap_or_else(|| {
            tracing::warn!(path = %stat_path.display(), "cpu stats unavailable, reporting zero");
            CpuTimes::default()
        });

        Self {
            state: MetricState::new(label, interval),
            stat_path,
            cores: baseline.cores,
            prev: Mutex::new(baseline),
        }
    }

    /// Core count, fixed at construction.
    pub fn cores(&self) -> usize {
        self.cores
    }

    pub fn stat_path(&self) -> &Path {
        &self.stat_path
    }
}

impl Metric for CpuMetric {
    fn state(&self) -> &MetricState {
        &self.state
    }

    fn update(&self) {
        // An unreadable source renders a zero sample and keeps the old
        // baseline, so the next good read still yields a real delta.
        let percent = match read_times(&self.stat_path) {
            Some(cur) => {
                let mut prev = lock(&self.prev);
                let p = cur.busy_percent_since(&prev);
                *prev = cur;
                p
            }
            None => 0.0,
        };

        let load = percent * self.cores as f64 / PERCENT;
        self.state
            .set_value(format!("{percent:.1}% {load:.2}/{}", self.cores));
    }
}

fn read_times(path: &Path) -> Option<CpuTimes> {
    match fs::read_to_string(path) {
        Ok(s) => Some(CpuTimes::parse(&s)),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "cpu stats read failed");
            None
        }
    }
}
