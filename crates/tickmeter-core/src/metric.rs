//! The metric capability contract.
//!
//! A metric owns a [`MetricState`] (label, refresh interval, last rendered
//! value) and knows how to refresh itself. The manager polls every metric on
//! a fixed, fast tick through [`Metric::try_update`]; the per-metric interval
//! decides whether that poll actually refreshes anything.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Refresh interval used when none is configured.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Lock a mutex, recovering the guard if a previous holder panicked.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State shared by every metric kind.
///
/// The rendered value sits behind its own lock so `collect` from any thread
/// sees either the previous or the next value, never a partial write.
#[derive(Debug)]
pub struct MetricState {
    label: String,
    interval: Duration,
    value: Mutex<String>,
    // None until the first update, which makes a fresh metric due immediately.
    last_update: Mutex<Option<Instant>>,
}

impl MetricState {
    pub fn new(label: impl Into<String>, interval: Duration) -> Self {
        Self {
            label: label.into(),
            interval,
            value: Mutex::new(String::new()),
            last_update: Mutex::new(None),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Replace the rendered value.
    pub fn set_value(&self, value: String) {
        *lock(&self.value) = value;
    }

    /// Current rendered value (empty until the first update).
    pub fn value(&self) -> String {
        lock(&self.value).clone()
    }

    /// Last time `try_update` ran an update.
    pub fn last_update(&self) -> Option<Instant> {
        *lock(&self.last_update)
    }

    fn is_due(&self, now: Instant) -> bool {
        match *lock(&self.last_update) {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        }
    }

    fn mark_updated(&self, at: Instant) {
        *lock(&self.last_update) = Some(at);
    }

    fn render(&self) -> String {
        let value = lock(&self.value);
        if value.is_empty() {
            return String::new();
        }
        format!("{} {}", self.label, value)
    }
}

/// A unit of measurement polled by the manager.
///
/// Implementors provide `state` and `update`; the gating and rendering
/// methods should normally be left at their defaults.
pub trait Metric: Send + Sync {
    fn state(&self) -> &MetricState;

    /// Refresh the value from the metric's source.
    ///
    /// Only the update loop calls this, so calls for one instance never
    /// overlap. Must finish in bounded time (one file read at most).
    fn update(&self);

    fn label(&self) -> &str {
        self.state().label()
    }

    fn interval(&self) -> Duration {
        self.state().interval()
    }

    /// Run `update` if at least `interval` elapsed since the last real update.
    /// Returns whether an update ran.
    fn try_update(&self) -> bool {
        self.try_update_at(Instant::now())
    }

    /// Same gate as `try_update`, measured at `now` instead of the wall
    /// clock. A poller passing its own evenly spaced tick instants keeps
    /// scheduling jitter from pushing an elapsed interval just under the
    /// threshold.
    fn try_update_at(&self, now: Instant) -> bool {
        if !self.state().is_due(now) {
            return false;
        }
        self.update();
        self.state().mark_updated(now);
        true
    }

    /// `"<label> <value>"`, or an empty string before the first update.
    fn collect(&self) -> String {
        self.state().render()
    }
}
