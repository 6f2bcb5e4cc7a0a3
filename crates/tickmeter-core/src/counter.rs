//! Lock-free request counter.
//!
//! Producers call [`RequestCounter::increment`] from any thread; the single
//! consumer ([`crate::RequestRateMetric`]) drains it once per interval. The
//! counter is an explicit object shared through `Arc`, not a process global,
//! so every test gets its own.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct RequestCounter {
    count: AtomicU64,
}

impl RequestCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request. Never blocks.
    pub fn increment(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Atomically read and reset to zero.
    ///
    /// Increments racing with the swap land either in this drain or the
    /// next one, never both and never neither.
    pub fn drain(&self) -> u64 {
        self.count.swap(0, Ordering::Relaxed)
    }

    /// Requests counted since the last drain.
    pub fn current(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}
