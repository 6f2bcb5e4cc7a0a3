//! tickmeter core: the metric contract, built-in metrics, and the request counter.
//!
//! Everything here is runtime-agnostic. The agent crate drives these types
//! from its update and write loops; tests drive them directly.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. A metric that
//! cannot read its source renders a zero reading instead of failing, and
//! poisoned locks are recovered since the guarded values are plain strings.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod counter;
pub mod error;
pub mod metric;
pub mod metrics;

pub use counter::RequestCounter;
/// Shared result type.
pub use error::{Result, TickError};
pub use metric::{Metric, MetricState, DEFAULT_INTERVAL};
pub use metrics::{CpuMetric, CpuTimes, DateMetric, RequestRateMetric};
