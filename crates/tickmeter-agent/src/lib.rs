//! tickmeter agent library entry.
//!
//! Wires the core metrics into a [`manager::MetricManager`] driven by tokio
//! tasks, loads the YAML config, and provides the demo traffic generator.
//! Consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod manager;
pub mod shutdown;
pub mod simulate;

pub use manager::{MetricManager, DEFAULT_TICK, DEFAULT_WRITE_INTERVAL};
