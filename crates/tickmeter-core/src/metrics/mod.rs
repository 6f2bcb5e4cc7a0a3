//! Built-in metric kinds.

pub mod cpu;
pub mod date;
pub mod request_rate;

pub use cpu::{CpuMetric, CpuTimes};
pub use date::DateMetric;
pub use request_rate::RequestRateMetric;
