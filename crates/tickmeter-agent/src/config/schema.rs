use std::time::Duration;

use serde::Deserialize;
use tickmeter_core::error::{Result, TickError};
use tickmeter_core::DEFAULT_INTERVAL;

use crate::manager::{DEFAULT_TICK, DEFAULT_WRITE_INTERVAL};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    pub version: u32,

    #[serde(default)]
    pub sampler: SamplerSection,

    #[serde(default)]
    pub output: OutputSection,

    /// Spawn the demo traffic generator against the request counter.
    #[serde(default)]
    pub simulate_requests: bool,

    /// Registration order is output order.
    #[serde(default = "default_metrics")]
    pub metrics: Vec<MetricConfig>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            version: 1,
            sampler: SamplerSection::default(),
            output: OutputSection::default(),
            simulate_requests: false,
            metrics: default_metrics(),
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(TickError::UnsupportedVersion);
        }

        self.sampler.validate()?;
        self.output.validate()?;

        let mut request_rate = 0;
        for (i, m) in self.metrics.iter().enumerate() {
            m.validate(i)?;
            if m.kind == MetricKind::RequestRate {
                request_rate += 1;
            }
        }
        // The counter has exactly one consumer; two drainers would split counts.
        if request_rate > 1 {
            return Err(TickError::BadConfig(
                "at most one request_rate metric may be configured".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplerSection {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for SamplerSection {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
        }
    }
}

impl SamplerSection {
    pub fn validate(&self) -> Result<()> {
        if !(10..=60_000).contains(&self.tick_ms) {
            return Err(TickError::BadConfig(
                "sampler.tick_ms must be between 10 and 60000".into(),
            ));
        }
        Ok(())
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    #[serde(default = "default_output_path")]
    pub path: String,

    #[serde(default = "default_write_interval_ms")]
    pub write_interval_ms: u64,

    /// Print `collect()` to stdout from the binary.
    #[serde(default = "default_console")]
    pub console: bool,

    #[serde(default = "default_console_interval_ms")]
    pub console_interval_ms: u64,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            write_interval_ms: default_write_interval_ms(),
            console: default_console(),
            console_interval_ms: default_console_interval_ms(),
        }
    }
}

impl OutputSection {
    pub fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(TickError::BadConfig("output.path must not be empty".into()));
        }
        if !(10..=3_600_000).contains(&self.write_interval_ms) {
            return Err(TickError::BadConfig(
                "output.write_interval_ms must be between 10 and 3600000".into(),
            ));
        }
        if !(10..=3_600_000).contains(&self.console_interval_ms) {
            return Err(TickError::BadConfig(
                "output.console_interval_ms must be between 10 and 3600000".into(),
            ));
        }
        Ok(())
    }

    pub fn write_interval(&self) -> Duration {
        Duration::from_millis(self.write_interval_ms)
    }

    pub fn console_interval(&self) -> Duration {
        Duration::from_millis(self.console_interval_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Date,
    Cpu,
    RequestRate,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricConfig {
    pub kind: MetricKind,
    pub label: String,

    #[serde(default = "default_metric_interval_ms")]
    pub interval_ms: u64,

    /// cpu only: alternative proc-stat file.
    #[serde(default)]
    pub stat_path: Option<String>,
}

impl MetricConfig {
    fn new(kind: MetricKind, label: &str) -> Self {
        Self {
            kind,
            label: label.into(),
            interval_ms: default_metric_interval_ms(),
            stat_path: None,
        }
    }

    pub fn validate(&self, index: usize) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(TickError::BadConfig(format!(
                "metrics[{index}].label must not be empty"
            )));
        }
        if self.interval_ms == 0 {
            return Err(TickError::BadConfig(format!(
                "metrics[{index}].interval_ms must be at least 1"
            )));
        }
        if self.stat_path.is_some() && self.kind != MetricKind::Cpu {
            return Err(TickError::BadConfig(format!(
                "metrics[{index}].stat_path is only valid for kind cpu"
            )));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

fn default_tick_ms() -> u64 {
    DEFAULT_TICK.as_millis() as u64
}
fn default_output_path() -> String {
    "metrics.txt".into()
}
fn default_write_interval_ms() -> u64 {
    DEFAULT_WRITE_INTERVAL.as_millis() as u64
}
fn default_console() -> bool {
    true
}
fn default_console_interval_ms() -> u64 {
    1000
}
fn default_metric_interval_ms() -> u64 {
    DEFAULT_INTERVAL.as_millis() as u64
}

fn default_metrics() -> Vec<MetricConfig> {
    vec![
        MetricConfig::new(MetricKind::Date, "Date:"),
        MetricConfig::new(MetricKind::Cpu, "CPU:"),
        MetricConfig::new(MetricKind::RequestRate, "PRS:"),
    ]
}
