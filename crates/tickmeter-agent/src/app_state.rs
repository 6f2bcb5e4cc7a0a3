//! Shared application state for the tickmeter agent.
//!
//! Builds the request counter and the configured metrics, then hands them
//! to a [`MetricManager`]. Startup errors surface as `Result`.

use std::sync::Arc;

use tickmeter_core::error::Result;
use tickmeter_core::{CpuMetric, DateMetric, Metric, RequestCounter, RequestRateMetric};

use crate::config::{AgentConfig, MetricConfig, MetricKind};
use crate::manager::MetricManager;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: AgentConfig,
    counter: Arc<RequestCounter>,
    manager: MetricManager,
}

impl AppState {
    pub fn new(cfg: AgentConfig) -> Result<Self> {
        // configs built in code skip load_from_str
        cfg.validate()?;

        let counter = Arc::new(RequestCounter::new());
        let metrics = cfg
            .metrics
            .iter()
            .map(|m| build_metric(m, &counter))
            .collect();
        let manager = MetricManager::with_tick(metrics, cfg.sampler.tick());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                counter,
                manager,
            }),
        })
    }

    pub fn cfg(&self) -> &AgentConfig {
        &self.inner.cfg
    }

    /// Counter drained by the request-rate metric. Hand this to whatever
    /// originates requests.
    pub fn counter(&self) -> Arc<RequestCounter> {
        Arc::clone(&self.inner.counter)
    }

    pub fn manager(&self) -> &MetricManager {
        &self.inner.manager
    }

    /// Start the manager loops with the configured output settings.
    pub fn start(&self) -> Result<()> {
        let out = &self.cfg().output;
        self.manager().run(&out.path, out.write_interval())
    }
}

pub fn build_metric(cfg: &MetricConfig, counter: &Arc<RequestCounter>) -> Arc<dyn Metric> {
    let label = cfg.label.as_str();
    let interval = cfg.interval();
    match cfg.kind {
        MetricKind::Date => Arc::new(DateMetric::new(label, interval)),
        MetricKind::Cpu => match &cfg.stat_path {
            Some(path) => Arc::new(CpuMetric::with_stat_path(label, interval, path)),
            None => Arc::new(CpuMetric::new(label, interval)),
        },
        MetricKind::RequestRate => {
            Arc::new(RequestRateMetric::new(label, interval, Arc::clone(counter)))
        }
    }
}
