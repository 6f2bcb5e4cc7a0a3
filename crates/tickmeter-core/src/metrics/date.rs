use std::time::Duration;

use crate::metric::{Metric, MetricState};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Local wall-clock time, `YYYY-MM-DD HH:MM:SS`.
#[derive(Debug)]
pub struct DateMetric {
    state: MetricState,
}

impl DateMetric {
    pub fn new(label: impl Into<String>, interval: Duration) -> Self {
        Self {
            state: MetricState::new(label, interval),
        }
    }
}

impl Metric for DateMetric {
    fn state(&self) -> &MetricState {
        &self.state
    }

    fn update(&self) {
        let now = chrono::Local::now();
        self.state.set_value(now.format(DATE_FORMAT).to_string());
    }
}
