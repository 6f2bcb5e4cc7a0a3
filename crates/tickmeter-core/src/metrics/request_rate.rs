use std::sync::Arc;
use std::time::Duration;

use crate::counter::RequestCounter;
use crate::metric::{Metric, MetricState};

/// Requests counted during the most recent interval.
///
/// Each update drains the shared counter. Keep a single instance per
/// counter: two drainers would split the count between them.
#[derive(Debug)]
pub struct RequestRateMetric {
    state: MetricState,
    counter: Arc<RequestCounter>,
}

impl RequestRateMetric {
    pub fn new(label: impl Into<String>, interval: Duration, counter: Arc<RequestCounter>) -> Self {
        Self {
            state: MetricState::new(label, interval),
            counter,
        }
    }

    pub fn counter(&self) -> &Arc<RequestCounter> {
        &self.counter
    }
}

impl Metric for RequestRateMetric {
    fn state(&self) -> &MetricState {
        &self.state
    }

    fn update(&self) {
        let seen = self.counter.drain();
        self.state.set_value(seen.to_string());
    }
}
