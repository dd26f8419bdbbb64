//! Request instrumentation shared by every collector.
//!
//! The handles are cheap clones over the same underlying families, so one
//! [`RequestMetrics`] is created at startup and a clone of each family is
//! handed to every collector.

use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::Histogram;
use prometheus_client::registry::Registry;

pub const FAILURES_METRIC: &str = "entity_request_failures";
pub const DURATION_METRIC: &str = "entity_request_duration_seconds";

/// Upper bounds, in seconds, of the request duration buckets.
const DURATION_BUCKETS: [f64; 8] = [0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0];

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct CollectorLabels {
    pub collector: String,
}

impl CollectorLabels {
    pub fn new(collector: &str) -> Self {
        Self {
            collector: collector.to_string(),
        }
    }
}

pub type FailureCounter = Family<CollectorLabels, Counter>;
pub type DurationHistogram = Family<CollectorLabels, Histogram>;

fn new_duration_histogram() -> Histogram {
    Histogram::new(DURATION_BUCKETS.into_iter())
}

#[derive(Clone, Debug)]
pub struct RequestMetrics {
    pub failures: FailureCounter,
    pub duration: DurationHistogram,
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self {
            failures: FailureCounter::default(),
            duration: DurationHistogram::new_with_constructor(new_duration_histogram),
        }
    }

    /// Names occupied in the exposition by these instruments.
    pub fn names() -> [&'static str; 2] {
        [FAILURES_METRIC, DURATION_METRIC]
    }

    pub fn register(&self, registry: &mut Registry) {
        registry.register(
            FAILURES_METRIC,
            "Total number of failed requests to the API",
            self.failures.clone(),
        );
        registry.register(
            DURATION_METRIC,
            "Histogram of latencies for requests to the API",
            self.duration.clone(),
        );
    }
}

impl Default for RequestMetrics {
    fn default() -> Self {
        Self::new()
    }
}
