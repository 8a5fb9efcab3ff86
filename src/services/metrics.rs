use std::time::Duration;

use vise::{Buckets, Counter, Histogram, Metrics, Unit};

#[derive(Debug, Metrics)]
#[metrics(prefix = "engine")]
pub struct EngineMetrics {
    /// Number of completed analyses
    pub analyses: Counter,

    /// Number of analyses that failed or timed out
    pub failed_analyses: Counter,

    /// Analysis latency in seconds
    #[metrics(buckets = Buckets::LATENCIES, unit = Unit::Seconds)]
    pub analysis_latency: Histogram<Duration>,
}

#[vise::register]
pub(crate) static ENGINE_METRICS: vise::Global<EngineMetrics> = vise::Global::new();
