use metrics::{counter, Counter};

/// Payload builder service metrics.
#[derive(Clone)]
pub(crate) struct PayloadBuilderServiceMetrics {
    /// Total number of initiated payload build jobs.
    pub(crate) initiated_jobs: Counter,
    /// Total number of failed payload build jobs.
    pub(crate) failed_jobs: Counter,
    /// Total number of build requests answered from the payload store.
    pub(crate) reused_jobs: Counter,
}

impl Default for PayloadBuilderServiceMetrics {
    fn default() -> Self {
        Self {
            initiated_jobs: counter!("payload_builder_initiated_jobs"),
            failed_jobs: counter!("payload_builder_failed_jobs"),
            reused_jobs: counter!("payload_builder_reused_jobs"),
        }
    }
}
