use metrics::{counter, Counter};

/// Beacon consensus engine metrics.
#[derive(Clone)]
pub(crate) struct EngineMetrics {
    /// The total count of new payload messages received.
    pub(crate) new_payload_messages: Counter,
    /// The total count of forkchoice updated messages received.
    pub(crate) forkchoice_updated_messages: Counter,
    /// The total count of payloads buffered because their parent was
    /// unknown or its state unavailable.
    pub(crate) buffered_payloads: Counter,
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self {
            new_payload_messages: counter!("consensus_engine_beacon_new_payload_messages"),
            forkchoice_updated_messages: counter!(
                "consensus_engine_beacon_forkchoice_updated_messages"
            ),
            buffered_payloads: counter!("consensus_engine_beacon_buffered_payloads"),
        }
    }
}
