use crate::EngineApiError;
use ember_rpc_types::{ForkchoiceUpdated, PayloadStatus, PayloadStatusEnum};
use metrics::{counter, histogram, Counter, Histogram};

/// All Engine API metrics.
#[derive(Clone, Default)]
pub(crate) struct EngineApiMetrics {
    /// Engine API latency metrics.
    pub(crate) latency: EngineApiLatencyMetrics,
    /// Engine API forkchoiceUpdated response type metrics.
    pub(crate) fcu_response: ForkchoiceUpdatedResponseMetrics,
    /// Engine API newPayload response type metrics.
    pub(crate) new_payload_response: NewPayloadStatusResponseMetrics,
}

/// Engine API latency metrics.
#[derive(Clone)]
pub(crate) struct EngineApiLatencyMetrics {
    /// Latency for `engine_newPayloadV1`.
    pub(crate) new_payload_v1: Histogram,
    /// Latency for `engine_forkchoiceUpdatedV1`.
    pub(crate) fork_choice_updated_v1: Histogram,
    /// Latency for `engine_getPayloadV1`.
    pub(crate) get_payload_v1: Histogram,
    /// Latency for `engine_getPayloadBodiesByHashV1`.
    pub(crate) get_payload_bodies_by_hash_v1: Histogram,
    /// Latency for `engine_getPayloadBodiesByRangeV1`.
    pub(crate) get_payload_bodies_by_range_v1: Histogram,
    /// Latency for `engine_exchangeTransitionConfigurationV1`.
    pub(crate) exchange_transition_configuration: Histogram,
}

impl Default for EngineApiLatencyMetrics {
    fn default() -> Self {
        Self {
            new_payload_v1: histogram!("engine_rpc_new_payload_v1"),
            fork_choice_updated_v1: histogram!("engine_rpc_fork_choice_updated_v1"),
            get_payload_v1: histogram!("engine_rpc_get_payload_v1"),
            get_payload_bodies_by_hash_v1: histogram!("engine_rpc_get_payload_bodies_by_hash_v1"),
            get_payload_bodies_by_range_v1: histogram!(
                "engine_rpc_get_payload_bodies_by_range_v1"
            ),
            exchange_transition_configuration: histogram!(
                "engine_rpc_exchange_transition_configuration"
            ),
        }
    }
}

/// Counters for the `engine_forkchoiceUpdatedV1` response types.
#[derive(Clone)]
pub(crate) struct ForkchoiceUpdatedResponseMetrics {
    /// The total count of forkchoice updated messages received.
    pub(crate) forkchoice_updated_messages: Counter,
    /// Responses answered with `VALID`.
    pub(crate) forkchoice_updated_valid: Counter,
    /// Responses answered with `INVALID`.
    pub(crate) forkchoice_updated_invalid: Counter,
    /// Responses answered with `SYNCING`.
    pub(crate) forkchoice_updated_syncing: Counter,
    /// Requests answered with an error instead of a payload status.
    pub(crate) forkchoice_updated_error: Counter,
}

impl Default for ForkchoiceUpdatedResponseMetrics {
    fn default() -> Self {
        Self {
            forkchoice_updated_messages: counter!("engine_rpc_forkchoice_updated_messages"),
            forkchoice_updated_valid: counter!("engine_rpc_forkchoice_updated_valid"),
            forkchoice_updated_invalid: counter!("engine_rpc_forkchoice_updated_invalid"),
            forkchoice_updated_syncing: counter!("engine_rpc_forkchoice_updated_syncing"),
            forkchoice_updated_error: counter!("engine_rpc_forkchoice_updated_error"),
        }
    }
}

impl ForkchoiceUpdatedResponseMetrics {
    /// Increment the counters based on the given rpc result.
    pub(crate) fn update_response_metrics(
        &self,
        result: &Result<ForkchoiceUpdated, EngineApiError>,
    ) {
        match result {
            Ok(response) => match response.payload_status.status {
                PayloadStatusEnum::Valid | PayloadStatusEnum::Accepted => {
                    self.forkchoice_updated_valid.increment(1)
                }
                PayloadStatusEnum::Syncing => self.forkchoice_updated_syncing.increment(1),
                PayloadStatusEnum::Invalid { .. } | PayloadStatusEnum::InvalidBlockHash { .. } => {
                    self.forkchoice_updated_invalid.increment(1)
                }
            },
            Err(_) => self.forkchoice_updated_error.increment(1),
        }
        self.forkchoice_updated_messages.increment(1);
    }
}

/// Counters for the `engine_newPayloadV1` response types.
#[derive(Clone)]
pub(crate) struct NewPayloadStatusResponseMetrics {
    /// The total count of new payload messages received.
    pub(crate) new_payload_messages: Counter,
    /// Responses answered with `VALID`.
    pub(crate) new_payload_valid: Counter,
    /// Responses answered with `INVALID`.
    pub(crate) new_payload_invalid: Counter,
    /// Responses answered with `SYNCING`.
    pub(crate) new_payload_syncing: Counter,
    /// Responses answered with `ACCEPTED`.
    pub(crate) new_payload_accepted: Counter,
    /// Requests answered with an error instead of a payload status.
    pub(crate) new_payload_error: Counter,
}

impl Default for NewPayloadStatusResponseMetrics {
    fn default() -> Self {
        Self {
            new_payload_messages: counter!("engine_rpc_new_payload_messages"),
            new_payload_valid: counter!("engine_rpc_new_payload_valid"),
            new_payload_invalid: counter!("engine_rpc_new_payload_invalid"),
            new_payload_syncing: counter!("engine_rpc_new_payload_syncing"),
            new_payload_accepted: counter!("engine_rpc_new_payload_accepted"),
            new_payload_error: counter!("engine_rpc_new_payload_error"),
        }
    }
}

impl NewPayloadStatusResponseMetrics {
    /// Increment the counters based on the given rpc result.
    pub(crate) fn update_response_metrics(&self, result: &Result<PayloadStatus, EngineApiError>) {
        match result {
            Ok(status) => match status.status {
                PayloadStatusEnum::Valid => self.new_payload_valid.increment(1),
                PayloadStatusEnum::Syncing => self.new_payload_syncing.increment(1),
                PayloadStatusEnum::Accepted => self.new_payload_accepted.increment(1),
                PayloadStatusEnum::Invalid { .. } | PayloadStatusEnum::InvalidBlockHash { .. } => {
                    self.new_payload_invalid.increment(1)
                }
            },
            Err(_) => self.new_payload_error.increment(1),
        }
        self.new_payload_messages.increment(1);
    }
}
