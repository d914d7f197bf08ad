/// The Engine API methods this node supports, as returned by
/// `engine_exchangeCapabilities`.
pub const CAPABILITIES: [&str; 6] = [
    "engine_newPayloadV1",
    "engine_forkchoiceUpdatedV1",
    "engine_getPayloadV1",
    "engine_getPayloadBodiesByHashV1",
    "engine_getPayloadBodiesByRangeV1",
    "engine_exchangeTransitionConfigurationV1",
];
