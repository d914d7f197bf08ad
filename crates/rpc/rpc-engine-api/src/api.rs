use ember_primitives::{B256, U64};
use ember_rpc_types::{
    ExecutionPayload, ExecutionPayloadBody, ForkchoiceState, ForkchoiceUpdated,
    PayloadAttributes, PayloadId, PayloadStatus, TransitionConfiguration,
};
use jsonrpsee::{core::RpcResult, proc_macros::rpc};

/// The Engine API rpc interface, exposed to the consensus client over the
/// authenticated transport.
///
/// See also <https://github.com/ethereum/execution-apis/blob/main/src/engine/paris.md>.
#[rpc(server, namespace = "engine")]
#[async_trait::async_trait]
pub trait EngineApi {
    /// Offers an execution payload for validation and import.
    #[method(name = "newPayloadV1")]
    async fn new_payload_v1(&self, payload: ExecutionPayload) -> RpcResult<PayloadStatus>;

    /// Updates the fork-choice state and optionally initiates a payload
    /// build process.
    #[method(name = "forkchoiceUpdatedV1")]
    async fn fork_choice_updated_v1(
        &self,
        fork_choice_state: ForkchoiceState,
        payload_attributes: Option<PayloadAttributes>,
    ) -> RpcResult<ForkchoiceUpdated>;

    /// Returns the most recent version of the payload with the given id.
    #[method(name = "getPayloadV1")]
    async fn get_payload_v1(&self, payload_id: PayloadId) -> RpcResult<ExecutionPayload>;

    /// Returns the bodies of the requested blocks, `null` for unknown ones.
    #[method(name = "getPayloadBodiesByHashV1")]
    async fn get_payload_bodies_by_hash_v1(
        &self,
        block_hashes: Vec<B256>,
    ) -> RpcResult<Vec<Option<ExecutionPayloadBody>>>;

    /// Returns the bodies of `count` canonical blocks starting at `start`.
    #[method(name = "getPayloadBodiesByRangeV1")]
    async fn get_payload_bodies_by_range_v1(
        &self,
        start: U64,
        count: U64,
    ) -> RpcResult<Vec<Option<ExecutionPayloadBody>>>;

    /// Verifies that both layers agree on the merge transition parameters.
    #[method(name = "exchangeTransitionConfigurationV1")]
    async fn exchange_transition_configuration(
        &self,
        transition_configuration: TransitionConfiguration,
    ) -> RpcResult<TransitionConfiguration>;

    /// Returns the list of Engine API methods this node supports.
    #[method(name = "exchangeCapabilities")]
    async fn exchange_capabilities(&self, capabilities: Vec<String>) -> RpcResult<Vec<String>>;
}
