use crate::{
    api::EngineApiServer, capabilities::CAPABILITIES, metrics::EngineApiMetrics, EngineApiError,
    EngineApiResult,
};
use ember_beacon_consensus::BeaconConsensusEngineHandle;
use ember_interfaces::provider::BlockProvider;
use ember_payload_builder::PayloadBuilderHandle;
use ember_primitives::{ChainSpec, B256, U64};
use ember_rpc_types::{
    ExecutionPayload, ExecutionPayloadBody, ForkchoiceState, ForkchoiceUpdated,
    PayloadAttributes, PayloadId, PayloadStatus, TransitionConfiguration,
};
use jsonrpsee::core::RpcResult;
use std::{sync::Arc, time::Instant};
use tracing::trace;

/// The upper bound of blocks a single payload-bodies request may ask for.
pub const MAX_PAYLOAD_BODIES_LIMIT: u64 = 1024;

/// The Engine API implementation that grants the consensus layer access to
/// data and functions in the execution layer that are crucial for the
/// consensus process.
///
/// Stateful calls are forwarded to the spawned
/// [`BeaconConsensusEngine`](ember_beacon_consensus::BeaconConsensusEngine);
/// payload retrieval is answered from the payload builder's store and the
/// read-only calls directly from the chain database.
#[derive(Clone)]
pub struct EngineApi<Provider> {
    /// The chain database, for the read-only subset of the API.
    provider: Provider,
    /// Consensus configuration.
    chain_spec: Arc<ChainSpec>,
    /// Frontend of the engine actor.
    beacon_consensus: BeaconConsensusEngineHandle,
    /// Frontend of the payload builder service.
    payload_store: PayloadBuilderHandle,
    /// Engine API metrics.
    metrics: EngineApiMetrics,
}

impl<Provider: BlockProvider + 'static> EngineApi<Provider> {
    /// Creates a new Engine API handler.
    pub fn new(
        provider: Provider,
        chain_spec: Arc<ChainSpec>,
        beacon_consensus: BeaconConsensusEngineHandle,
        payload_store: PayloadBuilderHandle,
    ) -> Self {
        Self { provider, chain_spec, beacon_consensus, payload_store, metrics: Default::default() }
    }

    /// See also `engine_newPayloadV1`.
    pub async fn new_payload(
        &self,
        payload: ExecutionPayload,
    ) -> EngineApiResult<PayloadStatus> {
        Ok(self.beacon_consensus.new_payload(payload).await?)
    }

    /// See also `engine_forkchoiceUpdatedV1`.
    pub async fn fork_choice_updated(
        &self,
        state: ForkchoiceState,
        payload_attrs: Option<PayloadAttributes>,
    ) -> EngineApiResult<ForkchoiceUpdated> {
        Ok(self.beacon_consensus.fork_choice_updated(state, payload_attrs).await?)
    }

    /// Returns the most recent version of the payload that is available in
    /// the corresponding payload build process at the time of receiving
    /// this call.
    ///
    /// See also `engine_getPayloadV1`.
    pub async fn get_payload(&self, payload_id: PayloadId) -> EngineApiResult<ExecutionPayload> {
        self.payload_store
            .get_payload(payload_id)
            .await
            .map(Into::into)
            .ok_or(EngineApiError::UnknownPayload)
    }

    /// Returns the execution payload bodies by the given hashes, `None` for
    /// blocks this node does not know.
    ///
    /// See also `engine_getPayloadBodiesByHashV1`.
    pub fn get_payload_bodies_by_hash(
        &self,
        hashes: Vec<B256>,
    ) -> EngineApiResult<Vec<Option<ExecutionPayloadBody>>> {
        let len = hashes.len() as u64;
        if len > MAX_PAYLOAD_BODIES_LIMIT {
            return Err(EngineApiError::PayloadRequestTooLarge { len })
        }

        let mut result = Vec::with_capacity(hashes.len());
        for hash in hashes {
            let block = self.provider.block(&hash)?;
            result.push(block.map(|block| block.body.into()));
        }
        Ok(result)
    }

    /// Returns the execution payload bodies of the canonical range
    /// `[start, start + count)`, `None` past the current tip.
    ///
    /// See also `engine_getPayloadBodiesByRangeV1`.
    pub fn get_payload_bodies_by_range(
        &self,
        start: u64,
        count: u64,
    ) -> EngineApiResult<Vec<Option<ExecutionPayloadBody>>> {
        if start == 0 || count == 0 {
            return Err(EngineApiError::InvalidBodiesRange { start, count })
        }
        if count > MAX_PAYLOAD_BODIES_LIMIT {
            return Err(EngineApiError::PayloadRequestTooLarge { len: count })
        }

        let mut result = Vec::with_capacity(count as usize);
        for number in start..start + count {
            let block = match self.provider.canonical_hash(number)? {
                Some(hash) => self.provider.block(&hash)?,
                None => None,
            };
            result.push(block.map(|block| block.body.into()));
        }
        Ok(result)
    }

    /// Called to verify the transition configuration parameters and ensure
    /// that the consensus and execution layers are using the latest
    /// configuration.
    ///
    /// See also `engine_exchangeTransitionConfigurationV1`.
    pub fn exchange_transition_configuration(
        &self,
        config: TransitionConfiguration,
    ) -> EngineApiResult<TransitionConfiguration> {
        let TransitionConfiguration {
            terminal_total_difficulty,
            terminal_block_hash,
            terminal_block_number,
        } = config;

        let merge_terminal_td = self
            .chain_spec
            .terminal_total_difficulty
            .ok_or(EngineApiError::UnknownMergeTerminalTotalDifficulty)?;

        // compared bit-exact to the consensus client's value
        if merge_terminal_td != terminal_total_difficulty {
            return Err(EngineApiError::TerminalTD {
                execution: merge_terminal_td,
                consensus: terminal_total_difficulty,
            })
        }

        // short circuit if the communicated block hash is zero
        if terminal_block_hash.is_zero() {
            return Ok(TransitionConfiguration {
                terminal_total_difficulty: merge_terminal_td,
                ..Default::default()
            })
        }

        let local_hash = self.provider.canonical_hash(terminal_block_number.to())?;
        match local_hash {
            Some(hash) if hash == terminal_block_hash => Ok(TransitionConfiguration {
                terminal_total_difficulty: merge_terminal_td,
                terminal_block_hash,
                terminal_block_number,
            }),
            _ => Err(EngineApiError::TerminalBlockHash {
                execution: local_hash,
                consensus: terminal_block_hash,
            }),
        }
    }
}

#[async_trait::async_trait]
impl<Provider: BlockProvider + Clone + 'static> EngineApiServer for EngineApi<Provider> {
    async fn new_payload_v1(&self, payload: ExecutionPayload) -> RpcResult<PayloadStatus> {
        trace!(target: "rpc::engine", "serving engine_newPayloadV1");
        let start = Instant::now();
        let res = self.new_payload(payload).await;
        self.metrics.latency.new_payload_v1.record(start.elapsed().as_secs_f64());
        self.metrics.new_payload_response.update_response_metrics(&res);
        Ok(res?)
    }

    async fn fork_choice_updated_v1(
        &self,
        fork_choice_state: ForkchoiceState,
        payload_attributes: Option<PayloadAttributes>,
    ) -> RpcResult<ForkchoiceUpdated> {
        trace!(target: "rpc::engine", "serving engine_forkchoiceUpdatedV1");
        let start = Instant::now();
        let res = self.fork_choice_updated(fork_choice_state, payload_attributes).await;
        self.metrics.latency.fork_choice_updated_v1.record(start.elapsed().as_secs_f64());
        self.metrics.fcu_response.update_response_metrics(&res);
        Ok(res?)
    }

    async fn get_payload_v1(&self, payload_id: PayloadId) -> RpcResult<ExecutionPayload> {
        trace!(target: "rpc::engine", "serving engine_getPayloadV1");
        let start = Instant::now();
        let res = self.get_payload(payload_id).await;
        self.metrics.latency.get_payload_v1.record(start.elapsed().as_secs_f64());
        Ok(res?)
    }

    async fn get_payload_bodies_by_hash_v1(
        &self,
        block_hashes: Vec<B256>,
    ) -> RpcResult<Vec<Option<ExecutionPayloadBody>>> {
        trace!(target: "rpc::engine", "serving engine_getPayloadBodiesByHashV1");
        let start = Instant::now();
        let res = self.get_payload_bodies_by_hash(block_hashes);
        self.metrics.latency.get_payload_bodies_by_hash_v1.record(start.elapsed().as_secs_f64());
        Ok(res?)
    }

    async fn get_payload_bodies_by_range_v1(
        &self,
        start: U64,
        count: U64,
    ) -> RpcResult<Vec<Option<ExecutionPayloadBody>>> {
        trace!(target: "rpc::engine", "serving engine_getPayloadBodiesByRangeV1");
        let started_at = Instant::now();
        let res = self.get_payload_bodies_by_range(start.to(), count.to());
        self.metrics
            .latency
            .get_payload_bodies_by_range_v1
            .record(started_at.elapsed().as_secs_f64());
        Ok(res?)
    }

    async fn exchange_transition_configuration(
        &self,
        transition_configuration: TransitionConfiguration,
    ) -> RpcResult<TransitionConfiguration> {
        trace!(target: "rpc::engine", "serving engine_exchangeTransitionConfigurationV1");
        let start = Instant::now();
        let res = self.exchange_transition_configuration(transition_configuration);
        self.metrics
            .latency
            .exchange_transition_configuration
            .record(start.elapsed().as_secs_f64());
        Ok(res?)
    }

    async fn exchange_capabilities(&self, _capabilities: Vec<String>) -> RpcResult<Vec<String>> {
        Ok(CAPABILITIES.iter().map(|capability| capability.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use ember_beacon_consensus::{BeaconConsensusEngine, MergeLatch};
    use ember_blockchain_tree::BlockchainTree;
    use ember_interfaces::{
        provider::HeaderProvider,
        test_utils::{random_block, MockExecutor, MockPool, MockProvider},
    };
    use ember_payload_builder::{PayloadBuilder, PayloadBuilderConfig, PayloadBuilderService};
    use ember_primitives::{
        constants::EMPTY_OMMER_ROOT_HASH, proofs, BlockBody, Header, SealedBlock, U256,
    };
    use ember_rpc_types::PayloadStatusEnum;

    const TTD: u64 = 1_000;

    fn genesis_header() -> Header {
        Header {
            ommers_hash: EMPTY_OMMER_ROOT_HASH,
            transactions_root: proofs::EMPTY_ROOT_HASH,
            receipts_root: proofs::EMPTY_ROOT_HASH,
            difficulty: U256::from(TTD),
            gas_limit: 30_000_000,
            timestamp: 1_000,
            base_fee_per_gas: Some(1_000_000_000),
            ..Default::default()
        }
    }

    fn spawn_api() -> (EngineApi<MockProvider>, MockProvider) {
        let genesis = genesis_header();
        let chain_spec = Arc::new(ChainSpec {
            chain_id: 1,
            genesis: genesis.clone(),
            terminal_total_difficulty: Some(U256::from(TTD)),
            ..Default::default()
        });

        let provider = MockProvider::default();
        provider.add_canonical_block(
            SealedBlock::new(genesis.seal_slow(), BlockBody::default()),
            U256::from(TTD),
        );

        let executor = MockExecutor::default();
        let pool = MockPool::default();
        let tree = BlockchainTree::new(
            provider.clone(),
            executor.clone(),
            pool.clone(),
            chain_spec.clone(),
        );
        let builder = PayloadBuilder::new(
            provider.clone(),
            executor.clone(),
            pool,
            chain_spec.clone(),
            PayloadBuilderConfig::default(),
        );
        let (payload_service, payload_store) = PayloadBuilderService::new(builder);
        tokio::spawn(payload_service);

        let (engine, beacon_consensus) = BeaconConsensusEngine::new(
            chain_spec.clone(),
            tree,
            executor,
            payload_store.clone(),
            Arc::new(MergeLatch::default()),
        );
        tokio::spawn(engine);

        (EngineApi::new(provider.clone(), chain_spec, beacon_consensus, payload_store), provider)
    }

    #[tokio::test]
    async fn payload_unknown() {
        let (api, _) = spawn_api();
        let result = api.get_payload(PayloadId::new([1; 8])).await;
        assert_matches!(result, Err(EngineApiError::UnknownPayload));
    }

    #[tokio::test]
    async fn new_payload_is_forwarded_to_the_engine() {
        let (api, provider) = spawn_api();
        let genesis_hash = provider.chain_info().unwrap().best_hash;
        let parent = provider.sealed_header(&genesis_hash).unwrap().unwrap();

        let block = SealedBlock::new(
            Header {
                parent_hash: parent.hash(),
                ommers_hash: EMPTY_OMMER_ROOT_HASH,
                transactions_root: proofs::EMPTY_ROOT_HASH,
                receipts_root: proofs::EMPTY_ROOT_HASH,
                number: 1,
                gas_limit: parent.gas_limit,
                timestamp: parent.timestamp + 12,
                base_fee_per_gas: parent.next_block_base_fee(Default::default()),
                ..Default::default()
            }
            .seal_slow(),
            BlockBody::default(),
        );

        let status = api.new_payload(ExecutionPayload::from(block.clone())).await.unwrap();
        assert_eq!(status, PayloadStatus::new(PayloadStatusEnum::Valid, block.hash()));

        let updated = api
            .fork_choice_updated(
                ForkchoiceState {
                    head_block_hash: block.hash(),
                    safe_block_hash: B256::ZERO,
                    finalized_block_hash: B256::ZERO,
                },
                None,
            )
            .await
            .unwrap();
        assert!(updated.is_valid());
        assert_eq!(provider.chain_info().unwrap().best_hash, block.hash());
    }

    #[tokio::test]
    async fn payload_bodies_by_hash_pads_unknown_blocks() {
        let (api, provider) = spawn_api();
        let known = random_block(7, None, Some(2));
        provider.add_block(known.clone());

        let bodies = api
            .get_payload_bodies_by_hash(vec![known.hash(), B256::with_last_byte(0xff)])
            .unwrap();
        assert_eq!(bodies.len(), 2);
        assert_eq!(
            bodies[0],
            Some(ExecutionPayloadBody { transactions: known.body.transactions.clone() })
        );
        assert_eq!(bodies[1], None);
    }

    #[tokio::test]
    async fn payload_bodies_by_hash_enforces_the_limit() {
        let (api, _) = spawn_api();
        let hashes = vec![B256::ZERO; MAX_PAYLOAD_BODIES_LIMIT as usize + 1];
        assert_matches!(
            api.get_payload_bodies_by_hash(hashes),
            Err(EngineApiError::PayloadRequestTooLarge { .. })
        );
    }

    #[tokio::test]
    async fn payload_bodies_by_range_validates_the_request() {
        let (api, _) = spawn_api();
        assert_matches!(
            api.get_payload_bodies_by_range(0, 5),
            Err(EngineApiError::InvalidBodiesRange { start: 0, count: 5 })
        );
        assert_matches!(
            api.get_payload_bodies_by_range(1, 0),
            Err(EngineApiError::InvalidBodiesRange { start: 1, count: 0 })
        );
        assert_matches!(
            api.get_payload_bodies_by_range(1, MAX_PAYLOAD_BODIES_LIMIT + 1),
            Err(EngineApiError::PayloadRequestTooLarge { .. })
        );

        // past the tip the entries are null
        let bodies = api.get_payload_bodies_by_range(1, 2).unwrap();
        assert_eq!(bodies, vec![None, None]);
    }

    #[tokio::test]
    async fn transition_configuration_td_mismatch() {
        let (api, _) = spawn_api();
        let config = TransitionConfiguration {
            terminal_total_difficulty: U256::from(TTD + 1),
            ..Default::default()
        };
        assert_matches!(
            api.exchange_transition_configuration(config),
            Err(EngineApiError::TerminalTD { execution, consensus })
                if execution == U256::from(TTD) && consensus == U256::from(TTD + 1)
        );
    }

    #[tokio::test]
    async fn transition_configuration_matches() {
        let (api, provider) = spawn_api();
        let genesis_hash = provider.chain_info().unwrap().best_hash;

        // zero terminal block hash short circuits
        let config = TransitionConfiguration {
            terminal_total_difficulty: U256::from(TTD),
            ..Default::default()
        };
        assert_eq!(api.exchange_transition_configuration(config).unwrap(), config);

        // the genesis is the terminal block of this chain
        let config = TransitionConfiguration {
            terminal_total_difficulty: U256::from(TTD),
            terminal_block_hash: genesis_hash,
            terminal_block_number: U64::ZERO,
        };
        assert_eq!(api.exchange_transition_configuration(config).unwrap(), config);
    }

    #[tokio::test]
    async fn transition_configuration_block_mismatch() {
        let (api, _) = spawn_api();
        let config = TransitionConfiguration {
            terminal_total_difficulty: U256::from(TTD),
            terminal_block_hash: B256::with_last_byte(0xcd),
            terminal_block_number: U64::from(99u64),
        };
        assert_matches!(
            api.exchange_transition_configuration(config),
            Err(EngineApiError::TerminalBlockHash { execution: None, .. })
        );
    }

    #[tokio::test]
    async fn capabilities_roundtrip() {
        let (api, _) = spawn_api();
        let capabilities = EngineApiServer::exchange_capabilities(&api, Vec::new()).await.unwrap();
        assert_eq!(capabilities, CAPABILITIES.map(str::to_string).to_vec());
    }
}
