//! The payload assembly routine.

use crate::{BuiltPayload, PayloadBuilderAttributes, PayloadBuilderError};
use ember_interfaces::{executor::BlockExecutor, pool::TransactionPool, provider::HeaderProvider};
use ember_primitives::{
    constants::{EIP1559_INITIAL_BASE_FEE, EMPTY_OMMER_ROOT_HASH, MAXIMUM_EXTRA_DATA_SIZE},
    proofs, Block, BlockBody, Bytes, ChainSpec, Header, B256, B64, U256,
};
use std::sync::Arc;
use tracing::{debug, trace};

/// Static configuration of the payload builder.
#[derive(Debug, Clone, Default)]
pub struct PayloadBuilderConfig {
    /// The extra data stamped into locally built blocks.
    pub extra_data: Bytes,
}

/// Builds execution payloads on top of a parent block.
///
/// A build converts payload attributes into a sealed block: the transaction
/// pool supplies the ordered transaction list, the state executor produces
/// the commitments, and the EIP-1559 formula over the parent fixes the base
/// fee. Re-invoking a build with identical attributes yields a payload with
/// the same identifier, though its content may differ if the pool changed
/// in between.
#[derive(Debug, Clone)]
pub struct PayloadBuilder<Provider, Executor, Pool> {
    /// The chain database.
    provider: Provider,
    /// Executes the assembled body to obtain the header commitments.
    executor: Executor,
    /// Supplies the pending transactions.
    pool: Pool,
    /// The chain configuration.
    chain_spec: Arc<ChainSpec>,
    /// Builder configuration.
    config: PayloadBuilderConfig,
}

impl<Provider, Executor, Pool> PayloadBuilder<Provider, Executor, Pool>
where
    Provider: HeaderProvider,
    Executor: BlockExecutor,
    Pool: TransactionPool,
{
    /// Creates a new payload builder.
    pub const fn new(
        provider: Provider,
        executor: Executor,
        pool: Pool,
        chain_spec: Arc<ChainSpec>,
        config: PayloadBuilderConfig,
    ) -> Self {
        Self { provider, executor, pool, chain_spec, config }
    }

    /// Assembles and seals the payload the attributes describe.
    pub fn try_build(
        &self,
        attributes: &PayloadBuilderAttributes,
    ) -> Result<BuiltPayload, PayloadBuilderError> {
        if self.config.extra_data.len() > MAXIMUM_EXTRA_DATA_SIZE {
            return Err(PayloadBuilderError::ExtraDataExceedsMax {
                len: self.config.extra_data.len(),
            })
        }

        let parent = self
            .provider
            .sealed_header(&attributes.parent)?
            .ok_or(PayloadBuilderError::MissingParentBlock(attributes.parent))?;

        // The pool may still be pending on an older head, e.g. right after a
        // reorg. Nudge it onto the parent before taking a snapshot.
        if self.pool.current_head() != parent.hash() {
            trace!(target: "payload_builder", parent = ?parent.hash(), "rebasing transaction pool");
            self.pool.on_head_changed(&parent);
        }

        let base_fee = parent
            .next_block_base_fee(self.chain_spec.base_fee_params)
            .unwrap_or(EIP1559_INITIAL_BASE_FEE);
        let gas_limit = parent.gas_limit;

        let mut cumulative_gas = 0u64;
        let mut transactions = Vec::new();
        for tx in self.pool.best_transactions(gas_limit, base_fee) {
            // greedy packing against the declared gas limits
            if cumulative_gas + tx.gas_limit > gas_limit {
                trace!(target: "payload_builder", tx = ?tx.hash, "transaction does not fit the block");
                continue
            }
            cumulative_gas += tx.gas_limit;
            transactions.push(tx.encoded);
        }

        let mut header = Header {
            parent_hash: parent.hash(),
            ommers_hash: EMPTY_OMMER_ROOT_HASH,
            beneficiary: attributes.suggested_fee_recipient,
            state_root: B256::ZERO,
            transactions_root: proofs::calculate_transaction_root(&transactions),
            receipts_root: proofs::EMPTY_ROOT_HASH,
            logs_bloom: Default::default(),
            difficulty: U256::ZERO,
            number: parent.number + 1,
            gas_limit,
            gas_used: 0,
            timestamp: attributes.timestamp,
            extra_data: self.config.extra_data.clone(),
            mix_hash: attributes.prev_randao,
            nonce: B64::ZERO,
            base_fee_per_gas: Some(base_fee),
        };
        let body = BlockBody { transactions };

        let outcome = self.executor.execute(&header, &body)?;
        header.state_root = outcome.state_root;
        header.receipts_root = outcome.receipts_root;
        header.logs_bloom = outcome.logs_bloom;
        header.gas_used = outcome.gas_used;

        let block = Block { header, body }.seal_slow();
        debug!(
            target: "payload_builder",
            id = %attributes.id,
            hash = ?block.hash(),
            txs = block.body.transactions.len(),
            "built payload"
        );

        Ok(BuiltPayload::new(attributes.id, Arc::new(block)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_interfaces::{
        pool::PooledTransaction,
        test_utils::{random_header, MockExecutor, MockPool, MockProvider},
    };
    use ember_primitives::{Address, SealedHeader, U64};
    use ember_rpc_types::{ExecutionPayload, PayloadAttributes};

    fn builder_with_parent(
        parent: &SealedHeader,
    ) -> (PayloadBuilder<MockProvider, MockExecutor, MockPool>, MockPool) {
        let provider = MockProvider::default();
        provider.add_header(parent.hash(), parent.header().clone());
        let pool = MockPool::default();
        let builder = PayloadBuilder::new(
            provider,
            MockExecutor::default(),
            pool.clone(),
            Arc::new(ChainSpec::default()),
            PayloadBuilderConfig::default(),
        );
        (builder, pool)
    }

    fn attributes(parent: &SealedHeader, timestamp: u64) -> PayloadBuilderAttributes {
        PayloadBuilderAttributes::new(
            parent.hash(),
            PayloadAttributes {
                timestamp: U64::from(timestamp),
                prev_randao: B256::with_last_byte(0x11),
                suggested_fee_recipient: Address::with_last_byte(0x22),
            },
        )
    }

    #[test]
    fn builds_empty_payload() {
        let parent = random_header(4, None);
        let (builder, _) = builder_with_parent(&parent);
        let attrs = attributes(&parent, parent.timestamp + 12);

        let payload = builder.try_build(&attrs).unwrap();
        let block = payload.block();

        assert_eq!(block.parent_hash, parent.hash());
        assert_eq!(block.number, parent.number + 1);
        assert_eq!(block.timestamp, parent.timestamp + 12);
        assert_eq!(block.mix_hash, B256::with_last_byte(0x11));
        assert_eq!(block.beneficiary, Address::with_last_byte(0x22));
        assert!(block.difficulty.is_zero());
        assert_eq!(block.nonce, B64::ZERO);
        // no transactions: the tx root is the empty-list root
        assert_eq!(block.transactions_root, proofs::EMPTY_ROOT_HASH);
        assert_eq!(
            block.base_fee_per_gas,
            parent.next_block_base_fee(Default::default())
        );
    }

    #[test]
    fn built_payload_hashes_consistently() {
        let parent = random_header(4, None);
        let (builder, _) = builder_with_parent(&parent);
        let attrs = attributes(&parent, parent.timestamp + 12);

        let payload = builder.try_build(&attrs).unwrap();
        let block = payload.block().clone();
        let wire = ExecutionPayload::from(payload);
        assert_eq!(wire.block_hash, block.hash());
        assert_eq!(wire.prev_randao, B256::with_last_byte(0x11));
    }

    #[test]
    fn packs_transactions_under_the_gas_limit() {
        let parent = random_header(1, None);
        let (builder, pool) = builder_with_parent(&parent);
        let gas_limit = parent.gas_limit;

        pool.add_transaction(PooledTransaction {
            hash: B256::with_last_byte(1),
            encoded: Bytes::from_static(&[0x01]),
            gas_limit: gas_limit - 21_000,
        });
        // does not fit next to the first transaction
        pool.add_transaction(PooledTransaction {
            hash: B256::with_last_byte(2),
            encoded: Bytes::from_static(&[0x02]),
            gas_limit: 30_000,
        });
        // fits in the remaining space
        pool.add_transaction(PooledTransaction {
            hash: B256::with_last_byte(3),
            encoded: Bytes::from_static(&[0x03]),
            gas_limit: 21_000,
        });

        let attrs = attributes(&parent, parent.timestamp + 12);
        let payload = builder.try_build(&attrs).unwrap();
        let transactions = &payload.block().body.transactions;
        assert_eq!(
            transactions,
            &vec![Bytes::from_static(&[0x01]), Bytes::from_static(&[0x03])]
        );
    }

    #[test]
    fn rebases_the_pool_onto_the_parent() {
        let parent = random_header(2, None);
        let (builder, pool) = builder_with_parent(&parent);
        assert_ne!(pool.current_head(), parent.hash());

        builder.try_build(&attributes(&parent, parent.timestamp + 12)).unwrap();
        assert_eq!(pool.current_head(), parent.hash());
        assert_eq!(pool.head_changes(), vec![parent.hash()]);

        // a second build on the same parent does not nudge the pool again
        builder.try_build(&attributes(&parent, parent.timestamp + 24)).unwrap();
        assert_eq!(pool.head_changes(), vec![parent.hash()]);
    }

    #[test]
    fn rejects_oversized_extra_data() {
        let parent = random_header(1, None);
        let provider = MockProvider::default();
        provider.add_header(parent.hash(), parent.header().clone());
        let builder = PayloadBuilder::new(
            provider,
            MockExecutor::default(),
            MockPool::default(),
            Arc::new(ChainSpec::default()),
            PayloadBuilderConfig { extra_data: vec![0u8; 33].into() },
        );

        let err = builder.try_build(&attributes(&parent, parent.timestamp + 12)).unwrap_err();
        assert!(matches!(err, PayloadBuilderError::ExtraDataExceedsMax { len: 33 }));
    }

    #[test]
    fn missing_parent_fails() {
        let parent = random_header(1, None);
        let builder = PayloadBuilder::new(
            MockProvider::default(),
            MockExecutor::default(),
            MockPool::default(),
            Arc::new(ChainSpec::default()),
            PayloadBuilderConfig::default(),
        );
        let err = builder.try_build(&attributes(&parent, 100)).unwrap_err();
        assert!(matches!(err, PayloadBuilderError::MissingParentBlock(hash) if hash == parent.hash()));
    }
}
