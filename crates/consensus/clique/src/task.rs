//! The pre-merge block production loop.

use crate::CliqueSigner;
use ember_beacon_consensus::MergeLatch;
use ember_blockchain_tree::BlockchainTree;
use ember_interfaces::{
    executor::BlockExecutor,
    pool::TransactionPool,
    provider::{BlockProvider, ChainWriter, HeaderProvider},
};
use ember_primitives::{
    constants::{CLIQUE_DIFF_IN_TURN, EMPTY_OMMER_ROOT_HASH},
    proofs, BlockBody, Bytes, ChainSpec, Header, SealedBlock, B256, B64,
};
use eyre::OptionExt;
use std::{sync::Arc, time::Duration};
use tracing::{error, info, trace};

/// The sealing task of a clique authority node.
///
/// Every `cliquePeriod` seconds the task assembles a block from the
/// transaction pool, seals it and persists it as the new canonical tip.
/// The loop terminates permanently once the merge latch records the
/// terminal-total-difficulty transition; from then on blocks only enter the
/// chain through the engine.
#[derive(Debug)]
pub struct MiningTask<Provider, Executor, Pool> {
    /// The chain configuration.
    chain_spec: Arc<ChainSpec>,
    /// Inserts and promotes the sealed blocks.
    blockchain: BlockchainTree<Provider, Executor, Pool>,
    /// Executes the assembled body to obtain the header commitments.
    executor: Executor,
    /// Supplies the pending transactions.
    pool: Pool,
    /// Seals the produced headers.
    signer: CliqueSigner,
    /// Inhibits sealing once latched.
    merge_latch: Arc<MergeLatch>,
}

impl<Provider, Executor, Pool> MiningTask<Provider, Executor, Pool>
where
    Provider: ChainWriter,
    Executor: BlockExecutor,
    Pool: TransactionPool,
{
    /// Creates a new sealing task.
    pub const fn new(
        chain_spec: Arc<ChainSpec>,
        blockchain: BlockchainTree<Provider, Executor, Pool>,
        executor: Executor,
        pool: Pool,
        signer: CliqueSigner,
        merge_latch: Arc<MergeLatch>,
    ) -> Self {
        Self { chain_spec, blockchain, executor, pool, signer, merge_latch }
    }

    /// The configured block time of the chain.
    fn period(&self) -> u64 {
        self.chain_spec.clique.as_ref().map(|config| config.period).unwrap_or(12).max(1)
    }

    /// Runs the sealing loop until the chain merges.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.period()));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;

            if self.merge_latch.ttd_reached() {
                info!(target: "consensus::clique", "terminal total difficulty reached, sealing loop terminated");
                return
            }

            if let Err(err) = self.advance() {
                error!(target: "consensus::clique", %err, "failed to seal block");
            }
        }
    }

    /// Assembles, seals and commits one block on top of the current tip.
    fn advance(&self) -> eyre::Result<()> {
        let info = self.blockchain.provider().chain_info()?;
        let parent = self
            .blockchain
            .provider()
            .sealed_header(&info.best_hash)?
            .ok_or_eyre("canonical tip header missing")?;

        let timestamp = parent.timestamp + self.period();
        let base_fee = parent.next_block_base_fee(self.chain_spec.base_fee_params);
        let gas_limit = parent.gas_limit;

        let mut cumulative_gas = 0u64;
        let mut transactions = Vec::new();
        for tx in self.pool.best_transactions(gas_limit, base_fee.unwrap_or_default()) {
            if cumulative_gas + tx.gas_limit > gas_limit {
                trace!(target: "consensus::clique", tx = ?tx.hash, "transaction does not fit the block");
                continue
            }
            cumulative_gas += tx.gas_limit;
            transactions.push(tx.encoded);
        }

        let mut header = Header {
            parent_hash: parent.hash(),
            ommers_hash: EMPTY_OMMER_ROOT_HASH,
            beneficiary: self.signer.address(),
            state_root: B256::ZERO,
            transactions_root: proofs::calculate_transaction_root(&transactions),
            receipts_root: proofs::EMPTY_ROOT_HASH,
            logs_bloom: Default::default(),
            difficulty: CLIQUE_DIFF_IN_TURN,
            number: parent.number + 1,
            gas_limit,
            gas_used: 0,
            timestamp,
            extra_data: Bytes::new(),
            mix_hash: B256::ZERO,
            nonce: B64::ZERO,
            base_fee_per_gas: base_fee,
        };
        let body = BlockBody { transactions };

        let outcome = self.executor.execute(&header, &body)?;
        header.state_root = outcome.state_root;
        header.receipts_root = outcome.receipts_root;
        header.logs_bloom = outcome.logs_bloom;
        header.gas_used = outcome.gas_used;

        let sealed_header = self.signer.seal_header(header)?;
        let tx_count = body.transactions.len();
        let block = SealedBlock::new(sealed_header, body);
        let hash = block.hash();
        let number = block.number;

        self.blockchain.insert_block(block)?;
        // promotion also rebases the transaction pool onto the new tip
        self.blockchain.make_canonical(&hash)?;

        info!(target: "consensus::clique", number, ?hash, txs = tx_count, "sealed new block");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::recover_signer;
    use ember_interfaces::{
        pool::PooledTransaction,
        test_utils::{MockExecutor, MockPool, MockProvider},
    };
    use ember_primitives::{
        constants::{EXTRA_SEAL, EXTRA_VANITY},
        CliqueConfig, U256,
    };
    use secp256k1::SecretKey;

    fn chain_spec() -> Arc<ChainSpec> {
        Arc::new(ChainSpec {
            chain_id: 1,
            genesis: Header {
                gas_limit: 30_000_000,
                timestamp: 1_000,
                base_fee_per_gas: Some(1_000_000_000),
                ..Default::default()
            },
            terminal_total_difficulty: Some(U256::from(10_000)),
            clique: Some(CliqueConfig { period: 5, epoch: 30_000 }),
            ..Default::default()
        })
    }

    fn setup() -> (MiningTask<MockProvider, MockExecutor, MockPool>, MockProvider, MockPool) {
        let spec = chain_spec();
        let provider = MockProvider::default();
        provider.add_canonical_block(
            SealedBlock::new(spec.sealed_genesis_header(), BlockBody::default()),
            spec.genesis.difficulty,
        );

        let executor = MockExecutor::default();
        let pool = MockPool::default();
        let blockchain =
            BlockchainTree::new(provider.clone(), executor.clone(), pool.clone(), spec.clone());
        let signer = CliqueSigner::new(SecretKey::from_slice(&[0x42; 32]).unwrap());
        let latch = Arc::new(MergeLatch::default());
        let task = MiningTask::new(spec, blockchain, executor, pool.clone(), signer, latch);
        (task, provider, pool)
    }

    #[test]
    fn seals_canonical_blocks() {
        let (task, provider, pool) = setup();
        pool.add_transaction(PooledTransaction {
            hash: B256::with_last_byte(1),
            encoded: Bytes::from_static(&[0xaa]),
            gas_limit: 21_000,
        });

        task.advance().unwrap();
        task.advance().unwrap();

        let info = provider.chain_info().unwrap();
        assert_eq!(info.best_number, 2);

        let header = provider.header(&info.best_hash).unwrap().unwrap();
        assert_eq!(header.difficulty, CLIQUE_DIFF_IN_TURN);
        assert_eq!(header.extra_data.len(), EXTRA_VANITY + EXTRA_SEAL);
        assert_eq!(recover_signer(&header).unwrap(), task.signer.address());
        // blocks are spaced by the clique period
        assert_eq!(header.timestamp, 1_000 + 2 * 5);

        // every promotion rebased the pool
        assert_eq!(pool.head_changes().len(), 2);

        // the transaction was included
        let block = provider.block(&provider.canonical_hash(1).unwrap().unwrap()).unwrap().unwrap();
        assert_eq!(block.body.transactions, vec![Bytes::from_static(&[0xaa])]);
    }

    #[tokio::test]
    async fn sealing_stops_once_merged() {
        let (task, provider, _) = setup();
        task.merge_latch.latch_ttd_reached();

        // the first tick fires immediately, observes the latch and returns
        tokio::time::timeout(Duration::from_secs(1), task.run())
            .await
            .expect("sealing loop terminates");

        assert_eq!(provider.chain_info().unwrap().best_number, 0);
    }
}
