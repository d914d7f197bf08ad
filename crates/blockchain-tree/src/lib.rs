//! Side-block insertion and canonical chain promotion.
//!
//! [`BlockchainTree`] is the single writer of the chain database. Blocks
//! enter through [`BlockchainTree::insert_block`], which fully validates
//! them and persists them *next to* the canonical chain; a fork-choice
//! update later promotes a branch through
//! [`BlockchainTree::make_canonical`], which atomically rewrites the
//! canonical-number index and notifies the transaction pool of the new
//! head.

mod error;
pub mod validation;

pub use error::{CanonicalError, InsertBlockError, InsertBlockErrorKind};

use ember_interfaces::{
    consensus::ConsensusError,
    executor::BlockExecutor,
    pool::TransactionPool,
    provider::{BlockProvider, ChainWriter, HeaderProvider, ProviderError},
};
use ember_primitives::{BlockHash, BlockNumHash, ChainSpec, SealedBlock, SealedHeader};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// The outcome of inserting a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
    /// The block was validated and persisted as a side block.
    Valid,
    /// The block was already known; nothing was written.
    AlreadySeen,
}

/// The outcome of a canonicalization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalOutcome {
    /// The target was already the canonical block at its height.
    AlreadyCanonical {
        /// The canonical header.
        header: SealedHeader,
    },
    /// The target's branch was committed as the new canonical chain.
    Committed {
        /// The new canonical tip.
        head: SealedHeader,
    },
}

impl CanonicalOutcome {
    /// Returns the header of the canonicalized block.
    pub const fn header(&self) -> &SealedHeader {
        match self {
            Self::AlreadyCanonical { header } => header,
            Self::Committed { head } => head,
        }
    }

    /// True if no index rewrite took place.
    pub const fn is_already_canonical(&self) -> bool {
        matches!(self, Self::AlreadyCanonical { .. })
    }
}

/// Validates and persists side blocks and promotes branches on fork choice.
#[derive(Debug, Clone)]
pub struct BlockchainTree<Provider, Executor, Pool> {
    /// The chain database.
    provider: Provider,
    /// The state executor the blocks are validated against.
    executor: Executor,
    /// Notified whenever the canonical head moves.
    pool: Pool,
    /// The chain configuration.
    chain_spec: Arc<ChainSpec>,
}

impl<Provider, Executor, Pool> BlockchainTree<Provider, Executor, Pool>
where
    Provider: ChainWriter,
    Executor: BlockExecutor,
    Pool: TransactionPool,
{
    /// Creates a new tree over the given collaborators.
    pub const fn new(
        provider: Provider,
        executor: Executor,
        pool: Pool,
        chain_spec: Arc<ChainSpec>,
    ) -> Self {
        Self { provider, executor, pool, chain_spec }
    }

    /// Returns the chain database handle.
    pub const fn provider(&self) -> &Provider {
        &self.provider
    }

    /// Fully validates the block and persists it as a non-canonical side
    /// block: header, body, receipts and total difficulty, but no entry in
    /// the canonical-number index.
    pub fn insert_block(&self, block: SealedBlock) -> Result<BlockStatus, InsertBlockError> {
        let hash = block.hash();
        match self.provider.is_known(&hash) {
            Ok(true) => return Ok(BlockStatus::AlreadySeen),
            Ok(false) => {}
            Err(err) => return Err(InsertBlockError::provider_error(err, block)),
        }

        let parent = match self.provider.header(&block.parent_hash) {
            Ok(Some(parent)) => parent,
            Ok(None) => {
                return Err(InsertBlockError::consensus_error(
                    ConsensusError::ParentUnknown { hash: block.parent_hash },
                    block,
                ))
            }
            Err(err) => return Err(InsertBlockError::provider_error(err, block)),
        };

        if let Err(err) =
            validation::validate_header_against_parent(&block.header, &parent, &self.chain_spec)
        {
            return Err(InsertBlockError::consensus_error(err, block))
        }

        trace!(target: "blockchain_tree", ?hash, number = block.number, "executing block");
        let outcome = match self.executor.execute(&block.header, &block.body) {
            Ok(outcome) => outcome,
            Err(err) => return Err(InsertBlockError::execution_error(err, block)),
        };

        if let Err(err) = validation::validate_block_post_execution(&block.header, &outcome) {
            return Err(InsertBlockError::consensus_error(err, block))
        }

        let parent_td = match self.provider.header_td(&block.parent_hash) {
            Ok(Some(td)) => td,
            Ok(None) => {
                return Err(InsertBlockError::provider_error(
                    ProviderError::TotalDifficultyNotFound(block.parent_hash),
                    block,
                ))
            }
            Err(err) => return Err(InsertBlockError::provider_error(err, block)),
        };
        let td = parent_td + block.difficulty;

        if let Err(err) = self.provider.insert_block(block.clone(), td, outcome.receipts) {
            return Err(InsertBlockError::provider_error(err, block));
        }

        debug!(target: "blockchain_tree", ?hash, number = block.number, "inserted side block");
        Ok(BlockStatus::Valid)
    }

    /// Promotes the block with the given hash to the canonical tip.
    ///
    /// Walks back from the target to the nearest ancestor present in the
    /// canonical-number index, then rewrites the index forward along the new
    /// branch in a single atomic step and notifies the transaction pool.
    pub fn make_canonical(&self, hash: &BlockHash) -> Result<CanonicalOutcome, CanonicalError> {
        let Some(header) = self.provider.header(hash)? else {
            return Err(CanonicalError::UnknownBlock(*hash))
        };
        let head = header.seal(*hash);

        if self.provider.canonical_hash(head.number)? == Some(*hash) {
            debug!(target: "blockchain_tree", ?hash, number = head.number, "block is already canonical");
            return Ok(CanonicalOutcome::AlreadyCanonical { header: head })
        }

        // Collect the branch from the target down to the fork point.
        let mut new_chain = vec![head.num_hash()];
        let mut current = head.clone();
        while current.number > 0 {
            let parent_hash = current.parent_hash;
            let Some(parent) = self.provider.header(&parent_hash)? else {
                return Err(CanonicalError::Disconnected { missing: parent_hash })
            };
            if self.provider.canonical_hash(parent.number)? == Some(parent_hash) {
                break
            }
            new_chain.push(BlockNumHash::new(parent.number, parent_hash));
            current = parent.seal(parent_hash);
        }
        new_chain.reverse();

        let changes = new_chain.iter().map(|block| (block.number, block.hash)).collect();
        self.provider.update_canonical_index(head.number, changes)?;
        self.provider.set_canonical_head(head.clone())?;
        self.pool.on_head_changed(&head);

        info!(
            target: "blockchain_tree",
            ?hash,
            number = head.number,
            reorged_blocks = new_chain.len(),
            "canonicalized new head"
        );
        Ok(CanonicalOutcome::Committed { head })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use ember_interfaces::{
        executor::BlockExecutionError,
        provider::BlockProvider,
        test_utils::{random_block, random_header, MockExecutor, MockPool, MockProvider},
    };
    use ember_primitives::{Block, BlockBody, Header, U256};

    fn setup() -> (BlockchainTree<MockProvider, MockExecutor, MockPool>, MockProvider, MockPool) {
        let provider = MockProvider::default();
        let executor = MockExecutor::default();
        let pool = MockPool::default();
        let tree = BlockchainTree::new(
            provider.clone(),
            executor,
            pool.clone(),
            Arc::new(ChainSpec::default()),
        );
        (tree, provider, pool)
    }

    /// Builds a child of `parent` consistent with the validation rules.
    fn child_block(parent: &SealedHeader) -> SealedBlock {
        let header = Header {
            parent_hash: parent.hash(),
            number: parent.number + 1,
            timestamp: parent.timestamp + 12,
            gas_limit: parent.gas_limit,
            base_fee_per_gas: parent.next_block_base_fee(Default::default()),
            ..Default::default()
        };
        Block { header, body: BlockBody::default() }.seal_slow()
    }

    #[test]
    fn insert_block_persists_side_block() {
        let (tree, provider, _) = setup();
        let genesis = random_header(0, None);
        provider.add_canonical_block(
            SealedBlock::new(genesis.clone(), BlockBody::default()),
            U256::ZERO,
        );

        let block = child_block(&genesis);
        let hash = block.hash();
        assert_matches!(tree.insert_block(block.clone()), Ok(BlockStatus::Valid));

        // persisted, but not canonical
        assert!(provider.is_known(&hash).unwrap());
        assert_eq!(provider.canonical_hash(block.number).unwrap(), None);
        assert_eq!(provider.header_td(&hash).unwrap(), Some(U256::ZERO));

        // re-insertion is a no-op
        assert_matches!(tree.insert_block(block), Ok(BlockStatus::AlreadySeen));
    }

    #[test]
    fn insert_block_rejects_unknown_parent() {
        let (tree, _, _) = setup();
        let block = random_block(1, None, None);
        let err = tree.insert_block(block).unwrap_err();
        assert_matches!(
            err.kind(),
            InsertBlockErrorKind::Consensus(ConsensusError::ParentUnknown { .. })
        );
        assert!(err.kind().is_invalid_block());
    }

    #[test]
    fn insert_block_rejects_state_mismatch() {
        let (_, provider, _) = setup();
        let genesis = random_header(0, None);
        provider.add_canonical_block(
            SealedBlock::new(genesis.clone(), BlockBody::default()),
            U256::ZERO,
        );

        let block = child_block(&genesis);
        let tampered = ember_primitives::B256::with_last_byte(0xbe);
        let executor = MockExecutor::default();
        executor.queue_result(Ok(ember_interfaces::executor::ExecutionOutcome {
            state_root: tampered,
            ..Default::default()
        }));
        let tree = BlockchainTree::new(
            provider.clone(),
            executor,
            MockPool::default(),
            Arc::new(ChainSpec::default()),
        );

        let err = tree.insert_block(block.clone()).unwrap_err();
        assert_matches!(
            err.kind(),
            InsertBlockErrorKind::Consensus(ConsensusError::BodyStateRootDiff { got, .. })
                if *got == tampered
        );
        // nothing was persisted
        assert!(!provider.is_known(&block.hash()).unwrap());
    }

    #[test]
    fn insert_block_surfaces_execution_failure() {
        let (_, provider, _) = setup();
        let genesis = random_header(0, None);
        provider.add_canonical_block(
            SealedBlock::new(genesis.clone(), BlockBody::default()),
            U256::ZERO,
        );

        let executor = MockExecutor::default();
        executor.queue_result(Err(BlockExecutionError::TxRejected {
            index: 0,
            reason: "nonce too low".to_string(),
        }));
        let tree = BlockchainTree::new(
            provider,
            executor,
            MockPool::default(),
            Arc::new(ChainSpec::default()),
        );

        let err = tree.insert_block(child_block(&genesis)).unwrap_err();
        assert_matches!(
            err.kind(),
            InsertBlockErrorKind::Execution(BlockExecutionError::TxRejected { index: 0, .. })
        );
    }

    #[test]
    fn make_canonical_commits_side_chain() {
        let (tree, provider, pool) = setup();
        let genesis = random_header(0, None);
        provider.add_canonical_block(
            SealedBlock::new(genesis.clone(), BlockBody::default()),
            U256::ZERO,
        );

        let b1 = child_block(&genesis);
        let b2 = child_block(&b1.header);
        tree.insert_block(b1.clone()).unwrap();
        tree.insert_block(b2.clone()).unwrap();

        let outcome = tree.make_canonical(&b2.hash()).unwrap();
        assert_matches!(outcome, CanonicalOutcome::Committed { ref head } if head.hash() == b2.hash());

        // the canonical-number index is prefix closed along the new branch
        assert_eq!(provider.canonical_hash(1).unwrap(), Some(b1.hash()));
        assert_eq!(provider.canonical_hash(2).unwrap(), Some(b2.hash()));
        assert_eq!(provider.chain_info().unwrap().best_hash, b2.hash());

        // the pool learned about the new head
        assert_eq!(pool.head_changes(), vec![b2.hash()]);
    }

    #[test]
    fn make_canonical_reorgs_away_stale_blocks() {
        let (tree, provider, _) = setup();
        let genesis = random_header(0, None);
        provider.add_canonical_block(
            SealedBlock::new(genesis.clone(), BlockBody::default()),
            U256::ZERO,
        );

        // canonical chain of two blocks
        let a1 = child_block(&genesis);
        let a2 = child_block(&a1.header);
        tree.insert_block(a1.clone()).unwrap();
        tree.insert_block(a2.clone()).unwrap();
        tree.make_canonical(&a2.hash()).unwrap();

        // a competing single-block branch wins the fork choice
        let mut header = child_block(&genesis).unseal().header;
        header.timestamp += 1;
        let b1 = Block { header, body: BlockBody::default() }.seal_slow();
        tree.insert_block(b1.clone()).unwrap();
        tree.make_canonical(&b1.hash()).unwrap();

        assert_eq!(provider.canonical_hash(1).unwrap(), Some(b1.hash()));
        // the stale height-2 entry is gone
        assert_eq!(provider.canonical_hash(2).unwrap(), None);
        assert_eq!(provider.chain_info().unwrap().best_number, 1);
    }

    #[test]
    fn make_canonical_is_idempotent() {
        let (tree, provider, pool) = setup();
        let genesis = random_header(0, None);
        provider.add_canonical_block(
            SealedBlock::new(genesis.clone(), BlockBody::default()),
            U256::ZERO,
        );

        let outcome = tree.make_canonical(&genesis.hash()).unwrap();
        assert!(outcome.is_already_canonical());
        assert!(pool.head_changes().is_empty());
    }

    #[test]
    fn make_canonical_unknown_block() {
        let (tree, _, _) = setup();
        let missing = ember_primitives::B256::with_last_byte(9);
        assert_matches!(tree.make_canonical(&missing), Err(CanonicalError::UnknownBlock(h)) if h == missing);
    }
}
