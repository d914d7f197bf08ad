//! Read and write access to the chain database.

use ember_primitives::{
    Block, BlockHash, BlockNumber, ChainInfo, Header, Receipt, SealedBlock, SealedHeader, U256,
};

/// Result alias for provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors surfaced by the chain database.
///
/// [`ProviderError::Database`] is fatal to the operation that hit it; the
/// database guarantees its invariants hold after any aborted write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// A low level database error.
    #[error("database error: {0}")]
    Database(String),
    /// A block body or header indexed by hash was expected to exist.
    #[error("block hash {0} does not exist")]
    UnknownBlockHash(BlockHash),
    /// The total difficulty entry for the given block is missing.
    #[error("total difficulty for block {0} not found")]
    TotalDifficultyNotFound(BlockHash),
    /// The canonical tip has not been initialized.
    #[error("best block does not exist")]
    BestBlockNotFound,
}

/// Client trait for fetching headers and their metadata.
pub trait HeaderProvider: Send + Sync {
    /// Returns the header with the given hash, canonical or not.
    fn header(&self, hash: &BlockHash) -> ProviderResult<Option<Header>>;

    /// Returns the canonical header at the given block number.
    fn header_by_number(&self, number: BlockNumber) -> ProviderResult<Option<Header>>;

    /// Returns the total difficulty accumulated up to and including the
    /// block with the given hash.
    fn header_td(&self, hash: &BlockHash) -> ProviderResult<Option<U256>>;

    /// True if a header with the given hash has been persisted.
    fn is_known(&self, hash: &BlockHash) -> ProviderResult<bool> {
        Ok(self.header(hash)?.is_some())
    }

    /// Returns the header with the given hash, sealed with it.
    fn sealed_header(&self, hash: &BlockHash) -> ProviderResult<Option<SealedHeader>> {
        Ok(self.header(hash)?.map(|header| header.seal(*hash)))
    }
}

/// Client trait for fetching blocks and canonical chain state.
pub trait BlockProvider: HeaderProvider {
    /// Returns the block with the given hash, canonical or not.
    fn block(&self, hash: &BlockHash) -> ProviderResult<Option<Block>>;

    /// Returns the hash the canonical-number index maps the given number to.
    fn canonical_hash(&self, number: BlockNumber) -> ProviderResult<Option<BlockHash>>;

    /// Returns the current canonical tip.
    fn chain_info(&self) -> ProviderResult<ChainInfo>;

    /// Returns the hash of the finalized block, if one was recorded.
    fn finalized_hash(&self) -> ProviderResult<Option<BlockHash>>;

    /// Returns the hash of the safe block, if one was recorded.
    fn safe_hash(&self) -> ProviderResult<Option<BlockHash>>;

    /// True if the block with the given hash is on the canonical chain.
    fn is_canonical(&self, hash: &BlockHash) -> ProviderResult<bool> {
        let Some(header) = self.header(hash)? else { return Ok(false) };
        Ok(self.canonical_hash(header.number)? == Some(*hash))
    }
}

/// Write access to the chain database.
///
/// There is a single writer: the chain inserter. All writes are transactional
/// at the block-group granularity.
pub trait ChainWriter: BlockProvider {
    /// Persists a validated block together with its receipts and its entry
    /// in the total-difficulty index. The canonical-number index is not
    /// touched: the block is a side block until a fork choice promotes it.
    fn insert_block(
        &self,
        block: SealedBlock,
        total_difficulty: U256,
        receipts: Vec<Receipt>,
    ) -> ProviderResult<()>;

    /// Atomically rewrites the canonical-number index: entries above
    /// `new_tip` are removed, then `changes` are applied. Either the entire
    /// rewrite is observable or none of it.
    fn update_canonical_index(
        &self,
        new_tip: BlockNumber,
        changes: Vec<(BlockNumber, BlockHash)>,
    ) -> ProviderResult<()>;

    /// Records the new canonical tip.
    fn set_canonical_head(&self, header: SealedHeader) -> ProviderResult<()>;

    /// Persists the finalized block pointer.
    fn set_finalized(&self, hash: BlockHash) -> ProviderResult<()>;

    /// Persists the safe block pointer.
    fn set_safe(&self, hash: BlockHash) -> ProviderResult<()>;
}
