use crate::provider::{
    BlockProvider, ChainWriter, HeaderProvider, ProviderError, ProviderResult,
};
use ember_primitives::{
    Block, BlockBody, BlockHash, BlockNumber, ChainInfo, Header, Receipt, SealedBlock,
    SealedHeader, U256,
};
use parking_lot::Mutex;
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

/// An in-memory chain database.
///
/// All maps sit behind a shared inner so that clones observe the same chain,
/// mirroring how a real database handle behaves.
#[derive(Clone, Debug, Default)]
pub struct MockProvider {
    inner: Arc<MockProviderInner>,
}

#[derive(Debug, Default)]
struct MockProviderInner {
    headers: Mutex<HashMap<BlockHash, Header>>,
    bodies: Mutex<HashMap<BlockHash, BlockBody>>,
    receipts: Mutex<HashMap<BlockHash, Vec<Receipt>>>,
    total_difficulty: Mutex<HashMap<BlockHash, U256>>,
    canonical: Mutex<BTreeMap<BlockNumber, BlockHash>>,
    head: Mutex<Option<SealedHeader>>,
    finalized: Mutex<Option<BlockHash>>,
    safe: Mutex<Option<BlockHash>>,
}

impl MockProvider {
    /// Adds a header without touching the canonical index.
    pub fn add_header(&self, hash: BlockHash, header: Header) {
        self.inner.headers.lock().insert(hash, header);
    }

    /// Adds a header together with its total difficulty.
    pub fn add_header_with_td(&self, hash: BlockHash, header: Header, td: U256) {
        self.add_header(hash, header);
        self.inner.total_difficulty.lock().insert(hash, td);
    }

    /// Adds a full block without touching the canonical index.
    pub fn add_block(&self, block: SealedBlock) {
        let (header, body) = block.split();
        let (header, hash) = header.split();
        self.inner.bodies.lock().insert(hash, body);
        self.add_header(hash, header);
    }

    /// Installs a block as the canonical tip: header, body, total
    /// difficulty, canonical-number entry and head pointer.
    pub fn add_canonical_block(&self, block: SealedBlock, td: U256) {
        let hash = block.hash();
        let sealed_header = block.header.clone();
        self.add_block(block);
        self.inner.total_difficulty.lock().insert(hash, td);
        self.inner.canonical.lock().insert(sealed_header.number, hash);
        *self.inner.head.lock() = Some(sealed_header);
    }

    /// Returns the receipts persisted for the given block.
    pub fn receipts(&self, hash: &BlockHash) -> Option<Vec<Receipt>> {
        self.inner.receipts.lock().get(hash).cloned()
    }

    /// Returns a copy of the canonical-number index.
    pub fn canonical_index(&self) -> BTreeMap<BlockNumber, BlockHash> {
        self.inner.canonical.lock().clone()
    }
}

impl HeaderProvider for MockProvider {
    fn header(&self, hash: &BlockHash) -> ProviderResult<Option<Header>> {
        Ok(self.inner.headers.lock().get(hash).cloned())
    }

    fn header_by_number(&self, number: BlockNumber) -> ProviderResult<Option<Header>> {
        let Some(hash) = self.inner.canonical.lock().get(&number).copied() else {
            return Ok(None)
        };
        self.header(&hash)
    }

    fn header_td(&self, hash: &BlockHash) -> ProviderResult<Option<U256>> {
        Ok(self.inner.total_difficulty.lock().get(hash).copied())
    }
}

impl BlockProvider for MockProvider {
    fn block(&self, hash: &BlockHash) -> ProviderResult<Option<Block>> {
        let Some(header) = self.header(hash)? else { return Ok(None) };
        let body = self.inner.bodies.lock().get(hash).cloned().unwrap_or_default();
        Ok(Some(Block { header, body }))
    }

    fn canonical_hash(&self, number: BlockNumber) -> ProviderResult<Option<BlockHash>> {
        Ok(self.inner.canonical.lock().get(&number).copied())
    }

    fn chain_info(&self) -> ProviderResult<ChainInfo> {
        let head = self.inner.head.lock();
        let head = head.as_ref().ok_or(ProviderError::BestBlockNotFound)?;
        Ok(ChainInfo { best_hash: head.hash(), best_number: head.number })
    }

    fn finalized_hash(&self) -> ProviderResult<Option<BlockHash>> {
        Ok(*self.inner.finalized.lock())
    }

    fn safe_hash(&self) -> ProviderResult<Option<BlockHash>> {
        Ok(*self.inner.safe.lock())
    }
}

impl ChainWriter for MockProvider {
    fn insert_block(
        &self,
        block: SealedBlock,
        total_difficulty: U256,
        receipts: Vec<Receipt>,
    ) -> ProviderResult<()> {
        let hash = block.hash();
        self.add_block(block);
        self.inner.total_difficulty.lock().insert(hash, total_difficulty);
        self.inner.receipts.lock().insert(hash, receipts);
        Ok(())
    }

    fn update_canonical_index(
        &self,
        new_tip: BlockNumber,
        changes: Vec<(BlockNumber, BlockHash)>,
    ) -> ProviderResult<()> {
        let mut canonical = self.inner.canonical.lock();
        canonical.retain(|number, _| *number <= new_tip);
        for (number, hash) in changes {
            canonical.insert(number, hash);
        }
        Ok(())
    }

    fn set_canonical_head(&self, header: SealedHeader) -> ProviderResult<()> {
        *self.inner.head.lock() = Some(header);
        Ok(())
    }

    fn set_finalized(&self, hash: BlockHash) -> ProviderResult<()> {
        *self.inner.finalized.lock() = Some(hash);
        Ok(())
    }

    fn set_safe(&self, hash: BlockHash) -> ProviderResult<()> {
        *self.inner.safe.lock() = Some(hash);
        Ok(())
    }
}
