use ember_primitives::{SealedBlock, B256};
use schnellru::{ByLength, LruMap};
use tracing::trace;

/// The number of payloads with unknown parents kept around, awaiting a
/// fork-choice update that resolves them.
pub const PAYLOAD_BUFFER_SIZE: u32 = 10;

/// Buffers payloads whose parent was not known at `engine_newPayloadV1`
/// time, keyed by their block hash.
///
/// Executing such a payload must not trigger a reorg; only a subsequent
/// fork-choice update referencing the buffered hash may pull it out and
/// insert it. Entries are evicted strictly LRU once the bound is hit; an
/// evicted payload simply has to be re-sent by the consensus client.
#[derive(Debug)]
pub(crate) struct PayloadBuffer {
    blocks: LruMap<B256, SealedBlock>,
}

impl PayloadBuffer {
    /// Creates a buffer bounded to the given number of blocks.
    pub(crate) fn new(limit: u32) -> Self {
        Self { blocks: LruMap::new(ByLength::new(limit)) }
    }

    /// Buffers a block under its hash.
    pub(crate) fn insert(&mut self, block: SealedBlock) {
        trace!(target: "consensus::engine", hash = ?block.hash(), "buffering payload with unknown parent");
        self.blocks.insert(block.hash(), block);
    }

    /// Removes and returns the buffered block with the given hash.
    pub(crate) fn remove(&mut self, hash: &B256) -> Option<SealedBlock> {
        self.blocks.remove(hash)
    }

    /// Returns the buffered block with the given hash, keeping it buffered.
    #[cfg(test)]
    pub(crate) fn get(&mut self, hash: &B256) -> Option<&SealedBlock> {
        self.blocks.get(hash).map(|block| &*block)
    }
}

impl Default for PayloadBuffer {
    fn default() -> Self {
        Self::new(PAYLOAD_BUFFER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_primitives::{Block, Header};

    fn block(number: u64) -> SealedBlock {
        Block { header: Header { number, ..Default::default() }, body: Default::default() }
            .seal_slow()
    }

    #[test]
    fn buffer_evicts_lru_first() {
        let mut buffer = PayloadBuffer::new(2);
        let a = block(1);
        let b = block(2);
        let c = block(3);

        buffer.insert(a.clone());
        buffer.insert(b.clone());
        // touch `a` so `b` is the least recently used entry
        assert!(buffer.get(&a.hash()).is_some());
        buffer.insert(c.clone());

        assert!(buffer.get(&a.hash()).is_some());
        assert!(buffer.get(&b.hash()).is_none());
        assert_eq!(buffer.remove(&c.hash()), Some(c));
    }
}
