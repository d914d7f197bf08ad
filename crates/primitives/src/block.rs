use crate::{BlockHash, BlockNumber, Header, SealedHeader};
use alloy_primitives::Bytes;
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// An Ethereum block: a header and the body it commits to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// The block header.
    pub header: Header,
    /// The block body.
    pub body: BlockBody,
}

impl Block {
    /// Seals the block with the computed header hash.
    pub fn seal_slow(self) -> SealedBlock {
        SealedBlock { header: self.header.seal_slow(), body: self.body }
    }

    /// Seals the block with the given hash, without verifying it.
    pub fn seal(self, hash: BlockHash) -> SealedBlock {
        SealedBlock { header: self.header.seal(hash), body: self.body }
    }
}

/// The body of a block.
///
/// Transactions are kept in their enveloped wire encoding: the engine
/// subsystem treats them as opaque byte strings whose interpretation belongs
/// to the state executor and the transaction pool. Both the transactions
/// trie root and the Engine API payload form are computed from these bytes
/// directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockBody {
    /// The enveloped transactions of the block, in execution order.
    pub transactions: Vec<Bytes>,
}

impl BlockBody {
    /// Returns true if the body carries no transactions.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// A [`Block`] whose header hash has been computed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedBlock {
    /// The sealed header.
    pub header: SealedHeader,
    /// The block body.
    pub body: BlockBody,
}

impl SealedBlock {
    /// Creates a sealed block from a sealed header and a body.
    pub const fn new(header: SealedHeader, body: BlockBody) -> Self {
        Self { header, body }
    }

    /// Returns the block hash.
    pub const fn hash(&self) -> BlockHash {
        self.header.hash()
    }

    /// Returns the block number and hash.
    pub const fn num_hash(&self) -> BlockNumHash {
        self.header.num_hash()
    }

    /// Unseals the block.
    pub fn unseal(self) -> Block {
        Block { header: self.header.unseal(), body: self.body }
    }

    /// Splits the block into its header and body.
    pub fn split(self) -> (SealedHeader, BlockBody) {
        (self.header, self.body)
    }
}

impl Deref for SealedBlock {
    type Target = SealedHeader;

    fn deref(&self) -> &Self::Target {
        &self.header
    }
}

/// A block number and its hash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockNumHash {
    /// The block number.
    pub number: BlockNumber,
    /// The block hash.
    pub hash: BlockHash,
}

impl BlockNumHash {
    /// Creates a new number/hash pair.
    pub const fn new(number: BlockNumber, hash: BlockHash) -> Self {
        Self { number, hash }
    }
}

impl From<(BlockNumber, BlockHash)> for BlockNumHash {
    fn from((number, hash): (BlockNumber, BlockHash)) -> Self {
        Self { number, hash }
    }
}
