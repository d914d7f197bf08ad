use ember_interfaces::{
    consensus::ConsensusError, executor::BlockExecutionError, provider::ProviderError,
};
use ember_primitives::{BlockHash, SealedBlock};

/// Error thrown while inserting a block as a side block.
///
/// Carries the offending block so callers can keep track of it, e.g. in an
/// invalid-header cache.
#[derive(Debug, thiserror::Error)]
#[error("failed to insert block {}: {kind}", .block.hash())]
pub struct InsertBlockError {
    /// The block that could not be inserted.
    block: Box<SealedBlock>,
    /// The reason insertion failed.
    #[source]
    kind: InsertBlockErrorKind,
}

impl InsertBlockError {
    /// Creates an insertion error for the given block.
    pub fn new(block: SealedBlock, kind: InsertBlockErrorKind) -> Self {
        Self { block: Box::new(block), kind }
    }

    /// Creates an insertion error from a consensus violation.
    pub fn consensus_error(error: ConsensusError, block: SealedBlock) -> Self {
        Self::new(block, InsertBlockErrorKind::Consensus(error))
    }

    /// Creates an insertion error from an execution failure.
    pub fn execution_error(error: BlockExecutionError, block: SealedBlock) -> Self {
        Self::new(block, InsertBlockErrorKind::Execution(error))
    }

    /// Creates an insertion error from a storage failure.
    pub fn provider_error(error: ProviderError, block: SealedBlock) -> Self {
        Self::new(block, InsertBlockErrorKind::Provider(error))
    }

    /// Returns the reason insertion failed.
    pub const fn kind(&self) -> &InsertBlockErrorKind {
        &self.kind
    }

    /// Returns the offending block.
    pub fn block(&self) -> &SealedBlock {
        &self.block
    }

    /// Splits the error into the block and the failure reason.
    pub fn split(self) -> (SealedBlock, InsertBlockErrorKind) {
        (*self.block, self.kind)
    }
}

/// The reasons a block cannot be inserted.
#[derive(Debug, thiserror::Error)]
pub enum InsertBlockErrorKind {
    /// The block violates a consensus rule: a rejected header or a
    /// commitment mismatch after execution.
    #[error(transparent)]
    Consensus(#[from] ConsensusError),
    /// The state executor rejected the block.
    #[error(transparent)]
    Execution(#[from] BlockExecutionError),
    /// The chain database failed; the block itself may be fine.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl InsertBlockErrorKind {
    /// True if the failure proves the block invalid, as opposed to an
    /// internal storage failure.
    pub const fn is_invalid_block(&self) -> bool {
        matches!(self, Self::Consensus(_) | Self::Execution(_))
    }
}

/// Error thrown while promoting a block to the canonical tip.
#[derive(Debug, thiserror::Error)]
pub enum CanonicalError {
    /// The target of the fork choice is not present in the database.
    #[error("block hash {0} is unknown")]
    UnknownBlock(BlockHash),
    /// The target's chain does not connect back to the canonical chain.
    #[error("missing ancestor {missing} while walking back to the canonical chain")]
    Disconnected {
        /// The first ancestor hash that could not be resolved.
        missing: BlockHash,
    },
    /// The chain database failed mid-walk; nothing was committed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}
