//! The contract of the EVM-backed state executor.

use ember_primitives::{BlockBody, BlockHash, Bloom, Header, Receipt, B256};

/// Executes block bodies on top of their parent's post-state.
///
/// The executor owns the account state database; the engine only learns the
/// commitments it produces.
pub trait BlockExecutor: Send + Sync {
    /// Executes the body on top of the post-state of `header.parent_hash`
    /// and returns the resulting commitments.
    ///
    /// The roots claimed by `header` are not consulted; callers compare them
    /// against the returned outcome.
    fn execute(
        &self,
        header: &Header,
        body: &BlockBody,
    ) -> Result<ExecutionOutcome, BlockExecutionError>;

    /// True if the post-state of the block with the given hash is available,
    /// i.e. was not pruned by snap sync.
    fn has_state(&self, hash: &BlockHash) -> bool;
}

/// The commitments produced by executing a block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// The root of the state trie after the block.
    pub state_root: B256,
    /// The root of the receipts trie.
    pub receipts_root: B256,
    /// The union of the receipt blooms.
    pub logs_bloom: Bloom,
    /// The total gas used by the block.
    pub gas_used: u64,
    /// The per-transaction receipts, in execution order.
    pub receipts: Vec<Receipt>,
}

/// Errors produced while executing a block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockExecutionError {
    /// The parent's post-state is not available.
    #[error("missing post-state for block {0}")]
    MissingState(BlockHash),
    /// A transaction failed validation inside the executor.
    #[error("transaction {index} is invalid: {reason}")]
    TxRejected {
        /// Index of the offending transaction within the body.
        index: usize,
        /// The executor's rejection reason.
        reason: String,
    },
    /// The EVM failed while applying the block.
    #[error("block execution failed: {0}")]
    Evm(String),
}
