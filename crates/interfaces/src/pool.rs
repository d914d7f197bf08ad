//! The narrow interface of the transaction pool.

use ember_primitives::{BlockHash, Bytes, SealedHeader, B256};

/// The engine-facing interface of the transaction pool.
///
/// The pool owns its pending set and orders it; the payload builder only
/// requests a snapshot and reports head changes back.
pub trait TransactionPool: Send + Sync {
    /// The block hash the pool's pending set is currently based on.
    fn current_head(&self) -> BlockHash;

    /// Returns the best pending transactions that fit the given gas limit,
    /// priced against the given base fee, in inclusion order.
    fn best_transactions(&self, gas_limit: u64, base_fee: u64) -> Vec<PooledTransaction>;

    /// Notifies the pool that the canonical head changed so it can rebase
    /// its pending set.
    fn on_head_changed(&self, new_head: &SealedHeader);
}

/// A pool transaction as handed to the payload builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PooledTransaction {
    /// The transaction hash.
    pub hash: B256,
    /// The enveloped encoding of the transaction.
    pub encoded: Bytes,
    /// The gas limit the transaction declares; used for block packing.
    pub gas_limit: u64,
}
