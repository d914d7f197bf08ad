use crate::pool::{PooledTransaction, TransactionPool};
use ember_primitives::{BlockHash, SealedHeader};
use parking_lot::Mutex;
use std::sync::Arc;

/// An in-memory transaction pool with a fixed pending set.
#[derive(Clone, Debug, Default)]
pub struct MockPool {
    inner: Arc<MockPoolInner>,
}

#[derive(Debug, Default)]
struct MockPoolInner {
    head: Mutex<BlockHash>,
    pending: Mutex<Vec<PooledTransaction>>,
    head_changes: Mutex<Vec<BlockHash>>,
}

impl MockPool {
    /// Adds a transaction to the pending set.
    pub fn add_transaction(&self, tx: PooledTransaction) {
        self.inner.pending.lock().push(tx);
    }

    /// Returns every head change the pool was notified of, oldest first.
    pub fn head_changes(&self) -> Vec<BlockHash> {
        self.inner.head_changes.lock().clone()
    }
}

impl TransactionPool for MockPool {
    fn current_head(&self) -> BlockHash {
        *self.inner.head.lock()
    }

    fn best_transactions(&self, gas_limit: u64, _base_fee: u64) -> Vec<PooledTransaction> {
        self.inner
            .pending
            .lock()
            .iter()
            .filter(|tx| tx.gas_limit <= gas_limit)
            .cloned()
            .collect()
    }

    fn on_head_changed(&self, new_head: &SealedHeader) {
        *self.inner.head.lock() = new_head.hash();
        self.inner.head_changes.lock().push(new_head.hash());
    }
}
