use crate::executor::{BlockExecutor, BlockExecutionError, ExecutionOutcome};
use ember_primitives::{BlockBody, BlockHash, Header};
use parking_lot::Mutex;
use std::{
    collections::{HashSet, VecDeque},
    sync::Arc,
};

/// A programmable state executor.
///
/// By default it "agrees" with whatever the header claims, which makes any
/// consistently assembled block execute as valid. Queued results take
/// precedence and are consumed in order.
#[derive(Clone, Debug, Default)]
pub struct MockExecutor {
    inner: Arc<MockExecutorInner>,
}

#[derive(Debug, Default)]
struct MockExecutorInner {
    results: Mutex<VecDeque<Result<ExecutionOutcome, BlockExecutionError>>>,
    missing_state: Mutex<HashSet<BlockHash>>,
}

impl MockExecutor {
    /// Queues an outcome for the next `execute` call.
    pub fn queue_result(&self, result: Result<ExecutionOutcome, BlockExecutionError>) {
        self.inner.results.lock().push_back(result);
    }

    /// Marks the post-state of the given block as pruned.
    pub fn prune_state(&self, hash: BlockHash) {
        self.inner.missing_state.lock().insert(hash);
    }
}

impl BlockExecutor for MockExecutor {
    fn execute(
        &self,
        header: &Header,
        _body: &BlockBody,
    ) -> Result<ExecutionOutcome, BlockExecutionError> {
        if let Some(result) = self.inner.results.lock().pop_front() {
            return result
        }
        Ok(ExecutionOutcome {
            state_root: header.state_root,
            receipts_root: header.receipts_root,
            logs_bloom: header.logs_bloom,
            gas_used: header.gas_used,
            receipts: Vec::new(),
        })
    }

    fn has_state(&self, hash: &BlockHash) -> bool {
        !self.inner.missing_state.lock().contains(hash)
    }
}
