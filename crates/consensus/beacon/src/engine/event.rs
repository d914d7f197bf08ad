use super::ForkchoiceStatus;
use ember_primitives::SealedBlock;
use ember_rpc_types::ForkchoiceState;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Events emitted by the consensus engine.
#[derive(Debug, Clone)]
pub enum BeaconConsensusEngineEvent {
    /// A fork choice update was received and processed with the given
    /// status.
    ForkchoiceUpdated(ForkchoiceState, ForkchoiceStatus),
    /// A block was promoted to the canonical tip.
    CanonicalBlockAdded(Arc<SealedBlock>),
    /// A block was validated and persisted next to the canonical chain.
    ForkBlockAdded(Arc<SealedBlock>),
}

/// A collection of event listeners; senders whose receiver was dropped are
/// pruned on the next notification.
#[derive(Debug)]
pub(crate) struct EventListeners<T> {
    listeners: Vec<UnboundedSender<T>>,
}

impl<T> Default for EventListeners<T> {
    fn default() -> Self {
        Self { listeners: Vec::new() }
    }
}

impl<T: Clone> EventListeners<T> {
    /// Sends the event to every active listener.
    pub(crate) fn notify(&mut self, event: T) {
        self.listeners.retain(|listener| listener.send(event.clone()).is_ok());
    }

    /// Registers a new listener.
    pub(crate) fn push_listener(&mut self, listener: UnboundedSender<T>) {
        self.listeners.push(listener);
    }
}
