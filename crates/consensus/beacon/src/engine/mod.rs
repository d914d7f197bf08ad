//! The beacon consensus engine actor.

use ember_blockchain_tree::{BlockchainTree, CanonicalError, InsertBlockError};
use ember_interfaces::{
    executor::BlockExecutor,
    pool::TransactionPool,
    provider::{BlockProvider, ChainWriter, HeaderProvider, ProviderError, ProviderResult},
};
use ember_payload_builder::{PayloadBuilderAttributes, PayloadBuilderHandle};
use ember_primitives::{ChainSpec, SealedBlock, SealedHeader, B256, U256};
use ember_rpc_types::{
    ExecutionPayload, ForkchoiceState, ForkchoiceUpdateError, PayloadAttributes, PayloadStatus,
    PayloadStatusEnum,
};
use futures::StreamExt;
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, error, trace, warn};

mod buffer;
mod error;
mod event;
mod forkchoice;
mod handle;
mod invalid_headers;
mod merge;
mod message;
mod metrics;

pub use buffer::PAYLOAD_BUFFER_SIZE;
pub use error::{BeaconForkChoiceUpdateError, BeaconOnNewPayloadError, PayloadValidationError};
pub use event::BeaconConsensusEngineEvent;
pub use forkchoice::ForkchoiceStatus;
pub use handle::BeaconConsensusEngineHandle;
pub use invalid_headers::InvalidHeaderCache;
pub use merge::MergeLatch;
pub use message::{BeaconEngineMessage, OnForkChoiceUpdated};

use buffer::PayloadBuffer;
use event::EventListeners;
use forkchoice::ForkchoiceStateTracker;
use metrics::EngineMetrics;

/// The beacon consensus engine: processes payloads and fork-choice updates
/// received from the consensus layer and maintains the canonical chain.
///
/// The engine has two data input sources:
///
/// ## New payload (`engine_newPayloadV1`)
///
/// A payload with a known parent and available state is fully validated and
/// persisted as a *side* block: execution never moves the head, only a
/// fork-choice update may. A payload whose parent is unknown is buffered
/// and answered `SYNCING`; one whose parent state was pruned is buffered
/// and answered `ACCEPTED`.
///
/// ## Fork-choice update (`engine_forkchoiceUpdatedV1`)
///
/// The head of the supplied state is resolved (from the database or the
/// payload buffer), promoted to the canonical tip, and the safe/finalized
/// pointers are verified against the canonical chain and persisted. If
/// payload attributes are attached, a payload build is initiated and the
/// response completes with its id.
///
/// Messages are processed strictly in arrival order; two concurrent
/// fork-choice updates serialize on the engine's channel, so the second
/// observes the first's head change.
#[must_use = "Future does nothing unless polled"]
pub struct BeaconConsensusEngine<Provider, Executor, Pool> {
    /// The chain configuration, including the terminal total difficulty.
    chain_spec: Arc<ChainSpec>,
    /// Validates, persists and promotes blocks.
    blockchain: BlockchainTree<Provider, Executor, Pool>,
    /// Consulted for parent post-state availability.
    executor: Executor,
    /// The payload builder frontend used to initiate build jobs.
    payload_builder: PayloadBuilderHandle,
    /// The engine message receiver.
    engine_message_rx: UnboundedReceiverStream<BeaconEngineMessage>,
    /// A clone of the handle.
    handle: BeaconConsensusEngineHandle,
    /// Tracks the fork-choice state updates received from the CL.
    forkchoice_state_tracker: ForkchoiceStateTracker,
    /// Payloads with unknown parents, awaiting a fork-choice resolution.
    buffered_payloads: PayloadBuffer,
    /// Headers of payloads this engine rejected as invalid.
    invalid_headers: InvalidHeaderCache,
    /// The one-way merge transition flags, shared with the sealing loop.
    merge_latch: Arc<MergeLatch>,
    /// Listeners for engine events.
    listeners: EventListeners<BeaconConsensusEngineEvent>,
    /// Consensus engine metrics.
    metrics: EngineMetrics,
}

impl<Provider, Executor, Pool> BeaconConsensusEngine<Provider, Executor, Pool>
where
    Provider: ChainWriter,
    Executor: BlockExecutor,
    Pool: TransactionPool,
{
    /// Creates a new engine and the handle to drive it.
    pub fn new(
        chain_spec: Arc<ChainSpec>,
        blockchain: BlockchainTree<Provider, Executor, Pool>,
        executor: Executor,
        payload_builder: PayloadBuilderHandle,
        merge_latch: Arc<MergeLatch>,
    ) -> (Self, BeaconConsensusEngineHandle) {
        let (to_engine, rx) = mpsc::unbounded_channel();
        let handle = BeaconConsensusEngineHandle::new(to_engine);
        let this = Self {
            chain_spec,
            blockchain,
            executor,
            payload_builder,
            engine_message_rx: UnboundedReceiverStream::new(rx),
            handle: handle.clone(),
            forkchoice_state_tracker: Default::default(),
            buffered_payloads: Default::default(),
            invalid_headers: Default::default(),
            merge_latch,
            listeners: Default::default(),
            metrics: Default::default(),
        };
        (this, handle)
    }

    /// Returns a new [`BeaconConsensusEngineHandle`] that can be cloned and
    /// shared.
    pub fn handle(&self) -> BeaconConsensusEngineHandle {
        self.handle.clone()
    }

    fn provider(&self) -> &Provider {
        self.blockchain.provider()
    }

    /// The terminal total difficulty of the chain. Chains without a
    /// configured value are treated as merged at genesis.
    fn terminal_total_difficulty(&self) -> U256 {
        self.chain_spec.terminal_total_difficulty.unwrap_or(U256::ZERO)
    }

    /// If validation fails, the response MUST contain the latest valid hash:
    ///
    ///   - the hash of the deepest ancestor that is fully validated and
    ///     post-terminal,
    ///   - the zero hash if no such ancestor exists, i.e. the branch is
    ///     rooted in the proof-of-work chain.
    fn latest_valid_ancestor(&self, mut hash: B256) -> ProviderResult<B256> {
        let ttd = self.terminal_total_difficulty();
        loop {
            let Some(td) = self.provider().header_td(&hash)? else { return Ok(B256::ZERO) };
            if td >= ttd {
                return Ok(hash)
            }
            let Some(header) = self.provider().header(&hash)? else { return Ok(B256::ZERO) };
            if header.number == 0 {
                return Ok(B256::ZERO)
            }
            hash = header.parent_hash;
        }
    }

    /// Walks back from `hash` to the nearest canonical ancestor and returns
    /// its hash, or zero if the ancestor is pre-merge or the walk dies.
    fn last_canonical_ancestor(&self, mut hash: B256) -> ProviderResult<B256> {
        loop {
            let Some(header) = self.provider().header(&hash)? else { return Ok(B256::ZERO) };
            if self.provider().canonical_hash(header.number)? == Some(hash) {
                let td = self.provider().header_td(&hash)?.unwrap_or_default();
                return Ok(if td >= self.terminal_total_difficulty() { hash } else { B256::ZERO })
            }
            if header.number == 0 {
                return Ok(B256::ZERO)
            }
            hash = header.parent_hash;
        }
    }

    /// Prepares the invalid response for a payload that links to a known
    /// invalid block, populating the latest valid hash according to the
    /// Engine API: the zero hash if the last valid ancestor is a
    /// proof-of-work block.
    fn prepare_invalid_response(&self, mut parent_hash: B256) -> PayloadStatus {
        if let Ok(Some(parent)) = self.provider().header(&parent_hash) {
            if !parent.difficulty.is_zero() {
                parent_hash = B256::ZERO;
            }
        }
        PayloadStatus::from_status(PayloadStatusEnum::Invalid {
            validation_error: PayloadValidationError::LinksToRejectedPayload.to_string(),
        })
        .with_latest_valid_hash(parent_hash)
    }

    /// Checks if `check` points at a known invalid header. If so, the
    /// descendant `head` is recorded as invalid as well and the prepared
    /// invalid response is returned.
    fn check_invalid_ancestor_with_head(
        &mut self,
        check: B256,
        head: &SealedHeader,
    ) -> Option<PayloadStatus> {
        let ancestor = self.invalid_headers.get(&check)?.clone();
        let status = self.prepare_invalid_response(ancestor.parent_hash);
        self.invalid_headers.insert_with_invalid_ancestor(head.hash(), ancestor);
        Some(status)
    }

    /// Checks if `head` itself was previously recorded as invalid.
    fn check_invalid_ancestor(&mut self, head: B256) -> Option<PayloadStatus> {
        let parent_hash = self.invalid_headers.get(&head)?.parent_hash;
        Some(self.prepare_invalid_response(parent_hash))
    }

    /// Handles a `newPayload` message.
    ///
    /// The payload is reconstructed, checked for idempotency and against the
    /// terminal total difficulty, then executed and persisted as a side
    /// block. Recoverable conditions become [`PayloadStatus`] values, only
    /// internal failures surface as errors.
    fn on_new_payload(
        &mut self,
        payload: ExecutionPayload,
    ) -> Result<PayloadStatus, BeaconOnNewPayloadError> {
        self.metrics.new_payload_messages.increment(1);

        // Reconstruct the header and verify the advertised block hash.
        let block = match SealedBlock::try_from(payload) {
            Ok(block) => block,
            Err(payload_error) => {
                error!(target: "consensus::engine", %payload_error, "invalid payload");
                return Ok(PayloadStatus::from_status(PayloadStatusEnum::Invalid {
                    validation_error: payload_error.to_string(),
                })
                .with_latest_valid_hash(B256::ZERO))
            }
        };
        let block_hash = block.hash();
        let parent_hash = block.parent_hash;

        // The block is already persisted: respond exactly as the first time.
        if self.provider().is_known(&block_hash).map_err(BeaconOnNewPayloadError::internal)? {
            return Ok(PayloadStatus::new(PayloadStatusEnum::Valid, block_hash))
        }

        // A descendant of a block this engine already rejected is invalid
        // without further work.
        if let Some(status) = self.check_invalid_ancestor_with_head(parent_hash, &block.header) {
            return Ok(status)
        }

        // Unknown parent: buffer the payload. Execution must not trigger
        // reorgs, only a later fork-choice update may resolve it.
        let Some(parent) =
            self.provider().header(&parent_hash).map_err(BeaconOnNewPayloadError::internal)?
        else {
            trace!(target: "consensus::engine", ?block_hash, ?parent_hash, "parent unknown, buffering payload");
            self.metrics.buffered_payloads.increment(1);
            self.buffered_payloads.insert(block);
            return Ok(PayloadStatus::from_status(PayloadStatusEnum::Syncing))
        };

        // A payload building on a pre-terminal parent is rejected outright.
        let parent_td = self
            .provider()
            .header_td(&parent_hash)
            .map_err(BeaconOnNewPayloadError::internal)?
            .ok_or_else(|| {
                BeaconOnNewPayloadError::internal(ProviderError::TotalDifficultyNotFound(
                    parent_hash,
                ))
            })?;
        if parent_td < self.terminal_total_difficulty() {
            warn!(target: "consensus::engine", ?block_hash, %parent_td, "rejecting pre-merge payload");
            return Ok(PayloadStatus::from_status(PayloadStatusEnum::Invalid {
                validation_error: PayloadValidationError::PreMergeBlock.to_string(),
            })
            .with_latest_valid_hash(B256::ZERO))
        }

        if block.timestamp <= parent.timestamp {
            let best_hash =
                self.provider().chain_info().map_err(BeaconOnNewPayloadError::internal)?.best_hash;
            return Ok(PayloadStatus::from_status(PayloadStatusEnum::Invalid {
                validation_error: PayloadValidationError::InvalidTimestamp.to_string(),
            })
            .with_latest_valid_hash(best_hash))
        }

        // The parent is known but its post-state was pruned, e.g. by a snap
        // sync gap: accept the payload and point at the best valid ancestor.
        if !self.executor.has_state(&parent_hash) {
            let latest_valid = self
                .latest_valid_ancestor(parent_hash)
                .map_err(BeaconOnNewPayloadError::internal)?;
            debug!(target: "consensus::engine", ?block_hash, ?parent_hash, "parent state unavailable, buffering payload");
            self.metrics.buffered_payloads.increment(1);
            self.buffered_payloads.insert(block);
            return Ok(PayloadStatus::new(PayloadStatusEnum::Accepted, latest_valid))
        }

        match self.blockchain.insert_block(block.clone()) {
            Ok(_) => {
                self.merge_latch.latch_ttd_reached();
                self.listeners
                    .notify(BeaconConsensusEngineEvent::ForkBlockAdded(Arc::new(block)));
                Ok(PayloadStatus::new(PayloadStatusEnum::Valid, block_hash))
            }
            Err(err) => self.map_insert_error(err),
        }
    }

    /// Maps a failed insertion to its payload status.
    ///
    /// If the block itself is invalid it enters the invalid-header cache and
    /// an `INVALID` status is returned; internal failures propagate as
    /// errors.
    fn map_insert_error(
        &mut self,
        err: InsertBlockError,
    ) -> Result<PayloadStatus, BeaconOnNewPayloadError> {
        let (block, kind) = err.split();
        if kind.is_invalid_block() {
            warn!(target: "consensus::engine", hash = ?block.hash(), %kind, "invalid payload");
            let parent_hash = block.parent_hash;
            self.invalid_headers.insert(block.header);
            let latest_valid = self
                .latest_valid_ancestor(parent_hash)
                .map_err(BeaconOnNewPayloadError::internal)?;
            Ok(PayloadStatus::from_status(PayloadStatusEnum::Invalid {
                validation_error: kind.to_string(),
            })
            .with_latest_valid_hash(latest_valid))
        } else {
            Err(BeaconOnNewPayloadError::internal(kind))
        }
    }

    /// Invoked when we receive a fork-choice update message.
    fn on_forkchoice_updated(
        &mut self,
        state: ForkchoiceState,
        attrs: Option<PayloadAttributes>,
        tx: oneshot::Sender<Result<OnForkChoiceUpdated, BeaconForkChoiceUpdateError>>,
    ) {
        self.metrics.forkchoice_updated_messages.increment(1);
        let on_updated = match self.forkchoice_updated(state, attrs) {
            Ok(response) => response,
            Err(error) => {
                let _ = tx.send(Err(error));
                return
            }
        };

        let status = on_updated.forkchoice_status();
        self.forkchoice_state_tracker.set_latest(state, status);
        if status.is_syncing() {
            trace!(
                target: "consensus::engine",
                sync_target = ?self.forkchoice_state_tracker.sync_target(),
                "forkchoice head requires syncing"
            );
        }
        let _ = tx.send(Ok(on_updated));

        self.listeners.notify(BeaconConsensusEngineEvent::ForkchoiceUpdated(state, status));
    }

    /// Called to resolve chain forks and ensure that the execution layer is
    /// working with the latest valid chain.
    ///
    /// These responses adhere to the Engine API specification for
    /// `engine_forkchoiceUpdated`.
    fn forkchoice_updated(
        &mut self,
        state: ForkchoiceState,
        attrs: Option<PayloadAttributes>,
    ) -> Result<OnForkChoiceUpdated, BeaconForkChoiceUpdateError> {
        trace!(target: "consensus::engine", ?state, "received new forkchoice state update");

        if state.head_block_hash.is_zero() {
            return Ok(OnForkChoiceUpdated::valid(PayloadStatus::from_status(
                PayloadStatusEnum::Invalid {
                    validation_error: PayloadValidationError::ForkchoiceEmptyHead.to_string(),
                },
            )))
        }

        if let Some(status) = self.check_invalid_ancestor(state.head_block_hash) {
            return Ok(OnForkChoiceUpdated::with_invalid(status))
        }

        // Resolve the head: from the database first, else from the buffer
        // of payloads that were waiting for exactly this update.
        let head = match self
            .provider()
            .sealed_header(&state.head_block_hash)
            .map_err(BeaconForkChoiceUpdateError::internal)?
        {
            Some(header) => header,
            None => match self.buffered_payloads.remove(&state.head_block_hash) {
                Some(block) => match self.insert_buffered_head(block)? {
                    Ok(header) => header,
                    Err(response) => return Ok(response),
                },
                None => {
                    trace!(target: "consensus::engine", head = ?state.head_block_hash, "head not known, syncing");
                    return Ok(OnForkChoiceUpdated::syncing())
                }
            },
        };

        // A pre-merge head is only acceptable if it is the terminal
        // proof-of-work block; anything else would reorg the merged chain
        // back across the transition.
        if !head.difficulty.is_zero() {
            let td = self
                .provider()
                .header_td(&head.hash())
                .map_err(BeaconForkChoiceUpdateError::internal)?
                .ok_or_else(|| {
                    BeaconForkChoiceUpdateError::internal(ProviderError::TotalDifficultyNotFound(
                        head.hash(),
                    ))
                })?;
            let parent_td = td.saturating_sub(head.difficulty);
            let ttd = self.terminal_total_difficulty();
            if td < ttd || parent_td >= ttd {
                warn!(target: "consensus::engine", head = ?head.hash(), %td, "rejecting pre-merge forkchoice head");
                return Ok(OnForkChoiceUpdated::valid(
                    PayloadStatus::from_status(PayloadStatusEnum::Invalid {
                        validation_error: PayloadValidationError::PreMergeForkchoice.to_string(),
                    })
                    .with_latest_valid_hash(B256::ZERO),
                ))
            }
        }

        match self.blockchain.make_canonical(&state.head_block_hash) {
            Ok(outcome) => {
                if outcome.is_already_canonical() {
                    debug!(target: "consensus::engine", head = ?state.head_block_hash, "ignoring forkchoice update to current head");
                } else if let Ok(Some(block)) = self.provider().block(&state.head_block_hash) {
                    self.listeners.notify(BeaconConsensusEngineEvent::CanonicalBlockAdded(
                        Arc::new(block.seal(state.head_block_hash)),
                    ));
                }

                self.update_safe_and_finalized(&state)?;

                if let Some(attrs) = attrs {
                    return Ok(self.process_payload_attributes(attrs, outcome.header(), state))
                }

                Ok(OnForkChoiceUpdated::valid(PayloadStatus::new(
                    PayloadStatusEnum::Valid,
                    state.head_block_hash,
                )))
            }
            Err(CanonicalError::Provider(error)) => {
                error!(target: "consensus::engine", %error, ?state, "database error while canonicalizing");
                Err(BeaconForkChoiceUpdateError::internal(error))
            }
            Err(error) => {
                warn!(target: "consensus::engine", %error, ?state, "failed to canonicalize the head hash");
                let latest_valid = self
                    .last_canonical_ancestor(state.head_block_hash)
                    .map_err(BeaconForkChoiceUpdateError::internal)?;
                Ok(OnForkChoiceUpdated::valid(
                    PayloadStatus::from_status(PayloadStatusEnum::Invalid {
                        validation_error: error.to_string(),
                    })
                    .with_latest_valid_hash(latest_valid),
                ))
            }
        }
    }

    /// Inserts a head block that was resolved from the payload buffer.
    ///
    /// Returns the inserted header, or the fork-choice response when the
    /// block still cannot be connected or turns out invalid.
    #[allow(clippy::type_complexity)]
    fn insert_buffered_head(
        &mut self,
        block: SealedBlock,
    ) -> Result<Result<SealedHeader, OnForkChoiceUpdated>, BeaconForkChoiceUpdateError> {
        let header = block.header.clone();
        let parent_hash = block.parent_hash;

        let parent_td = self
            .provider()
            .header_td(&parent_hash)
            .map_err(BeaconForkChoiceUpdateError::internal)?;
        let Some(parent_td) = parent_td else {
            // still disconnected, keep it around
            self.buffered_payloads.insert(block);
            return Ok(Err(OnForkChoiceUpdated::syncing()))
        };

        // the buffered payload skipped the terminal difficulty check
        if parent_td < self.terminal_total_difficulty() {
            return Ok(Err(OnForkChoiceUpdated::valid(
                PayloadStatus::from_status(PayloadStatusEnum::Invalid {
                    validation_error: PayloadValidationError::PreMergeBlock.to_string(),
                })
                .with_latest_valid_hash(B256::ZERO),
            )))
        }

        if !self.executor.has_state(&parent_hash) {
            self.buffered_payloads.insert(block);
            return Ok(Err(OnForkChoiceUpdated::syncing()))
        }

        match self.blockchain.insert_block(block) {
            Ok(_) => {
                self.merge_latch.latch_ttd_reached();
                debug!(target: "consensus::engine", hash = ?header.hash(), "inserted buffered forkchoice head");
                Ok(Ok(header))
            }
            Err(err) => {
                let (block, kind) = err.split();
                if kind.is_invalid_block() {
                    let parent_hash = block.parent_hash;
                    self.invalid_headers.insert(block.header);
                    let latest_valid = self
                        .latest_valid_ancestor(parent_hash)
                        .map_err(BeaconForkChoiceUpdateError::internal)?;
                    Ok(Err(OnForkChoiceUpdated::valid(
                        PayloadStatus::from_status(PayloadStatusEnum::Invalid {
                            validation_error: kind.to_string(),
                        })
                        .with_latest_valid_hash(latest_valid),
                    )))
                } else {
                    Err(BeaconForkChoiceUpdateError::internal(kind))
                }
            }
        }
    }

    /// Verifies and persists the safe and finalized pointers of the update.
    ///
    /// Both must reference canonical blocks; the finalized pointer
    /// additionally latches the proof-of-stake transition and may only move
    /// forward.
    fn update_safe_and_finalized(
        &mut self,
        state: &ForkchoiceState,
    ) -> Result<(), BeaconForkChoiceUpdateError> {
        if !state.finalized_block_hash.is_zero() {
            // a non-zero finalized pointer proves the chain finalized under
            // proof of stake, even if it turns out inconsistent below
            self.merge_latch.latch_pos_finalized();

            let finalized = self
                .provider()
                .header(&state.finalized_block_hash)
                .map_err(BeaconForkChoiceUpdateError::internal)?
                .ok_or(ForkchoiceUpdateError::InvalidState)?;
            if self
                .provider()
                .canonical_hash(finalized.number)
                .map_err(BeaconForkChoiceUpdateError::internal)?
                != Some(state.finalized_block_hash)
            {
                return Err(ForkchoiceUpdateError::InvalidState.into())
            }

            // finalization only ever moves forward
            if let Some(current) =
                self.provider().finalized_hash().map_err(BeaconForkChoiceUpdateError::internal)?
            {
                if let Some(current_header) = self
                    .provider()
                    .header(&current)
                    .map_err(BeaconForkChoiceUpdateError::internal)?
                {
                    if finalized.number < current_header.number {
                        return Err(ForkchoiceUpdateError::InvalidState.into())
                    }
                }
            }

            self.provider()
                .set_finalized(state.finalized_block_hash)
                .map_err(BeaconForkChoiceUpdateError::internal)?;
        }

        if !state.safe_block_hash.is_zero() {
            let safe = self
                .provider()
                .header(&state.safe_block_hash)
                .map_err(BeaconForkChoiceUpdateError::internal)?
                .ok_or(ForkchoiceUpdateError::InvalidState)?;
            if self
                .provider()
                .canonical_hash(safe.number)
                .map_err(BeaconForkChoiceUpdateError::internal)?
                != Some(state.safe_block_hash)
            {
                return Err(ForkchoiceUpdateError::InvalidState.into())
            }
            self.provider()
                .set_safe(state.safe_block_hash)
                .map_err(BeaconForkChoiceUpdateError::internal)?;
        }

        Ok(())
    }

    /// Validates the payload attributes with respect to the new head and
    /// initiates the build process.
    ///
    /// At this point the fork-choice update itself is already committed and
    /// is not rolled back if the attributes turn out invalid.
    fn process_payload_attributes(
        &self,
        attrs: PayloadAttributes,
        head: &SealedHeader,
        state: ForkchoiceState,
    ) -> OnForkChoiceUpdated {
        if attrs.timestamp.to::<u64>() <= head.timestamp {
            return OnForkChoiceUpdated::invalid_payload_attributes()
        }

        let attributes = PayloadBuilderAttributes::new(state.head_block_hash, attrs);
        // initiating the job is handled asynchronously by the builder
        // service; the response future completes with the payload id
        let pending_payload_id = self.payload_builder.send_new_payload(attributes);

        OnForkChoiceUpdated::updated_with_pending_payload_id(
            PayloadStatus::new(PayloadStatusEnum::Valid, state.head_block_hash),
            pending_payload_id,
        )
    }

    fn on_message(&mut self, msg: BeaconEngineMessage) {
        match msg {
            BeaconEngineMessage::NewPayload { payload, tx } => {
                let _ = tx.send(self.on_new_payload(payload));
            }
            BeaconEngineMessage::ForkchoiceUpdated { state, payload_attrs, tx } => {
                self.on_forkchoice_updated(state, payload_attrs, tx);
            }
            BeaconEngineMessage::EventListener(tx) => {
                self.listeners.push_listener(tx);
            }
        }
    }
}

impl<Provider, Executor, Pool> Future for BeaconConsensusEngine<Provider, Executor, Pool>
where
    Provider: ChainWriter + Unpin,
    Executor: BlockExecutor + Unpin,
    Pool: TransactionPool + Unpin,
{
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        loop {
            match futures::ready!(this.engine_message_rx.poll_next_unpin(cx)) {
                Some(msg) => this.on_message(msg),
                None => {
                    // channel closed
                    return Poll::Ready(())
                }
            }
        }
    }
}
