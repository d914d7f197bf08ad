use super::{
    error::{BeaconForkChoiceUpdateError, BeaconOnNewPayloadError},
    event::BeaconConsensusEngineEvent,
    forkchoice::ForkchoiceStatus,
};
use ember_payload_builder::PayloadBuilderError;
use ember_rpc_types::{
    ExecutionPayload, ForkchoiceState, ForkchoiceUpdateError, ForkchoiceUpdated,
    PayloadAttributes, PayloadId, PayloadStatus,
};
use futures::{
    future::{ready, Either, Ready},
    FutureExt,
};
use std::{
    future::Future,
    pin::Pin,
    task::{ready as poll_ready, Context, Poll},
};
use tokio::sync::{mpsc, oneshot};

/// The result of a processed fork-choice update.
pub type ForkchoiceUpdatedResult = Result<ForkchoiceUpdated, ForkchoiceUpdateError>;

/// The message received by the beacon consensus engine.
#[derive(Debug)]
pub enum BeaconEngineMessage {
    /// Message with a new payload.
    NewPayload {
        /// The execution payload received over the Engine API.
        payload: ExecutionPayload,
        /// The sender for returning the payload status.
        tx: oneshot::Sender<Result<PayloadStatus, BeaconOnNewPayloadError>>,
    },
    /// Message with an updated forkchoice state.
    ForkchoiceUpdated {
        /// The forkchoice state.
        state: ForkchoiceState,
        /// The payload attributes for block building.
        payload_attrs: Option<PayloadAttributes>,
        /// The sender for returning the forkchoice updated response.
        tx: oneshot::Sender<Result<OnForkChoiceUpdated, BeaconForkChoiceUpdateError>>,
    },
    /// Adds a new listener for engine events.
    EventListener(mpsc::UnboundedSender<BeaconConsensusEngineEvent>),
}

/// The outcome the engine assigned to a fork-choice update, plus the future
/// that resolves the final wire response.
///
/// Payload building is initiated asynchronously: when attributes were
/// supplied, the response completes once the payload builder reported the
/// payload id. The engine actor itself never waits on this.
#[derive(Debug)]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct OnForkChoiceUpdated {
    /// The status of the forkchoice update, canonicalized ahead of the
    /// response future.
    forkchoice_status: ForkchoiceStatus,
    /// The future resolving to the wire response.
    fut: Either<Ready<ForkchoiceUpdatedResult>, PendingPayloadId>,
}

impl OnForkChoiceUpdated {
    /// Returns the determined status of the received forkchoice update.
    pub const fn forkchoice_status(&self) -> ForkchoiceStatus {
        self.forkchoice_status
    }

    /// Creates a new response for a successfully processed update with the
    /// given payload status.
    pub fn valid(status: PayloadStatus) -> Self {
        Self {
            forkchoice_status: ForkchoiceStatus::from_payload_status(&status.status),
            fut: Either::Left(ready(Ok(ForkchoiceUpdated::new(status)))),
        }
    }

    /// Creates a new response for an update whose head is known to be
    /// invalid.
    pub fn with_invalid(status: PayloadStatus) -> Self {
        Self::valid(status)
    }

    /// Creates a new response for an update whose head is not known yet.
    pub fn syncing() -> Self {
        Self {
            forkchoice_status: ForkchoiceStatus::Syncing,
            fut: Either::Left(ready(Ok(ForkchoiceUpdated::from_status(
                ember_rpc_types::PayloadStatusEnum::Syncing,
            )))),
        }
    }

    /// Creates a new error response for an inconsistent forkchoice state.
    pub fn invalid_state() -> Self {
        Self {
            forkchoice_status: ForkchoiceStatus::Invalid,
            fut: Either::Left(ready(Err(ForkchoiceUpdateError::InvalidState))),
        }
    }

    /// Creates a new error response for payload attributes that failed
    /// validation. The fork-choice update itself is not rolled back.
    pub fn invalid_payload_attributes() -> Self {
        Self {
            // the fcu head was still processed as valid
            forkchoice_status: ForkchoiceStatus::Valid,
            fut: Either::Left(ready(Err(ForkchoiceUpdateError::UpdatedInvalidPayloadAttributes))),
        }
    }

    /// Creates a response that completes once the payload builder reported
    /// the id of the initiated build process.
    pub fn updated_with_pending_payload_id(
        payload_status: PayloadStatus,
        pending_payload_id: oneshot::Receiver<Result<PayloadId, PayloadBuilderError>>,
    ) -> Self {
        Self {
            forkchoice_status: ForkchoiceStatus::from_payload_status(&payload_status.status),
            fut: Either::Right(PendingPayloadId {
                payload_status: Some(payload_status),
                pending_payload_id,
            }),
        }
    }
}

impl Future for OnForkChoiceUpdated {
    type Output = ForkchoiceUpdatedResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().fut.poll_unpin(cx)
    }
}

/// A future that resolves the fork-choice response once the payload builder
/// reported the payload id.
#[derive(Debug)]
struct PendingPayloadId {
    payload_status: Option<PayloadStatus>,
    pending_payload_id: oneshot::Receiver<Result<PayloadId, PayloadBuilderError>>,
}

impl Future for PendingPayloadId {
    type Output = ForkchoiceUpdatedResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let res = poll_ready!(this.pending_payload_id.poll_unpin(cx));
        match res {
            Ok(Ok(payload_id)) => Poll::Ready(Ok(ForkchoiceUpdated {
                payload_status: this.payload_status.take().expect("polled after completion"),
                payload_id: Some(payload_id),
            })),
            Err(_) | Ok(Err(_)) => {
                // the payload build failed, the update itself is not rolled
                // back
                Poll::Ready(Err(ForkchoiceUpdateError::UpdatedInvalidPayloadAttributes))
            }
        }
    }
}
