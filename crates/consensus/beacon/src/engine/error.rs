use ember_rpc_types::ForkchoiceUpdateError;

/// Represents all error cases when handling a new payload.
///
/// These must be returned as JSON-RPC errors to the consensus client, as
/// opposed to the recoverable conditions encoded in
/// [`PayloadStatus`](ember_rpc_types::PayloadStatus) values.
#[derive(Debug, thiserror::Error)]
pub enum BeaconOnNewPayloadError {
    /// The engine task stopped.
    #[error("beacon consensus engine unavailable")]
    EngineUnavailable,
    /// An internal error occurred, e.g. a database failure.
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

impl BeaconOnNewPayloadError {
    /// Creates an internal error variant.
    pub fn internal<E: std::error::Error + Send + Sync + 'static>(error: E) -> Self {
        Self::Internal(Box::new(error))
    }
}

/// Represents error cases for an applied forkchoice update.
#[derive(Debug, thiserror::Error)]
pub enum BeaconForkChoiceUpdateError {
    /// The fork-choice update could not be answered with a payload status.
    #[error("forkchoice update error: {0}")]
    ForkchoiceUpdateError(#[from] ForkchoiceUpdateError),
    /// The engine task stopped.
    #[error("beacon consensus engine unavailable")]
    EngineUnavailable,
    /// An internal error occurred, e.g. a database failure.
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

impl BeaconForkChoiceUpdateError {
    /// Creates an internal error variant.
    pub fn internal<E: std::error::Error + Send + Sync + 'static>(error: E) -> Self {
        Self::Internal(Box::new(error))
    }
}

/// Validation failures the engine reports inside `INVALID` payload
/// statuses.
///
/// Consensus clients match on these messages to decide how to retry, so the
/// wording is part of the interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PayloadValidationError {
    /// The payload timestamp does not advance past its parent's.
    #[error("Invalid timestamp")]
    InvalidTimestamp,
    /// The payload's parent sits below the terminal total difficulty.
    #[error("block is pre-merge")]
    PreMergeBlock,
    /// The fork-choice head would reorg the pre-merge chain.
    #[error("forkchoice head is pre-merge")]
    PreMergeForkchoice,
    /// The payload extends a block this engine already rejected.
    #[error("links to previously rejected block")]
    LinksToRejectedPayload,
    /// The fork-choice head hash is zero.
    #[error("forkchoice requested update to zero hash")]
    ForkchoiceEmptyHead,
}
