use ember_beacon_consensus::{BeaconForkChoiceUpdateError, BeaconOnNewPayloadError};
use ember_interfaces::provider::ProviderError;
use ember_primitives::{B256, U256};
use ember_rpc_types::ForkchoiceUpdateError;
use jsonrpsee::types::error::{ErrorObject, ErrorObjectOwned, INTERNAL_ERROR_CODE, INVALID_PARAMS_CODE};

/// The Engine API result type.
pub type EngineApiResult<Ok> = Result<Ok, EngineApiError>;

/// `engine_getPayloadV1` was called with an unknown payload id.
pub const UNKNOWN_PAYLOAD_CODE: i32 = -38001;
/// The fork-choice state was inconsistent, e.g. finalized not canonical.
pub const INVALID_FORK_CHOICE_STATE_CODE: i32 = -38002;
/// The payload attributes attached to a fork-choice update were invalid.
pub const INVALID_PAYLOAD_ATTRIBUTES_CODE: i32 = -38003;
/// A payload-bodies request exceeded the allowed size.
pub const REQUEST_TOO_LARGE_CODE: i32 = -38004;

/// Errors returned by the Engine API handlers as JSON-RPC errors.
///
/// Recoverable validation outcomes are *not* errors: they travel inside
/// [`PayloadStatus`](ember_rpc_types::PayloadStatus) values.
#[derive(Debug, thiserror::Error)]
pub enum EngineApiError {
    /// The payload was not found in the payload store.
    #[error("payload does not exist / is not available")]
    UnknownPayload,
    /// The terminal total difficulty of the consensus client differs from
    /// the configured one.
    #[error("invalid transition terminal total difficulty: execution {execution}, consensus {consensus}")]
    TerminalTD {
        /// The locally configured terminal total difficulty.
        execution: U256,
        /// The value the consensus client communicated.
        consensus: U256,
    },
    /// The terminal block hash of the consensus client does not match the
    /// local chain.
    #[error("invalid transition terminal block hash: execution {execution:?}, consensus {consensus}")]
    TerminalBlockHash {
        /// The local hash at the communicated terminal block number.
        execution: Option<B256>,
        /// The hash the consensus client communicated.
        consensus: B256,
    },
    /// The chain has no terminal total difficulty configured, the Engine
    /// API cannot be served.
    #[error("terminal total difficulty is not configured")]
    UnknownMergeTerminalTotalDifficulty,
    /// A payload-bodies request asked for too many blocks at once.
    #[error("requested count of payload bodies is too large: {len}")]
    PayloadRequestTooLarge {
        /// The number of requested bodies.
        len: u64,
    },
    /// A payload-bodies range request carried a zero start or count.
    #[error("invalid start ({start}) or count ({count}) of payload bodies request")]
    InvalidBodiesRange {
        /// Start of the requested range.
        start: u64,
        /// Number of requested bodies.
        count: u64,
    },
    /// The fork-choice update failed.
    #[error(transparent)]
    ForkChoiceUpdate(#[from] BeaconForkChoiceUpdateError),
    /// Processing the new payload failed internally.
    #[error(transparent)]
    NewPayload(#[from] BeaconOnNewPayloadError),
    /// The chain database failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl From<EngineApiError> for ErrorObjectOwned {
    fn from(error: EngineApiError) -> Self {
        let code = match &error {
            EngineApiError::UnknownPayload => UNKNOWN_PAYLOAD_CODE,
            EngineApiError::PayloadRequestTooLarge { .. } => REQUEST_TOO_LARGE_CODE,
            EngineApiError::TerminalTD { .. } |
            EngineApiError::TerminalBlockHash { .. } |
            EngineApiError::UnknownMergeTerminalTotalDifficulty |
            EngineApiError::InvalidBodiesRange { .. } => INVALID_PARAMS_CODE,
            EngineApiError::ForkChoiceUpdate(fcu_error) => match fcu_error {
                BeaconForkChoiceUpdateError::ForkchoiceUpdateError(
                    ForkchoiceUpdateError::InvalidState,
                ) => INVALID_FORK_CHOICE_STATE_CODE,
                BeaconForkChoiceUpdateError::ForkchoiceUpdateError(
                    ForkchoiceUpdateError::UpdatedInvalidPayloadAttributes,
                ) => INVALID_PAYLOAD_ATTRIBUTES_CODE,
                BeaconForkChoiceUpdateError::EngineUnavailable |
                BeaconForkChoiceUpdateError::Internal(_) => INTERNAL_ERROR_CODE,
            },
            EngineApiError::NewPayload(_) | EngineApiError::Provider(_) => INTERNAL_ERROR_CODE,
        };
        ErrorObject::owned(code, error.to_string(), None::<()>)
    }
}
