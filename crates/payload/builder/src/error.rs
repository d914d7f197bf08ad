use ember_interfaces::{executor::BlockExecutionError, provider::ProviderError};
use ember_primitives::B256;

/// Errors thrown while building a payload.
#[derive(Debug, thiserror::Error)]
pub enum PayloadBuilderError {
    /// The parent block the attributes point at is unknown.
    #[error("missing parent block {0}")]
    MissingParentBlock(B256),
    /// The configured extra data does not fit a payload block.
    #[error("extra data exceeds the maximum length: {len}")]
    ExtraDataExceedsMax {
        /// Length of the configured extra data.
        len: usize,
    },
    /// Executing the assembled body failed.
    #[error(transparent)]
    Execution(#[from] BlockExecutionError),
    /// The chain database failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// The payload builder service stopped.
    #[error("payload builder service unavailable")]
    ServiceUnavailable,
}
