use super::{PayloadId, PayloadStatus, PayloadStatusEnum};
use ember_primitives::B256;
use serde::{Deserialize, Serialize};

/// The fork-choice state supplied with every `engine_forkchoiceUpdatedV1`
/// call.
///
/// The safe and finalized hashes may be zero while the chain has not
/// finalized under proof of stake yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkchoiceState {
    /// The hash the canonical chain should be headed by.
    pub head_block_hash: B256,
    /// Hash of the most recent "safe" block, unlikely to be reorged.
    pub safe_block_hash: B256,
    /// Hash of the most recent finalized block, which cannot be reorged.
    pub finalized_block_hash: B256,
}

/// The response to `engine_forkchoiceUpdatedV1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkchoiceUpdated {
    /// The outcome of processing the fork-choice state.
    pub payload_status: PayloadStatus,
    /// The identifier of the initiated build process, if attributes were
    /// supplied.
    pub payload_id: Option<PayloadId>,
}

impl ForkchoiceUpdated {
    /// Creates a response from the given status, without a payload id.
    pub const fn new(payload_status: PayloadStatus) -> Self {
        Self { payload_status, payload_id: None }
    }

    /// Creates a response from the given status variant.
    pub const fn from_status(status: PayloadStatusEnum) -> Self {
        Self { payload_status: PayloadStatus::from_status(status), payload_id: None }
    }

    /// Sets the latest valid hash of the payload status.
    pub const fn with_latest_valid_hash(mut self, hash: B256) -> Self {
        self.payload_status.latest_valid_hash = Some(hash);
        self
    }

    /// Sets the payload id.
    pub const fn with_payload_id(mut self, id: PayloadId) -> Self {
        self.payload_id = Some(id);
        self
    }

    /// True if the payload status is `VALID`.
    pub const fn is_valid(&self) -> bool {
        self.payload_status.is_valid()
    }

    /// True if the payload status is `SYNCING`.
    pub const fn is_syncing(&self) -> bool {
        self.payload_status.is_syncing()
    }

    /// True if the payload status is `INVALID`.
    pub const fn is_invalid(&self) -> bool {
        self.payload_status.is_invalid()
    }
}

/// Fork-choice updates that cannot be answered with a [`PayloadStatus`] and
/// must surface as JSON-RPC errors instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ForkchoiceUpdateError {
    /// The fork-choice state is inconsistent, e.g. the finalized block is
    /// not on the canonical chain.
    #[error("invalid forkchoice state")]
    InvalidState,
    /// The payload attributes attached to the update are invalid.
    #[error("invalid payload attributes")]
    UpdatedInvalidPayloadAttributes,
}
