//! Engine API types.
//!
//! See also <https://github.com/ethereum/execution-apis/blob/main/src/engine/paris.md>.

mod forkchoice;
mod payload;
mod transition;

pub use forkchoice::{ForkchoiceState, ForkchoiceUpdateError, ForkchoiceUpdated};
pub use payload::{
    ExecutionPayload, ExecutionPayloadBody, PayloadAttributes, PayloadError, PayloadId,
    PayloadStatus, PayloadStatusEnum,
};
pub use transition::TransitionConfiguration;
