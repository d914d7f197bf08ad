//! Types for the `engine_` JSON-RPC namespace, as exchanged with the
//! consensus client post-merge.
//!
//! Quantities serialize as `0x`-prefixed minimal hex, fixed-width byte
//! values as `0x`-prefixed hex of exact length.

pub mod engine;

pub use engine::{
    ExecutionPayload, ExecutionPayloadBody, ForkchoiceState, ForkchoiceUpdateError,
    ForkchoiceUpdated, PayloadAttributes, PayloadError, PayloadId, PayloadStatus,
    PayloadStatusEnum, TransitionConfiguration,
};
