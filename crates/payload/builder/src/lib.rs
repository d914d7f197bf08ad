//! Support for building execution payloads.
//!
//! The payload builder turns the payload attributes of a fork-choice update
//! into a fully sealed candidate block, driven by the transaction pool and
//! the state executor. Built payloads are identified by an 8-byte
//! [`PayloadId`](ember_rpc_types::PayloadId) derived from the build request
//! and served from a small LRU store until the consensus client retrieves
//! them via `engine_getPayloadV1`.

mod builder;
mod error;
mod metrics;
mod payload;
mod service;

pub use builder::{PayloadBuilder, PayloadBuilderConfig};
pub use error::PayloadBuilderError;
pub use payload::{BuiltPayload, PayloadBuilderAttributes};
pub use service::{
    PayloadBuilderHandle, PayloadBuilderService, PayloadServiceCommand, PAYLOAD_CACHE_SIZE,
};
