//! The beacon consensus engine: the component that accepts post-merge
//! consensus-layer directives and maintains the canonical chain head.
//!
//! The engine is an actor driven by [`BeaconEngineMessage`]s, which the
//! Engine API surface produces from `engine_newPayloadV1` and
//! `engine_forkchoiceUpdatedV1` calls. Messages are processed strictly in
//! arrival order, which serializes concurrent fork-choice updates from
//! competing consensus clients.

mod engine;

pub use engine::{
    BeaconConsensusEngine, BeaconConsensusEngineEvent, BeaconConsensusEngineHandle,
    BeaconEngineMessage, BeaconForkChoiceUpdateError, BeaconOnNewPayloadError, ForkchoiceStatus,
    InvalidHeaderCache, MergeLatch, OnForkChoiceUpdated, PayloadValidationError,
    PAYLOAD_BUFFER_SIZE,
};
