//! The Engine API surface: the JSON-RPC methods a consensus client drives
//! the execution layer with.
//!
//! [`EngineApi`] implements the generated [`EngineApiServer`] trait; the
//! transport (HTTP/WebSocket, JWT authentication) binds the trait methods
//! to their `engine_` names and lives outside this crate.

mod api;
mod capabilities;
mod engine_api;
mod error;
mod metrics;

pub use api::EngineApiServer;
pub use capabilities::CAPABILITIES;
pub use engine_api::{EngineApi, MAX_PAYLOAD_BODIES_LIMIT};
pub use error::{
    EngineApiError, EngineApiResult, INVALID_FORK_CHOICE_STATE_CODE,
    INVALID_PAYLOAD_ATTRIBUTES_CODE, REQUEST_TOO_LARGE_CODE, UNKNOWN_PAYLOAD_CODE,
};
