//! Contracts of the collaborators the engine subsystem drives: the chain
//! database, the state executor and the transaction pool.
//!
//! The engine only ever talks to these traits; the concrete database, EVM
//! and pool implementations live elsewhere. [`test_utils`] provides
//! in-memory mocks for all of them.

pub mod consensus;
pub mod executor;
pub mod pool;
pub mod provider;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use provider::{ProviderError, ProviderResult};
