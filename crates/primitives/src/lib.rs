//! Commonly used types for the ember execution client.
//!
//! This crate contains the consensus data model shared by the chain
//! inserter, the payload builder and the engine: headers, blocks, receipts,
//! the chain specification and the trie-root helpers.

mod block;
mod chain_spec;
pub mod constants;
mod header;
pub mod proofs;
mod receipt;

pub use block::{Block, BlockBody, BlockNumHash, SealedBlock};
pub use chain_spec::{BaseFeeParams, ChainInfo, ChainSpec, CliqueConfig};
pub use header::{check_gas_limit, Header, SealedHeader};
pub use receipt::Receipt;

pub use alloy_primitives::{
    keccak256, Address, Bloom, Bytes, B256, B64, U256, U64,
};

/// An Ethereum block number.
pub type BlockNumber = u64;

/// The hash of a block, i.e. the keccak of its RLP encoded header.
pub type BlockHash = B256;
