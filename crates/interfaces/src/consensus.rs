//! Consensus validation errors.

use ember_primitives::{BlockHash, Bloom, B256};

/// Consensus rule violations detected while validating a block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsensusError {
    /// The parent of the validated block is unknown.
    #[error("block parent {hash} is unknown")]
    ParentUnknown {
        /// The missing parent hash.
        hash: BlockHash,
    },
    /// The block number does not follow the parent's.
    #[error("block number {block_number} does not follow parent number {parent_block_number}")]
    ParentBlockNumberMismatch {
        /// The parent's number.
        parent_block_number: u64,
        /// The child's number.
        block_number: u64,
    },
    /// The timestamp does not advance past the parent's.
    #[error("block timestamp {timestamp} is not ahead of parent timestamp {parent_timestamp}")]
    TimestampIsInPast {
        /// The parent's timestamp.
        parent_timestamp: u64,
        /// The child's timestamp.
        timestamp: u64,
    },
    /// The header claims more gas than its gas limit allows.
    #[error("header gas used {gas_used} exceeds gas limit {gas_limit}")]
    HeaderGasUsedExceedsGasLimit {
        /// Claimed gas used.
        gas_used: u64,
        /// The block's gas limit.
        gas_limit: u64,
    },
    /// The gas limit moved too far from the parent's.
    #[error("child gas limit {child_gas_limit} is out of bounds of parent gas limit {parent_gas_limit}")]
    GasLimitOutOfBounds {
        /// The parent's gas limit.
        parent_gas_limit: u64,
        /// The child's gas limit.
        child_gas_limit: u64,
    },
    /// The header carries no base fee although the parent does.
    #[error("base fee missing")]
    BaseFeeMissing,
    /// The base fee does not match the EIP-1559 expectation.
    #[error("base fee mismatch: got {got}, expected {expected}")]
    BaseFeeDiff {
        /// The expected base fee.
        expected: u64,
        /// The base fee the header carries.
        got: u64,
    },
    /// The extra data of a zero-difficulty block exceeds 32 bytes.
    #[error("extra data exceeds the maximum length: {len}")]
    ExtraDataExceedsMax {
        /// The length of the offending extra data.
        len: usize,
    },
    /// The executed state root differs from the header's claim.
    #[error("state root mismatch: got {got}, expected {expected}")]
    BodyStateRootDiff {
        /// The root the header claims.
        expected: B256,
        /// The root execution produced.
        got: B256,
    },
    /// The executed receipts root differs from the header's claim.
    #[error("receipts root mismatch: got {got}, expected {expected}")]
    BodyReceiptsRootDiff {
        /// The root the header claims.
        expected: B256,
        /// The root execution produced.
        got: B256,
    },
    /// The executed logs bloom differs from the header's claim.
    #[error("logs bloom mismatch")]
    BodyLogsBloomDiff {
        /// The bloom the header claims.
        expected: Box<Bloom>,
        /// The bloom execution produced.
        got: Box<Bloom>,
    },
    /// The executed gas used differs from the header's claim.
    #[error("block gas used mismatch: got {got}, expected {expected}")]
    BlockGasUsedMismatch {
        /// The gas the header claims.
        expected: u64,
        /// The gas execution consumed.
        got: u64,
    },
}
