//! Protocol constants.

use alloy_primitives::{b256, B256, U256};

/// The maximum length of a payload block's `extraData` field, in bytes.
pub const MAXIMUM_EXTRA_DATA_SIZE: usize = 32;

/// The minimum legal gas limit of a block.
pub const MINIMUM_GAS_LIMIT: u64 = 5_000;

/// The mainnet block gas limit.
pub const ETHEREUM_BLOCK_GAS_LIMIT: u64 = 30_000_000;

/// The minimum base fee the protocol allows.
pub const MIN_PROTOCOL_BASE_FEE: u64 = 7;

/// The base fee of the first EIP-1559 block, in wei.
pub const EIP1559_INITIAL_BASE_FEE: u64 = 1_000_000_000;

/// The hash of an empty list of ommers: `keccak256(rlp([]))`.
pub const EMPTY_OMMER_ROOT_HASH: B256 =
    b256!("1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347");

/// The difficulty a clique signer assigns to a block sealed in turn.
pub const CLIQUE_DIFF_IN_TURN: U256 = U256::from_limbs([2, 0, 0, 0]);

/// The difficulty a clique signer assigns to a block sealed out of turn.
pub const CLIQUE_DIFF_NO_TURN: U256 = U256::from_limbs([1, 0, 0, 0]);

/// The number of vanity bytes prefixing a clique `extraData`.
pub const EXTRA_VANITY: usize = 32;

/// The number of seal bytes suffixing a clique `extraData`: a recoverable
/// secp256k1 signature.
pub const EXTRA_SEAL: usize = 65;
