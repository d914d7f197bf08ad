use crate::{BlockHash, BlockNumber, Header, SealedHeader, U256};
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// The parameters of the chain the node runs: genesis, the merge transition
/// configuration, base fee rules and the optional clique (PoA) settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSpec {
    /// The chain id.
    pub chain_id: u64,
    /// The genesis block header.
    pub genesis: Header,
    /// The terminal total difficulty that triggers the proof-of-stake
    /// transition, if the chain merges.
    pub terminal_total_difficulty: Option<U256>,
    /// The hash of the agreed-upon terminal block, zero if unset.
    pub terminal_block_hash: B256,
    /// The number of the agreed-upon terminal block, zero if unset.
    pub terminal_block_number: BlockNumber,
    /// EIP-1559 base fee parameters.
    pub base_fee_params: BaseFeeParams,
    /// Clique settings for pre-merge PoA chains.
    pub clique: Option<CliqueConfig>,
}

impl ChainSpec {
    /// Returns the genesis header.
    pub fn genesis_header(&self) -> &Header {
        &self.genesis
    }

    /// Returns the hash of the genesis block.
    pub fn genesis_hash(&self) -> BlockHash {
        self.genesis.hash_slow()
    }

    /// Returns the genesis header sealed with its hash.
    pub fn sealed_genesis_header(&self) -> SealedHeader {
        self.genesis.clone().seal_slow()
    }

    /// Returns the terminal total difficulty, if the chain merges.
    pub const fn terminal_total_difficulty(&self) -> Option<U256> {
        self.terminal_total_difficulty
    }
}

/// EIP-1559 base fee parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseFeeParams {
    /// The bound divisor of the base fee.
    pub max_change_denominator: u64,
    /// The elasticity multiplier relating the gas target to the gas limit.
    pub elasticity_multiplier: u64,
}

impl BaseFeeParams {
    /// The parameters ethereum mainnet activated with London.
    pub const fn ethereum() -> Self {
        Self { max_change_denominator: 8, elasticity_multiplier: 2 }
    }
}

impl Default for BaseFeeParams {
    fn default() -> Self {
        Self::ethereum()
    }
}

/// Configuration of a clique proof-of-authority chain.
///
/// See also <https://eips.ethereum.org/EIPS/eip-225>.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliqueConfig {
    /// Seconds between consecutive sealed blocks.
    pub period: u64,
    /// Number of blocks after which a signer vote checkpoint is emitted.
    pub epoch: u64,
}

/// Information about the chain's current canonical tip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainInfo {
    /// The hash of the canonical tip.
    pub best_hash: BlockHash,
    /// The number of the canonical tip.
    pub best_number: BlockNumber,
}
