use ember_primitives::{B256, U256, U64};
use serde::{Deserialize, Serialize};

/// The configurable settings of the merge transition, compared bit-exact
/// between the consensus and execution layers via
/// `engine_exchangeTransitionConfigurationV1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionConfiguration {
    /// Maps on the `TERMINAL_TOTAL_DIFFICULTY` parameter of EIP-3675.
    pub terminal_total_difficulty: U256,
    /// Maps on the `TERMINAL_BLOCK_HASH` parameter of EIP-3675.
    pub terminal_block_hash: B256,
    /// Maps on the `TERMINAL_BLOCK_NUMBER` parameter of EIP-3675.
    pub terminal_block_number: U64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_configuration_serde() {
        let config = TransitionConfiguration {
            terminal_total_difficulty: U256::from(58_750_000_000_000_000_000_000u128),
            terminal_block_hash: B256::ZERO,
            terminal_block_number: U64::ZERO,
        };
        let json = serde_json::to_value(config).unwrap();
        assert_eq!(json["terminalBlockNumber"], "0x0");
        let back: TransitionConfiguration = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }
}
