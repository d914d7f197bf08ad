//! Consensus validation of headers and executed blocks.

use ember_interfaces::{consensus::ConsensusError, executor::ExecutionOutcome};
use ember_primitives::{check_gas_limit, constants::MAXIMUM_EXTRA_DATA_SIZE, ChainSpec, Header};

/// Validates a header against its parent.
pub fn validate_header_against_parent(
    header: &Header,
    parent: &Header,
    chain_spec: &ChainSpec,
) -> Result<(), ConsensusError> {
    if header.number != parent.number + 1 {
        return Err(ConsensusError::ParentBlockNumberMismatch {
            parent_block_number: parent.number,
            block_number: header.number,
        })
    }

    if header.timestamp <= parent.timestamp {
        return Err(ConsensusError::TimestampIsInPast {
            parent_timestamp: parent.timestamp,
            timestamp: header.timestamp,
        })
    }

    if header.gas_used > header.gas_limit {
        return Err(ConsensusError::HeaderGasUsedExceedsGasLimit {
            gas_used: header.gas_used,
            gas_limit: header.gas_limit,
        })
    }

    if !check_gas_limit(parent.gas_limit, header.gas_limit) {
        return Err(ConsensusError::GasLimitOutOfBounds {
            parent_gas_limit: parent.gas_limit,
            child_gas_limit: header.gas_limit,
        })
    }

    if let Some(expected) = parent.next_block_base_fee(chain_spec.base_fee_params) {
        match header.base_fee_per_gas {
            None => return Err(ConsensusError::BaseFeeMissing),
            Some(got) if got != expected => {
                return Err(ConsensusError::BaseFeeDiff { expected, got })
            }
            _ => {}
        }
    }

    // Zero difficulty marks a payload block, which bounds the extra data.
    // Clique headers carry the seal there and are exempt.
    if header.difficulty.is_zero() && header.extra_data.len() > MAXIMUM_EXTRA_DATA_SIZE {
        return Err(ConsensusError::ExtraDataExceedsMax { len: header.extra_data.len() })
    }

    Ok(())
}

/// Validates the commitments a header claims against what execution
/// produced.
pub fn validate_block_post_execution(
    header: &Header,
    outcome: &ExecutionOutcome,
) -> Result<(), ConsensusError> {
    if outcome.state_root != header.state_root {
        return Err(ConsensusError::BodyStateRootDiff {
            expected: header.state_root,
            got: outcome.state_root,
        })
    }

    if outcome.receipts_root != header.receipts_root {
        return Err(ConsensusError::BodyReceiptsRootDiff {
            expected: header.receipts_root,
            got: outcome.receipts_root,
        })
    }

    if outcome.logs_bloom != header.logs_bloom {
        return Err(ConsensusError::BodyLogsBloomDiff {
            expected: Box::new(header.logs_bloom),
            got: Box::new(outcome.logs_bloom),
        })
    }

    if outcome.gas_used != header.gas_used {
        return Err(ConsensusError::BlockGasUsedMismatch {
            expected: header.gas_used,
            got: outcome.gas_used,
        })
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use ember_primitives::constants::ETHEREUM_BLOCK_GAS_LIMIT;

    fn parent() -> Header {
        Header {
            number: 9,
            timestamp: 1_000,
            gas_limit: ETHEREUM_BLOCK_GAS_LIMIT,
            gas_used: ETHEREUM_BLOCK_GAS_LIMIT / 2,
            base_fee_per_gas: Some(1_000),
            ..Default::default()
        }
    }

    fn child(parent: &Header) -> Header {
        Header {
            number: parent.number + 1,
            timestamp: parent.timestamp + 12,
            gas_limit: parent.gas_limit,
            base_fee_per_gas: parent.next_block_base_fee(Default::default()),
            ..Default::default()
        }
    }

    #[test]
    fn accepts_well_formed_child() {
        let parent = parent();
        let header = child(&parent);
        assert_matches!(
            validate_header_against_parent(&header, &parent, &ChainSpec::default()),
            Ok(())
        );
    }

    #[test]
    fn rejects_stale_timestamp() {
        let parent = parent();
        let mut header = child(&parent);
        header.timestamp = parent.timestamp;
        assert_matches!(
            validate_header_against_parent(&header, &parent, &ChainSpec::default()),
            Err(ConsensusError::TimestampIsInPast { .. })
        );
    }

    #[test]
    fn rejects_wrong_base_fee() {
        let parent = parent();
        let mut header = child(&parent);
        header.base_fee_per_gas = Some(1);
        assert_matches!(
            validate_header_against_parent(&header, &parent, &ChainSpec::default()),
            Err(ConsensusError::BaseFeeDiff { expected: 1_000, got: 1 })
        );
    }

    #[test]
    fn rejects_long_extra_data_on_payload_blocks() {
        let parent = parent();
        let mut header = child(&parent);
        header.extra_data = vec![0; MAXIMUM_EXTRA_DATA_SIZE + 1].into();
        assert_matches!(
            validate_header_against_parent(&header, &parent, &ChainSpec::default()),
            Err(ConsensusError::ExtraDataExceedsMax { len: 33 })
        );

        // a sealed clique header is allowed to exceed the bound
        header.difficulty = ember_primitives::constants::CLIQUE_DIFF_IN_TURN;
        assert_matches!(
            validate_header_against_parent(&header, &parent, &ChainSpec::default()),
            Ok(())
        );
    }

    #[test]
    fn rejects_state_root_mismatch() {
        let header = Header { gas_used: 21_000, ..Default::default() };
        let outcome = ExecutionOutcome {
            state_root: ember_primitives::B256::with_last_byte(1),
            gas_used: 21_000,
            ..Default::default()
        };
        assert_matches!(
            validate_block_post_execution(&header, &outcome),
            Err(ConsensusError::BodyStateRootDiff { .. })
        );
    }
}
