use alloy_primitives::Bloom;
use alloy_rlp::Encodable;
use serde::{Deserialize, Serialize};

/// The receipt of an executed transaction, as reported by the state
/// executor and persisted next to the block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Whether the transaction executed successfully.
    pub success: bool,
    /// The gas used by the block up to and including this transaction.
    pub cumulative_gas_used: u64,
    /// The bloom of the logs emitted by the transaction.
    pub bloom: Bloom,
}

impl Receipt {
    /// Creates a receipt for a successful transaction.
    pub const fn ok(cumulative_gas_used: u64) -> Self {
        Self { success: true, cumulative_gas_used, bloom: Bloom::ZERO }
    }
}

impl Encodable for Receipt {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        // [status, cumulativeGasUsed, logsBloom, logs]; log bodies are not
        // retained by this subsystem, only their bloom.
        let payload_length = self.success.length() +
            self.cumulative_gas_used.length() +
            self.bloom.length() +
            1;
        alloy_rlp::Header { list: true, payload_length }.encode(out);
        self.success.encode(out);
        self.cumulative_gas_used.encode(out);
        self.bloom.encode(out);
        out.put_u8(alloy_rlp::EMPTY_LIST_CODE);
    }

    fn length(&self) -> usize {
        let payload_length = self.success.length() +
            self.cumulative_gas_used.length() +
            self.bloom.length() +
            1;
        payload_length + alloy_rlp::length_of_length(payload_length) + 1
    }
}
