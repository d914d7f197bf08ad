use ember_primitives::{
    constants::{EMPTY_OMMER_ROOT_HASH, MAXIMUM_EXTRA_DATA_SIZE},
    proofs, Address, Block, BlockBody, Bloom, Bytes, Header, SealedBlock, B256, B64, U256, U64,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An 8-byte identifier of a payload build process, derived from the
/// fork-choice head and the payload attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayloadId(pub B64);

impl PayloadId {
    /// Creates an identifier from raw bytes.
    pub const fn new(id: [u8; 8]) -> Self {
        Self(B64::new(id))
    }
}

impl fmt::Display for PayloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The execution payload of a block, as carried by `engine_newPayloadV1`
/// and returned by `engine_getPayloadV1`.
///
/// This maps onto the `ExecutionPayloadV1` structure of the Engine API; the
/// `prevRandao` field occupies the header's mix-digest slot. A payload and
/// the header reconstructed from it hash identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPayload {
    pub parent_hash: B256,
    pub fee_recipient: Address,
    pub state_root: B256,
    pub receipts_root: B256,
    pub logs_bloom: Bloom,
    pub prev_randao: B256,
    pub block_number: U64,
    pub gas_limit: U64,
    pub gas_used: U64,
    pub timestamp: U64,
    pub extra_data: Bytes,
    pub base_fee_per_gas: U256,
    pub block_hash: B256,
    pub transactions: Vec<Bytes>,
}

impl TryFrom<ExecutionPayload> for SealedBlock {
    type Error = PayloadError;

    /// Reconstructs the block the payload describes and verifies that the
    /// advertised block hash matches `keccak256(rlp(header))`.
    fn try_from(payload: ExecutionPayload) -> Result<Self, Self::Error> {
        if payload.extra_data.len() > MAXIMUM_EXTRA_DATA_SIZE {
            return Err(PayloadError::ExtraData(payload.extra_data))
        }

        if payload.base_fee_per_gas.is_zero() {
            return Err(PayloadError::BaseFee(payload.base_fee_per_gas))
        }
        let base_fee_per_gas = u64::try_from(payload.base_fee_per_gas)
            .map_err(|_| PayloadError::BaseFee(payload.base_fee_per_gas))?;

        let transactions_root = proofs::calculate_transaction_root(&payload.transactions);
        let header = Header {
            parent_hash: payload.parent_hash,
            beneficiary: payload.fee_recipient,
            state_root: payload.state_root,
            transactions_root,
            receipts_root: payload.receipts_root,
            logs_bloom: payload.logs_bloom,
            number: payload.block_number.to(),
            gas_limit: payload.gas_limit.to(),
            gas_used: payload.gas_used.to(),
            timestamp: payload.timestamp.to(),
            mix_hash: payload.prev_randao,
            base_fee_per_gas: Some(base_fee_per_gas),
            extra_data: payload.extra_data,
            // Defaults enforced for payload blocks.
            ommers_hash: EMPTY_OMMER_ROOT_HASH,
            difficulty: U256::ZERO,
            nonce: B64::ZERO,
        };
        let header = header.seal_slow();

        if payload.block_hash != header.hash() {
            return Err(PayloadError::BlockHash {
                execution: header.hash(),
                consensus: payload.block_hash,
            })
        }

        Ok(Self::new(header, BlockBody { transactions: payload.transactions }))
    }
}

impl From<SealedBlock> for ExecutionPayload {
    fn from(block: SealedBlock) -> Self {
        let block_hash = block.hash();
        let Block { header, body } = block.unseal();
        Self {
            parent_hash: header.parent_hash,
            fee_recipient: header.beneficiary,
            state_root: header.state_root,
            receipts_root: header.receipts_root,
            logs_bloom: header.logs_bloom,
            prev_randao: header.mix_hash,
            block_number: U64::from(header.number),
            gas_limit: U64::from(header.gas_limit),
            gas_used: U64::from(header.gas_used),
            timestamp: U64::from(header.timestamp),
            extra_data: header.extra_data,
            base_fee_per_gas: U256::from(header.base_fee_per_gas.unwrap_or_default()),
            block_hash,
            transactions: body.transactions,
        }
    }
}

/// The body of a block as returned by `engine_getPayloadBodiesBy{Hash,Range}V1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPayloadBody {
    pub transactions: Vec<Bytes>,
}

impl From<BlockBody> for ExecutionPayloadBody {
    fn from(body: BlockBody) -> Self {
        Self { transactions: body.transactions }
    }
}

/// The attributes supplied with a fork-choice update to initiate a payload
/// build process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadAttributes {
    pub timestamp: U64,
    pub prev_randao: B256,
    pub suggested_fee_recipient: Address,
}

/// The result of processing a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadStatus {
    #[serde(flatten)]
    pub status: PayloadStatusEnum,
    /// Hash of the most recent valid block in the branch defined by the
    /// payload and its ancestors.
    pub latest_valid_hash: Option<B256>,
}

impl PayloadStatus {
    /// Creates a status with the given latest valid hash.
    pub const fn new(status: PayloadStatusEnum, latest_valid_hash: B256) -> Self {
        Self { status, latest_valid_hash: Some(latest_valid_hash) }
    }

    /// Creates a status without a latest valid hash.
    pub const fn from_status(status: PayloadStatusEnum) -> Self {
        Self { status, latest_valid_hash: None }
    }

    /// Sets the latest valid hash.
    pub const fn with_latest_valid_hash(mut self, hash: B256) -> Self {
        self.latest_valid_hash = Some(hash);
        self
    }

    /// True if the status is `VALID`.
    pub const fn is_valid(&self) -> bool {
        self.status.is_valid()
    }

    /// True if the status is `SYNCING`.
    pub const fn is_syncing(&self) -> bool {
        self.status.is_syncing()
    }

    /// True if the status is `INVALID`.
    pub const fn is_invalid(&self) -> bool {
        self.status.is_invalid()
    }
}

/// The tagged status variants of [`PayloadStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayloadStatusEnum {
    /// The payload extends the canonical chain and was fully validated.
    Valid,
    /// The payload failed validation.
    Invalid {
        #[serde(rename = "validationError")]
        validation_error: String,
    },
    /// The payload was buffered; required data is still being synced.
    Syncing,
    /// The payload was persisted as a side block without being connected to
    /// the canonical chain.
    Accepted,
    /// The advertised block hash does not match the payload contents.
    InvalidBlockHash {
        #[serde(rename = "validationError")]
        validation_error: String,
    },
}

impl PayloadStatusEnum {
    /// Returns the validation error carried by the status, if any.
    pub fn validation_error(&self) -> Option<&str> {
        match self {
            Self::Invalid { validation_error } | Self::InvalidBlockHash { validation_error } => {
                Some(validation_error)
            }
            _ => None,
        }
    }

    /// True if the status is `VALID`.
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// True if the status is `SYNCING`.
    pub const fn is_syncing(&self) -> bool {
        matches!(self, Self::Syncing)
    }

    /// True if the status is `INVALID`.
    pub const fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }
}

/// Errors that make an execution payload malformed before any chain state
/// is consulted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// The extra data exceeds the 32 byte maximum.
    #[error("invalid payload extra data: {0}")]
    ExtraData(Bytes),
    /// The base fee is zero or out of range.
    #[error("invalid payload base fee: {0}")]
    BaseFee(U256),
    /// The advertised block hash does not match the reconstructed header.
    #[error("blockhash mismatch, want {consensus}, got {execution}")]
    BlockHash {
        /// The hash of the reconstructed header.
        execution: B256,
        /// The hash the payload advertised.
        consensus: B256,
    },
}

impl PayloadError {
    /// True if the error is a block hash mismatch.
    pub const fn is_block_hash_mismatch(&self) -> bool {
        matches!(self, Self::BlockHash { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_interfaces::test_utils::random_block;

    #[test]
    fn payload_block_roundtrip() {
        let block = random_block(7, None, Some(3));
        let payload = ExecutionPayload::from(block.clone());
        let roundtripped = SealedBlock::try_from(payload).unwrap();
        assert_eq!(roundtripped.hash(), block.hash());
        assert_eq!(roundtripped.body, block.body);
    }

    #[test]
    fn payload_rejects_long_extra_data() {
        let block = random_block(1, None, None);
        let mut payload = ExecutionPayload::from(block);
        payload.extra_data = vec![0u8; 33].into();
        assert!(matches!(
            SealedBlock::try_from(payload),
            Err(PayloadError::ExtraData(data)) if data.len() == 33
        ));
    }

    #[test]
    fn payload_rejects_zero_base_fee() {
        let block = random_block(1, None, None);
        let mut payload = ExecutionPayload::from(block);
        payload.base_fee_per_gas = U256::ZERO;
        assert!(matches!(SealedBlock::try_from(payload), Err(PayloadError::BaseFee(_))));
    }

    #[test]
    fn payload_rejects_tampered_block_hash() {
        let block = random_block(1, None, None);
        let expected = block.hash();
        let mut payload = ExecutionPayload::from(block);
        payload.block_hash = B256::with_last_byte(0xfe);
        let err = SealedBlock::try_from(payload).unwrap_err();
        assert!(err.is_block_hash_mismatch());
        assert!(matches!(
            err,
            PayloadError::BlockHash { execution, .. } if execution == expected
        ));
    }

    #[test]
    fn payload_status_serde() {
        let status = PayloadStatus::new(PayloadStatusEnum::Valid, B256::with_last_byte(1));
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "VALID",
                "latestValidHash":
                    "0x0000000000000000000000000000000000000000000000000000000000000001",
            })
        );

        let status = PayloadStatus::from_status(PayloadStatusEnum::Invalid {
            validation_error: "Invalid timestamp".to_string(),
        });
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "INVALID",
                "validationError": "Invalid timestamp",
                "latestValidHash": null,
            })
        );

        let syncing = serde_json::json!({ "status": "SYNCING", "latestValidHash": null });
        let status: PayloadStatus = serde_json::from_value(syncing).unwrap();
        assert!(status.is_syncing());
    }

    #[test]
    fn execution_payload_serde_field_names() {
        let payload = ExecutionPayload {
            block_number: U64::from(2u64),
            base_fee_per_gas: U256::from(7u64),
            ..Default::default()
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["blockNumber"], "0x2");
        assert_eq!(json["baseFeePerGas"], "0x7");
        assert_eq!(json["prevRandao"].as_str().unwrap().len(), 66);
        assert!(json["transactions"].as_array().unwrap().is_empty());

        let back: ExecutionPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn payload_id_serde() {
        let id = PayloadId::new([0xa2, 0x47, 0x24, 0x37, 0x52, 0xeb, 0x10, 0xb4]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"0xa247243752eb10b4\"");
        let back: PayloadId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
