use crate::{constants::MINIMUM_GAS_LIMIT, BaseFeeParams, BlockHash, BlockNumHash, BlockNumber};
use alloy_primitives::{keccak256, Address, Bloom, Bytes, B256, B64, U256};
use alloy_rlp::{length_of_length, Decodable, Encodable};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, ops::Deref};

/// An Ethereum block header.
///
/// The header hash (`keccak256` of the RLP encoding) is the block's identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// The hash of the parent block's header.
    pub parent_hash: B256,
    /// The ommers hash. Always the hash of an empty list post-merge.
    pub ommers_hash: B256,
    /// The address that receives the priority fees of the block.
    pub beneficiary: Address,
    /// The root of the state trie after executing this block.
    pub state_root: B256,
    /// The root of the trie built from the block's transactions.
    pub transactions_root: B256,
    /// The root of the trie built from the block's receipts.
    pub receipts_root: B256,
    /// The union of the blooms of all receipts in the block.
    pub logs_bloom: Bloom,
    /// The block's difficulty. Zero for every post-merge block.
    pub difficulty: U256,
    /// The block number.
    pub number: BlockNumber,
    /// The maximum amount of gas the block may consume.
    pub gas_limit: u64,
    /// The amount of gas consumed by the block's transactions.
    pub gas_used: u64,
    /// The block's timestamp in seconds since the unix epoch.
    pub timestamp: u64,
    /// Arbitrary extra bytes. At most 32 bytes for payload blocks; holds the
    /// clique vanity and seal for pre-merge PoA blocks.
    pub extra_data: Bytes,
    /// Pre-merge the PoW mix digest, post-merge the `prevRandao` value
    /// supplied by the consensus layer.
    pub mix_hash: B256,
    /// The PoW nonce. Zero for every post-merge block.
    pub nonce: B64,
    /// The EIP-1559 base fee, if the block is post-London.
    pub base_fee_per_gas: Option<u64>,
}

impl Header {
    /// Computes the block hash by hashing the RLP encoding of the header.
    ///
    /// This is an expensive operation, prefer [`SealedHeader`] if the hash is
    /// needed more than once.
    pub fn hash_slow(&self) -> BlockHash {
        keccak256(alloy_rlp::encode(self))
    }

    /// Seals the header with the computed hash.
    pub fn seal_slow(self) -> SealedHeader {
        let hash = self.hash_slow();
        SealedHeader::new(self, hash)
    }

    /// Seals the header with the given hash.
    ///
    /// The hash is not verified against the header contents.
    pub fn seal(self, hash: BlockHash) -> SealedHeader {
        SealedHeader::new(self, hash)
    }

    /// Returns the base fee the next block must carry according to the
    /// EIP-1559 formula, or `None` if this header is pre-London.
    pub fn next_block_base_fee(&self, params: BaseFeeParams) -> Option<u64> {
        let base_fee = self.base_fee_per_gas?;
        let gas_target = self.gas_limit / params.elasticity_multiplier;

        Some(match self.gas_used.cmp(&gas_target) {
            Ordering::Equal => base_fee,
            Ordering::Greater => {
                let delta = self.gas_used - gas_target;
                let increase = (base_fee as u128 * delta as u128) /
                    gas_target as u128 /
                    params.max_change_denominator as u128;
                base_fee + (increase as u64).max(1)
            }
            Ordering::Less => {
                let delta = gas_target - self.gas_used;
                let decrease = (base_fee as u128 * delta as u128) /
                    gas_target as u128 /
                    params.max_change_denominator as u128;
                base_fee.saturating_sub(decrease as u64)
            }
        })
    }

    /// Returns the gas target of the block under the given base fee params.
    pub const fn gas_target(&self, params: BaseFeeParams) -> u64 {
        self.gas_limit / params.elasticity_multiplier
    }

    /// True if the header carries a zero difficulty, i.e. is a post-merge
    /// block produced from an execution payload.
    pub fn is_zero_difficulty(&self) -> bool {
        self.difficulty.is_zero()
    }

    fn header_payload_length(&self) -> usize {
        let mut length = 0;
        length += self.parent_hash.length();
        length += self.ommers_hash.length();
        length += self.beneficiary.length();
        length += self.state_root.length();
        length += self.transactions_root.length();
        length += self.receipts_root.length();
        length += self.logs_bloom.length();
        length += self.difficulty.length();
        length += self.number.length();
        length += self.gas_limit.length();
        length += self.gas_used.length();
        length += self.timestamp.length();
        length += self.extra_data.length();
        length += self.mix_hash.length();
        length += self.nonce.length();
        if let Some(base_fee) = self.base_fee_per_gas {
            length += base_fee.length();
        }
        length
    }
}

impl Encodable for Header {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        let list_header =
            alloy_rlp::Header { list: true, payload_length: self.header_payload_length() };
        list_header.encode(out);
        self.parent_hash.encode(out);
        self.ommers_hash.encode(out);
        self.beneficiary.encode(out);
        self.state_root.encode(out);
        self.transactions_root.encode(out);
        self.receipts_root.encode(out);
        self.logs_bloom.encode(out);
        self.difficulty.encode(out);
        self.number.encode(out);
        self.gas_limit.encode(out);
        self.gas_used.encode(out);
        self.timestamp.encode(out);
        self.extra_data.encode(out);
        self.mix_hash.encode(out);
        self.nonce.encode(out);
        // The base fee is elided entirely for pre-London headers.
        if let Some(base_fee) = self.base_fee_per_gas {
            base_fee.encode(out);
        }
    }

    fn length(&self) -> usize {
        let payload_length = self.header_payload_length();
        payload_length + length_of_length(payload_length) + 1
    }
}

impl Decodable for Header {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let rlp_head = alloy_rlp::Header::decode(buf)?;
        if !rlp_head.list {
            return Err(alloy_rlp::Error::UnexpectedString)
        }
        let started_len = buf.len();
        let mut this = Self {
            parent_hash: Decodable::decode(buf)?,
            ommers_hash: Decodable::decode(buf)?,
            beneficiary: Decodable::decode(buf)?,
            state_root: Decodable::decode(buf)?,
            transactions_root: Decodable::decode(buf)?,
            receipts_root: Decodable::decode(buf)?,
            logs_bloom: Decodable::decode(buf)?,
            difficulty: Decodable::decode(buf)?,
            number: Decodable::decode(buf)?,
            gas_limit: Decodable::decode(buf)?,
            gas_used: Decodable::decode(buf)?,
            timestamp: Decodable::decode(buf)?,
            extra_data: Decodable::decode(buf)?,
            mix_hash: Decodable::decode(buf)?,
            nonce: Decodable::decode(buf)?,
            base_fee_per_gas: None,
        };
        if started_len - buf.len() < rlp_head.payload_length {
            this.base_fee_per_gas = Some(Decodable::decode(buf)?);
        }
        let consumed = started_len - buf.len();
        if consumed != rlp_head.payload_length {
            return Err(alloy_rlp::Error::ListLengthMismatch {
                expected: rlp_head.payload_length,
                got: consumed,
            })
        }
        Ok(this)
    }
}

/// A [`Header`] that memoizes its block hash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedHeader {
    /// The sealed header.
    header: Header,
    /// The header's hash.
    hash: BlockHash,
}

impl SealedHeader {
    /// Creates a sealed header from the header and its hash.
    pub const fn new(header: Header, hash: BlockHash) -> Self {
        Self { header, hash }
    }

    /// Returns the block hash.
    pub const fn hash(&self) -> BlockHash {
        self.hash
    }

    /// Returns the block number and hash.
    pub const fn num_hash(&self) -> BlockNumHash {
        BlockNumHash { number: self.header.number, hash: self.hash }
    }

    /// Returns a reference to the sealed header.
    pub const fn header(&self) -> &Header {
        &self.header
    }

    /// Extracts the header, dropping the memoized hash.
    pub fn unseal(self) -> Header {
        self.header
    }

    /// Splits the sealed header into its parts.
    pub fn split(self) -> (Header, BlockHash) {
        (self.header, self.hash)
    }
}

impl Deref for SealedHeader {
    type Target = Header;

    fn deref(&self) -> &Self::Target {
        &self.header
    }
}

impl From<SealedHeader> for Header {
    fn from(sealed: SealedHeader) -> Self {
        sealed.unseal()
    }
}

/// Validates that a proposed gas limit is a legal successor of the parent's,
/// i.e. within 1/1024 of it and not below the protocol minimum.
pub fn check_gas_limit(parent: u64, proposed: u64) -> bool {
    let bound = parent / 1024;
    if proposed < MINIMUM_GAS_LIMIT {
        return false
    }
    proposed.abs_diff(parent) < bound.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ETHEREUM_BLOCK_GAS_LIMIT;

    #[test]
    fn header_rlp_roundtrip() {
        let header = Header {
            parent_hash: B256::with_last_byte(1),
            beneficiary: Address::with_last_byte(2),
            state_root: B256::with_last_byte(3),
            number: 100,
            gas_limit: ETHEREUM_BLOCK_GAS_LIMIT,
            gas_used: 21_000,
            timestamp: 1_700_000_000,
            extra_data: Bytes::from_static(b"ember"),
            mix_hash: B256::with_last_byte(4),
            base_fee_per_gas: Some(875),
            ..Default::default()
        };

        let encoded = alloy_rlp::encode(&header);
        let decoded = Header::decode(&mut encoded.as_slice()).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.hash_slow(), header.hash_slow());
    }

    #[test]
    fn header_rlp_roundtrip_pre_london() {
        let header = Header {
            difficulty: U256::from(131_072u64),
            number: 1,
            gas_limit: 5_000,
            timestamp: 1_438_269_988,
            nonce: B64::with_last_byte(0x42),
            base_fee_per_gas: None,
            ..Default::default()
        };

        let encoded = alloy_rlp::encode(&header);
        let decoded = Header::decode(&mut encoded.as_slice()).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn sealed_header_hash_matches_slow_path() {
        let header = Header { number: 7, ..Default::default() };
        let sealed = header.clone().seal_slow();
        assert_eq!(sealed.hash(), header.hash_slow());
        assert_eq!(sealed.unseal(), header);
    }

    #[test]
    fn next_base_fee_at_target_is_unchanged() {
        let header = Header {
            gas_limit: 30_000_000,
            gas_used: 15_000_000,
            base_fee_per_gas: Some(1_000),
            ..Default::default()
        };
        assert_eq!(header.next_block_base_fee(BaseFeeParams::ethereum()), Some(1_000));
    }

    #[test]
    fn next_base_fee_full_block_increases() {
        let header = Header {
            gas_limit: 30_000_000,
            gas_used: 30_000_000,
            base_fee_per_gas: Some(1_000),
            ..Default::default()
        };
        // full block: base fee grows by 1/8
        assert_eq!(header.next_block_base_fee(BaseFeeParams::ethereum()), Some(1_125));
    }

    #[test]
    fn next_base_fee_empty_block_decreases() {
        let header = Header {
            gas_limit: 30_000_000,
            gas_used: 0,
            base_fee_per_gas: Some(1_000),
            ..Default::default()
        };
        // empty block: base fee shrinks by 1/8
        assert_eq!(header.next_block_base_fee(BaseFeeParams::ethereum()), Some(875));
    }

    #[test]
    fn next_base_fee_pre_london_is_none() {
        let header = Header { gas_limit: 30_000_000, ..Default::default() };
        assert_eq!(header.next_block_base_fee(BaseFeeParams::ethereum()), None);
    }
}
