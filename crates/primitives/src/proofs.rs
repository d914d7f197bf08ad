//! Helpers for calculating the merkle-patricia trie commitments carried in a
//! block header.

use crate::Receipt;
use alloy_primitives::{Bloom, Bytes, B256};
use alloy_rlp::Encodable;
use alloy_trie::root::ordered_trie_root_with_encoder;

pub use alloy_trie::EMPTY_ROOT_HASH;

/// Calculates the root of the transactions trie.
///
/// Transactions enter the trie in their enveloped encoding, which is exactly
/// the byte string carried by the block body and the execution payload.
pub fn calculate_transaction_root(transactions: &[Bytes]) -> B256 {
    ordered_trie_root_with_encoder(transactions, |tx, buf| buf.extend_from_slice(tx.as_ref()))
}

/// Calculates the root of the receipts trie.
pub fn calculate_receipt_root(receipts: &[Receipt]) -> B256 {
    ordered_trie_root_with_encoder(receipts, |receipt, buf| receipt.encode(buf))
}

/// Folds the blooms of the given receipts into the block's logs bloom.
pub fn calculate_logs_bloom<'a>(receipts: impl IntoIterator<Item = &'a Receipt>) -> Bloom {
    receipts.into_iter().fold(Bloom::ZERO, |bloom, receipt| bloom | receipt.bloom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_roots() {
        assert_eq!(calculate_transaction_root(&[]), EMPTY_ROOT_HASH);
        assert_eq!(calculate_receipt_root(&[]), EMPTY_ROOT_HASH);
        assert_eq!(calculate_logs_bloom(std::iter::empty()), Bloom::ZERO);
    }

    #[test]
    fn transaction_root_is_order_sensitive() {
        let a = Bytes::from_static(&[0x01, 0x02]);
        let b = Bytes::from_static(&[0x03]);
        assert_ne!(
            calculate_transaction_root(&[a.clone(), b.clone()]),
            calculate_transaction_root(&[b, a])
        );
    }

    #[test]
    fn logs_bloom_is_union() {
        let mut first = Bloom::ZERO;
        first.0[0] = 0b0000_0001;
        let mut second = Bloom::ZERO;
        second.0[0] = 0b1000_0000;

        let receipts =
            [Receipt { bloom: first, ..Receipt::ok(1) }, Receipt { bloom: second, ..Receipt::ok(2) }];
        let bloom = calculate_logs_bloom(receipts.iter());
        assert_eq!(bloom.0[0], 0b1000_0001);
    }
}
