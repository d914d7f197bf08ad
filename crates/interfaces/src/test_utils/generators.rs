use ember_primitives::{
    constants::{EIP1559_INITIAL_BASE_FEE, EMPTY_OMMER_ROOT_HASH, ETHEREUM_BLOCK_GAS_LIMIT},
    proofs, Block, BlockBody, Bytes, Header, SealedBlock, SealedHeader, B256,
};
use rand::Rng;

/// Generates a random zero-difficulty header at the given height.
///
/// If no parent hash is given, a random one is used.
pub fn random_header(number: u64, parent: Option<B256>) -> SealedHeader {
    let mut rng = rand::thread_rng();
    Header {
        parent_hash: parent.unwrap_or_else(|| B256::from(rng.gen::<[u8; 32]>())),
        ommers_hash: EMPTY_OMMER_ROOT_HASH,
        number,
        gas_limit: ETHEREUM_BLOCK_GAS_LIMIT,
        timestamp: number * 12,
        state_root: B256::from(rng.gen::<[u8; 32]>()),
        base_fee_per_gas: Some(EIP1559_INITIAL_BASE_FEE),
        ..Default::default()
    }
    .seal_slow()
}

/// Generates a random block with `tx_count` opaque transactions. The
/// transactions root matches the body; the remaining commitments are random.
pub fn random_block(number: u64, parent: Option<B256>, tx_count: Option<u8>) -> SealedBlock {
    let mut rng = rand::thread_rng();
    let transactions: Vec<Bytes> = (0..tx_count.unwrap_or_default())
        .map(|_| {
            let mut raw = vec![0u8; rng.gen_range(32..128)];
            rng.fill(raw.as_mut_slice());
            raw.into()
        })
        .collect();

    let mut header = random_header(number, parent).unseal();
    header.transactions_root = proofs::calculate_transaction_root(&transactions);
    header.gas_used = transactions.len() as u64 * 21_000;

    Block { header, body: BlockBody { transactions } }.seal_slow()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_block_commits_to_its_body() {
        let block = random_block(3, None, Some(4));
        assert_eq!(
            block.header.transactions_root,
            proofs::calculate_transaction_root(&block.body.transactions)
        );
        assert_eq!(block.number, 3);
        assert_eq!(block.hash(), block.header.header().hash_slow());
    }
}
