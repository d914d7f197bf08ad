//! The clique block seal.
//!
//! A clique seal is a recoverable secp256k1 signature over the hash of the
//! header with the seal bytes stripped, appended to the 32-byte vanity
//! prefix of `extraData`.
//!
//! See also <https://eips.ethereum.org/EIPS/eip-225>.

use ember_primitives::{
    constants::{EXTRA_SEAL, EXTRA_VANITY},
    keccak256, Address, Bytes, Header, SealedHeader,
};
use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId},
    Message, PublicKey, SecretKey, SECP256K1,
};

/// Errors produced while sealing or verifying a clique header.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CliqueError {
    /// The header's extra data is too short to carry a seal.
    #[error("missing signature in extra data: {extra_data}")]
    MissingSignature {
        /// The offending extra data.
        extra_data: Bytes,
    },
    /// The seal bytes do not form a valid recoverable signature.
    #[error(transparent)]
    Secp256k1(#[from] secp256k1::Error),
}

/// Seals clique headers with a local secp256k1 key.
#[derive(Debug, Clone)]
pub struct CliqueSigner {
    secret_key: SecretKey,
    address: Address,
}

impl CliqueSigner {
    /// Creates a signer from the given secret key.
    pub fn new(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(SECP256K1, &secret_key);
        Self { secret_key, address: public_key_to_address(&public_key) }
    }

    /// The address the signer seals under.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Seals the header: signs the hash of the header carrying only the
    /// vanity prefix, then appends the signature to `extraData`.
    pub fn seal_header(&self, mut header: Header) -> Result<SealedHeader, CliqueError> {
        let mut extra_data = vec![0u8; EXTRA_VANITY];
        let vanity_len = header.extra_data.len().min(EXTRA_VANITY);
        extra_data[..vanity_len].copy_from_slice(&header.extra_data[..vanity_len]);

        header.extra_data = Bytes::from(extra_data.clone());
        let seal_hash = header.hash_slow();

        let message = Message::from_digest(seal_hash.0);
        let signature = SECP256K1.sign_ecdsa_recoverable(&message, &self.secret_key);
        let (recovery_id, sig) = signature.serialize_compact();

        extra_data.extend_from_slice(&sig);
        extra_data.push(recovery_id.to_i32() as u8);
        header.extra_data = Bytes::from(extra_data);

        Ok(header.seal_slow())
    }
}

/// Recovers the address that sealed the given clique header.
pub fn recover_signer(header: &Header) -> Result<Address, CliqueError> {
    let extra_data = &header.extra_data;
    let end_byte = extra_data
        .len()
        .checked_sub(EXTRA_SEAL)
        .ok_or_else(|| CliqueError::MissingSignature { extra_data: extra_data.clone() })?;
    let seal = &extra_data[end_byte..];

    let mut unsealed = header.clone();
    unsealed.extra_data = Bytes::from(extra_data[..end_byte].to_vec());
    let seal_hash = unsealed.hash_slow();

    let recovery_id = RecoveryId::from_i32(seal[64] as i32)?;
    let signature = RecoverableSignature::from_compact(&seal[..64], recovery_id)?;
    let message = Message::from_digest(seal_hash.0);
    let public_key = SECP256K1.recover_ecdsa(&message, &signature)?;

    Ok(public_key_to_address(&public_key))
}

fn public_key_to_address(public_key: &PublicKey) -> Address {
    // strip the uncompressed-encoding tag byte before hashing
    let hash = keccak256(&public_key.serialize_uncompressed()[1..]);
    Address::from_slice(&hash[12..])
}
