//! Types describing a payload build request and its result.

use ember_primitives::{keccak256, Address, SealedBlock, B256};
use ember_rpc_types::{ExecutionPayload, PayloadAttributes, PayloadId};
use std::sync::Arc;

/// A payload built for a consensus-client request, ready to be served by
/// `engine_getPayloadV1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPayload {
    /// Identifier of the payload.
    id: PayloadId,
    /// The built block.
    block: Arc<SealedBlock>,
}

impl BuiltPayload {
    /// Initializes the payload with the given block.
    pub const fn new(id: PayloadId, block: Arc<SealedBlock>) -> Self {
        Self { id, block }
    }

    /// Returns the identifier of the payload.
    pub const fn id(&self) -> PayloadId {
        self.id
    }

    /// Returns the built block.
    pub fn block(&self) -> &SealedBlock {
        &self.block
    }
}

impl From<BuiltPayload> for ExecutionPayload {
    fn from(payload: BuiltPayload) -> Self {
        Arc::unwrap_or_clone(payload.block).into()
    }
}

/// Container for all components required to build a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadBuilderAttributes {
    /// Id of the payload.
    pub id: PayloadId,
    /// Parent block to build the payload on top of.
    pub parent: B256,
    /// Unix timestamp for the generated payload.
    pub timestamp: u64,
    /// Address of the recipient for collecting transaction fees.
    pub suggested_fee_recipient: Address,
    /// Randomness value for the generated payload.
    pub prev_randao: B256,
}

impl PayloadBuilderAttributes {
    /// Creates the build attributes for the given parent block, deriving the
    /// unique [`PayloadId`].
    pub fn new(parent: B256, attributes: PayloadAttributes) -> Self {
        let id = payload_id(&parent, &attributes);
        Self {
            id,
            parent,
            timestamp: attributes.timestamp.to(),
            suggested_fee_recipient: attributes.suggested_fee_recipient,
            prev_randao: attributes.prev_randao,
        }
    }

    /// Returns the identifier of the payload.
    pub const fn payload_id(&self) -> PayloadId {
        self.id
    }
}

/// Generates the payload id for the configured payload.
///
/// Returns an 8-byte identifier: the keccak hash of the head block hash and
/// the attribute fields, truncated. Equal inputs always produce equal ids.
pub(crate) fn payload_id(parent: &B256, attributes: &PayloadAttributes) -> PayloadId {
    let mut buf = Vec::with_capacity(32 + 8 + 32 + 20);
    buf.extend_from_slice(parent.as_slice());
    buf.extend_from_slice(&attributes.timestamp.to::<u64>().to_be_bytes());
    buf.extend_from_slice(attributes.prev_randao.as_slice());
    buf.extend_from_slice(attributes.suggested_fee_recipient.as_slice());

    let out = keccak256(&buf);
    PayloadId::new(out[..8].try_into().expect("sufficient length"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_primitives::U64;

    fn attributes(timestamp: u64) -> PayloadAttributes {
        PayloadAttributes {
            timestamp: U64::from(timestamp),
            prev_randao: B256::with_last_byte(0x0a),
            suggested_fee_recipient: Address::with_last_byte(0x0b),
        }
    }

    #[test]
    fn payload_id_is_deterministic() {
        let parent = B256::with_last_byte(1);
        assert_eq!(
            payload_id(&parent, &attributes(5)),
            payload_id(&parent, &attributes(5)),
        );
    }

    #[test]
    fn payload_id_depends_on_every_input() {
        let parent = B256::with_last_byte(1);
        let base = payload_id(&parent, &attributes(5));

        assert_ne!(base, payload_id(&B256::with_last_byte(2), &attributes(5)));
        assert_ne!(base, payload_id(&parent, &attributes(6)));

        let mut randao = attributes(5);
        randao.prev_randao = B256::with_last_byte(0xcc);
        assert_ne!(base, payload_id(&parent, &randao));

        let mut recipient = attributes(5);
        recipient.suggested_fee_recipient = Address::with_last_byte(0xdd);
        assert_ne!(base, payload_id(&parent, &recipient));
    }

    #[test]
    fn builder_attributes_carry_the_derived_id() {
        let parent = B256::with_last_byte(7);
        let attrs = PayloadBuilderAttributes::new(parent, attributes(42));
        assert_eq!(attrs.payload_id(), payload_id(&parent, &attributes(42)));
        assert_eq!(attrs.timestamp, 42);
        assert_eq!(attrs.parent, parent);
    }
}
