//! Deterministic proposal identity.
//!
//! A proposal is identified by the Blake2b-256 digest of a canonical
//! encoding of its defining fields:
//!
//! ```text
//! "agora.proposal.v1"
//! u64-le n ‖ recipient_0 (32 bytes) ‖ … ‖ recipient_{n-1}
//! u64-le n ‖ (u64-le len ‖ payload_i bytes) for each payload
//! u64-le n ‖ value_i (u128-le) for each value
//! description hash (32 bytes)
//! ```
//!
//! Every variable-length field is length-prefixed and every sequence is
//! count-prefixed, so the encoding is injective and order-sensitive:
//! swapping two calls, or moving bytes between adjacent payloads, yields a
//! different identity.

use crate::hash::{blake2b_256, Blake2b256};
use agora_types::{Address, DescriptionHash, ProposalId};
use blake2::Digest;

/// Domain separation tag prepended to every proposal encoding.
pub const PROPOSAL_DOMAIN: &[u8] = b"agora.proposal.v1";

/// Digest of a human-readable proposal description (UTF-8 bytes).
pub fn description_hash(description: &str) -> DescriptionHash {
    DescriptionHash::new(blake2b_256(description.as_bytes()))
}

/// Compute the identity of a proposal from its defining fields.
///
/// The three call sequences are hashed as given; callers validate that they
/// are parallel before relying on the result as a registry key.
pub fn proposal_id(
    recipients: &[Address],
    payloads: &[Vec<u8>],
    values: &[u128],
    description_hash: &DescriptionHash,
) -> ProposalId {
    let mut hasher = Blake2b256::new();
    hasher.update(PROPOSAL_DOMAIN);

    hasher.update((recipients.len() as u64).to_le_bytes());
    for recipient in recipients {
        hasher.update(recipient.as_bytes());
    }

    hasher.update((payloads.len() as u64).to_le_bytes());
    for payload in payloads {
        hasher.update((payload.len() as u64).to_le_bytes());
        hasher.update(payload);
    }

    hasher.update((values.len() as u64).to_le_bytes());
    for value in values {
        hasher.update(value.to_le_bytes());
    }

    hasher.update(description_hash.as_bytes());
    ProposalId::new(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::repeat_byte(b)
    }

    #[test]
    fn identical_inputs_identical_id() {
        let d = description_hash("Test description");
        let a = proposal_id(&[addr(1)], &[vec![1, 2, 3]], &[10], &d);
        let b = proposal_id(&[addr(1)], &[vec![1, 2, 3]], &[10], &d);
        assert_eq!(a, b);
    }

    #[test]
    fn description_changes_id() {
        let a = proposal_id(&[addr(1)], &[vec![]], &[0], &description_hash("a"));
        let b = proposal_id(&[addr(1)], &[vec![]], &[0], &description_hash("b"));
        assert_ne!(a, b);
    }

    #[test]
    fn call_order_matters() {
        let d = description_hash("swap");
        let a = proposal_id(&[addr(1), addr(2)], &[vec![1], vec![2]], &[0, 0], &d);
        let b = proposal_id(&[addr(2), addr(1)], &[vec![2], vec![1]], &[0, 0], &d);
        assert_ne!(a, b);
    }

    #[test]
    fn payload_boundaries_matter() {
        let d = description_hash("split");
        let a = proposal_id(&[addr(1), addr(1)], &[vec![1, 2], vec![3]], &[0, 0], &d);
        let b = proposal_id(&[addr(1), addr(1)], &[vec![1], vec![2, 3]], &[0, 0], &d);
        assert_ne!(a, b);
    }

    #[test]
    fn value_changes_id() {
        let d = description_hash("value");
        let a = proposal_id(&[addr(1)], &[vec![]], &[10], &d);
        let b = proposal_id(&[addr(1)], &[vec![]], &[11], &d);
        assert_ne!(a, b);
    }

    #[test]
    fn empty_proposal_still_hashes() {
        let id = proposal_id(&[], &[], &[], &description_hash(""));
        assert!(!id.is_zero());
    }

    #[test]
    fn description_hash_is_blake2b_of_utf8() {
        assert_eq!(
            description_hash("Test description").as_bytes(),
            &blake2b_256(b"Test description")
        );
    }
}
