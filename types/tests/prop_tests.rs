use proptest::prelude::*;

use agora_types::{Address, ProposalId, Timestamp};

proptest! {
    /// Address text form parses back to the same bytes.
    #[test]
    fn address_display_parse_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let addr = Address::new(bytes);
        let parsed: Address = addr.to_string().parse().unwrap();
        prop_assert_eq!(parsed, addr);
    }

    /// Address::is_zero is true only for all-zero bytes.
    #[test]
    fn address_is_zero_correct(bytes in prop::array::uniform32(0u8..)) {
        prop_assert_eq!(Address::new(bytes).is_zero(), bytes == [0u8; 32]);
    }

    /// Binary encoding carries raw bytes, not the hex string.
    #[test]
    fn address_bincode_is_raw(bytes in prop::array::uniform32(0u8..)) {
        let addr = Address::new(bytes);
        let encoded = bincode::serialize(&addr).unwrap();
        prop_assert_eq!(encoded.len(), 32);
        let decoded: Address = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, addr);
    }

    /// ProposalId ordering follows byte ordering.
    #[test]
    fn proposal_id_ordering(a in prop::array::uniform32(0u8..), b in prop::array::uniform32(0u8..)) {
        prop_assert_eq!(ProposalId::new(a) < ProposalId::new(b), a < b);
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        prop_assert_eq!(Timestamp::new(a) <= Timestamp::new(b), a <= b);
    }

    /// checked_add agrees with u64::checked_add.
    #[test]
    fn timestamp_checked_add(a in 0u64..u64::MAX, d in 0u64..u64::MAX) {
        prop_assert_eq!(
            Timestamp::new(a).checked_add(d).map(|t| t.as_ticks()),
            a.checked_add(d)
        );
    }
}
