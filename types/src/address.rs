//! Account address type.

use crate::error::AgoraError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A 32-byte account address.
///
/// Identifies depositors, voters, the administrator, the custody account,
/// the token ledger and call targets alike. The all-zero address is the
/// "absent" address and is rejected wherever a real account is required.
///
/// Human-readable formats (TOML, JSON) carry the address as a `0x`-prefixed
/// hex string; binary formats carry the raw 32 bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; 32]);

impl Address {
    /// The zero address.
    pub const ZERO: Self = Self([0u8; 32]);

    /// The prefix used in the textual form.
    pub const PREFIX: &'static str = "0x";

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// An address with every byte set to `byte`. Handy for fixtures.
    pub const fn repeat_byte(byte: u8) -> Self {
        Self([byte; 32])
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{}\u{2026})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = AgoraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix(Self::PREFIX).unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| AgoraError::InvalidAddress(format!("{s}: {e}")))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| AgoraError::InvalidAddress(format!("{s}: expected 32 bytes, got {}", b.len())))?;
        Ok(Self(arr))
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            <[u8; 32]>::deserialize(deserializer).map(Self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_zero() {
        assert!(Address::ZERO.is_zero());
        assert!(Address::default().is_zero());
        assert!(!Address::repeat_byte(1).is_zero());
    }

    #[test]
    fn display_parses_back() {
        let addr = Address::repeat_byte(0xab);
        let text = addr.to_string();
        assert!(text.starts_with("0x"));
        assert_eq!(text.len(), 66);
        assert_eq!(text.parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn parse_without_prefix() {
        let digits = "11".repeat(32);
        assert_eq!(digits.parse::<Address>().unwrap(), Address::repeat_byte(0x11));
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!(matches!(
            "0x1234".parse::<Address>(),
            Err(AgoraError::InvalidAddress(_))
        ));
    }

    #[test]
    fn parse_rejects_non_hex() {
        let bad = format!("0x{}", "zz".repeat(32));
        assert!(bad.parse::<Address>().is_err());
    }

    #[test]
    fn debug_is_abbreviated() {
        let dbg = format!("{:?}", Address::repeat_byte(0xff));
        assert_eq!(dbg, "Address(0xffffffff\u{2026})");
    }
}
