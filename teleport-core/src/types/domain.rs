use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::utils::{decode_hex, fmt_bytes};
use crate::{GuidError, H256};

/// A 32-byte domain identifier, e.g. `ETH-MAIN-A` or `OPT-MAIN-A`.
///
/// Built from a human readable name by right-padding its UTF-8 bytes with
/// zeros, the same layout `formatBytes32String` produces on-chain.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct DomainId([u8; 32]);

impl DomainId {
    /// Build from raw bytes
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Build from a name of at most 32 bytes
    pub fn from_name(name: &str) -> Result<Self, GuidError> {
        let raw = name.as_bytes();
        if raw.len() > 32 {
            return Err(GuidError::DomainTooLong(name.to_owned()));
        }
        let mut bytes = [0u8; 32];
        bytes[..raw.len()].copy_from_slice(raw);
        Ok(Self(bytes))
    }

    /// The raw 32 bytes
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The human readable name, if the id is zero-padded UTF-8
    pub fn name(&self) -> Option<&str> {
        let end = self.0.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        std::str::from_utf8(&self.0[..end]).ok()
    }
}

impl From<H256> for DomainId {
    fn from(h: H256) -> Self {
        Self(h.0)
    }
}

impl From<DomainId> for H256 {
    fn from(d: DomainId) -> Self {
        H256(d.0)
    }
}

impl FromStr for DomainId {
    type Err = GuidError;

    /// Accepts either a name or a 0x-prefixed 32 byte hex string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("0x") && s.len() == 66 {
            let raw = decode_hex(s).map_err(|_| GuidError::DomainTooLong(s.to_owned()))?;
            let mut bytes = [0u8; 32];
            bytes.copy_from_slice(&raw);
            return Ok(Self(bytes));
        }
        Self::from_name(s)
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) if !name.is_empty() && name.chars().all(|c| !c.is_control()) => {
                f.write_str(name)
            }
            _ => f.write_str(&fmt_bytes(&self.0)),
        }
    }
}

impl fmt::Debug for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DomainId({})", self)
    }
}

impl Serialize for DomainId {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DomainId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn name_round_trips_through_display() {
        let domain: DomainId = "ETH-MAIN-A".parse().unwrap();
        assert_eq!(&domain.as_bytes()[..10], b"ETH-MAIN-A");
        assert!(domain.as_bytes()[10..].iter().all(|b| *b == 0));
        assert_eq!(domain.to_string(), "ETH-MAIN-A");
    }

    #[test]
    fn rejects_long_names() {
        let name = "A".repeat(33);
        assert!(DomainId::from_name(&name).is_err());
    }

    #[test]
    fn parses_hex_ids() {
        let hex = format!("0x{}", "11".repeat(32));
        let domain: DomainId = hex.parse().unwrap();
        assert_eq!(domain.as_bytes(), &[0x11; 32]);
        assert_eq!(domain.to_string(), "0x".to_owned() + &"11".repeat(32));
    }
}
