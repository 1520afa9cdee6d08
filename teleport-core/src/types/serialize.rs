//! Serde helpers for amounts. Teleport amounts routinely exceed the 53 bits a
//! JSON number can carry in most clients, so they travel as decimal strings.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::de::{self, Visitor};

/// Accepts a string or any unsigned JSON integer that fits `T`.
struct StrOrNum<T>(PhantomData<T>);

impl<'de, T> Visitor<'de> for StrOrNum<T>
where
    T: TryFrom<u64> + TryFrom<u128> + FromStrHex,
{
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an unsigned integer or a decimal or 0x-prefixed string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<T, E> {
        T::try_from(v).map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<T, E> {
        T::try_from(v).map_err(|_| E::custom(format!("{v} is out of range")))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<T, E> {
        u64::try_from(v)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
            .and_then(|v| self.visit_u64(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<T, E> {
        T::from_str_hex(v).map_err(E::custom)
    }
}

/// Parse decimal, or 0x-prefixed hex as emitted by some APIs.
trait FromStrHex: FromStr<Err = std::num::ParseIntError> {
    fn from_str_hex(s: &str) -> Result<Self, std::num::ParseIntError>;
}

impl FromStrHex for u128 {
    fn from_str_hex(s: &str) -> Result<Self, std::num::ParseIntError> {
        match s.strip_prefix("0x") {
            Some(hex) => u128::from_str_radix(hex, 16),
            None => s.parse(),
        }
    }
}

impl FromStrHex for u64 {
    fn from_str_hex(s: &str) -> Result<Self, std::num::ParseIntError> {
        match s.strip_prefix("0x") {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => s.parse(),
        }
    }
}

/// `u128` as a decimal string. Plain JSON numbers are accepted when reading.
pub mod dec_u128 {
    use std::marker::PhantomData;

    use serde::{Deserializer, Serializer};

    use super::StrOrNum;

    /// Write as a decimal string
    pub fn serialize<S: Serializer>(value: &u128, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_string())
    }

    /// Read a string or a number
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u128, D::Error> {
        d.deserialize_any(StrOrNum::<u128>(PhantomData))
    }
}

/// `u64` as a decimal string. Plain JSON numbers are accepted when reading.
pub mod dec_u64 {
    use std::marker::PhantomData;

    use serde::{Deserializer, Serializer};

    use super::StrOrNum;

    /// Write as a decimal string
    pub fn serialize<S: Serializer>(value: &u64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_string())
    }

    /// Read a string or a number
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        d.deserialize_any(StrOrNum::<u64>(PhantomData))
    }
}

#[cfg(test)]
mod test {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Amount {
        #[serde(with = "super::dec_u128")]
        value: u128,
    }

    #[test]
    fn amounts_are_strings() {
        let json = serde_json::to_string(&Amount { value: u128::MAX }).unwrap();
        assert_eq!(
            json,
            r#"{"value":"340282366920938463463374607431768211455"}"#
        );
    }

    #[test]
    fn numbers_and_hex_are_accepted() {
        let a: Amount = serde_json::from_str(r#"{"value":42}"#).unwrap();
        assert_eq!(a.value, 42);
        let a: Amount = serde_json::from_str(r#"{"value":"0x2a"}"#).unwrap();
        assert_eq!(a.value, 42);
        let a: Amount = serde_json::from_str(r#"{"value":"42"}"#).unwrap();
        assert_eq!(a.value, 42);
    }

    #[derive(Deserialize, PartialEq, Debug)]
    struct Timestamp {
        #[serde(with = "super::dec_u64")]
        value: u64,
    }

    #[test]
    fn negative_and_oversized_numbers_are_rejected() {
        assert!(serde_json::from_str::<Amount>(r#"{"value":-1}"#).is_err());
        assert!(serde_json::from_str::<Timestamp>(r#"{"value":"18446744073709551616"}"#).is_err());
        let t: Timestamp = serde_json::from_str(r#"{"value":1700000000}"#).unwrap();
        assert_eq!(t.value, 1_700_000_000);
    }
}
