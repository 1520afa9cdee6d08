use sha3::{Digest, Keccak256};

use crate::H256;

/// Strips the '0x' prefix off of hex string so it can be deserialized.
///
/// # Arguments
///
/// * `s` - The hex str
pub fn strip_0x_prefix(s: &str) -> &str {
    if s.len() < 2 || &s[..2] != "0x" {
        s
    } else {
        &s[2..]
    }
}

/// Keccak256 of the given bytes.
pub fn keccak256(data: impl AsRef<[u8]>) -> H256 {
    H256::from_slice(Keccak256::digest(data.as_ref()).as_slice())
}

/// Format a byte slice as a 0x-prefixed hex string.
pub fn fmt_bytes(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode a hex string, tolerating a `0x` prefix.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(strip_0x_prefix(s))
}

/// Left-pad `bytes` into a 32 byte word. Longer inputs keep their trailing
/// 32 bytes.
pub fn left_pad_32(bytes: &[u8]) -> [u8; 32] {
    let mut word = [0u8; 32];
    let len = bytes.len().min(32);
    word[32 - len..].copy_from_slice(&bytes[bytes.len() - len..]);
    word
}
