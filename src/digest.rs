//! Content digests used as stable identifiers for sentences and entity mentions.
//!
//! A [`Digest`] is a 128-bit value held as two `u64` halves. Sentence ids and
//! annotation `md5sum`s are digests of the sentence text, so the same text
//! always maps to the same id across services and round trips.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use md5::{Digest as _, Md5};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DigestError, DigestResult};

/// Number of bytes in a digest.
pub const DIGEST_BYTES: usize = 16;

/// A 128-bit content hash.
///
/// Equality and hashing use both halves. The derived ordering compares `high`
/// then `low` as unsigned integers, which is the order of the 128 bits read as
/// one big-endian number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest {
    high: u64,
    low: u64,
}

impl Digest {
    /// Build a digest from its two halves.
    pub const fn from_parts(high: u64, low: u64) -> Self {
        Self { high, low }
    }

    /// Build a digest from exactly 16 raw bytes (big-endian, high half first).
    pub fn from_bytes(bytes: &[u8]) -> DigestResult<Self> {
        let raw: [u8; DIGEST_BYTES] = bytes
            .try_into()
            .map_err(|_| DigestError::InvalidLength {
                actual: bytes.len(),
            })?;
        Ok(Self::from_array(raw))
    }

    fn from_array(raw: [u8; DIGEST_BYTES]) -> Self {
        let mut high = [0u8; 8];
        let mut low = [0u8; 8];
        high.copy_from_slice(&raw[..8]);
        low.copy_from_slice(&raw[8..]);
        Self {
            high: u64::from_be_bytes(high),
            low: u64::from_be_bytes(low),
        }
    }

    /// Decode 32 hexadecimal characters (case-insensitive).
    pub fn from_hex(input: &str) -> DigestResult<Self> {
        if input.len() != DIGEST_BYTES * 2 {
            return Err(DigestError::InvalidFormat {
                input: input.to_string(),
                reason: format!("expected 32 hex characters, got {} bytes", input.len()),
            });
        }
        let bytes = hex::decode(input).map_err(|e| DigestError::InvalidFormat {
            input: input.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_bytes(&bytes)
    }

    /// Hash the UTF-8 encoding of `text`.
    ///
    /// Uses MD5 so ids match the `md5sum` values already stored by existing
    /// pipeline services.
    pub fn from_text(text: &str) -> Self {
        let hash = Md5::digest(text.as_bytes());
        let mut raw = [0u8; DIGEST_BYTES];
        raw.copy_from_slice(&hash);
        Self::from_array(raw)
    }

    /// Upper 64 bits.
    pub fn high(&self) -> u64 {
        self.high
    }

    /// Lower 64 bits.
    pub fn low(&self) -> u64 {
        self.low
    }

    /// Raw big-endian bytes, high half first.
    pub fn to_bytes(&self) -> [u8; DIGEST_BYTES] {
        let mut raw = [0u8; DIGEST_BYTES];
        raw[..8].copy_from_slice(&self.high.to_be_bytes());
        raw[8..].copy_from_slice(&self.low.to_be_bytes());
        raw
    }

    /// The historical comparator: both halves compared as *signed* 64-bit
    /// integers.
    ///
    /// Misorders digests whose top bit is set. Only use it to reproduce sort
    /// orders that were persisted by older services; `Ord` is the correct order.
    pub fn legacy_cmp(&self, other: &Self) -> Ordering {
        (self.high as i64, self.low as i64).cmp(&(other.high as i64, other.low as i64))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.high, self.low)
    }
}

impl FromStr for Digest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_hex(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_text_matches_md5() {
        // md5("") and md5("The quick brown fox jumps over the lazy dog")
        assert_eq!(
            Digest::from_text("").to_string(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
        assert_eq!(
            Digest::from_text("The quick brown fox jumps over the lazy dog").to_string(),
            "9e107d9d372bb6826bd81d3542a419d6"
        );
    }

    #[test]
    fn display_is_zero_padded_lowercase() {
        let d = Digest::from_parts(1, 0xAB);
        assert_eq!(d.to_string(), "000000000000000100000000000000ab");
    }

    #[test]
    fn from_hex_accepts_upper_case() {
        let lower = Digest::from_hex("9e107d9d372bb6826bd81d3542a419d6").unwrap();
        let upper = Digest::from_hex("9E107D9D372BB6826BD81D3542A419D6").unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert!(matches!(
            Digest::from_hex("abc"),
            Err(DigestError::InvalidFormat { .. })
        ));
        assert!(matches!(
            Digest::from_hex("zz107d9d372bb6826bd81d3542a419d6"),
            Err(DigestError::InvalidFormat { .. })
        ));
        assert!(matches!(
            Digest::from_hex("9e107d9d372bb6826bd81d3542a419d600"),
            Err(DigestError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn length_error_reports_bytes() {
        match Digest::from_hex(&"é".repeat(8)) {
            Err(DigestError::InvalidFormat { reason, .. }) => {
                assert_eq!(reason, "expected 32 hex characters, got 16 bytes")
            }
            other => panic!("unexpected result: {other:?}"),
        }
        // Right byte length, but not hex.
        assert!(matches!(
            Digest::from_hex(&"é".repeat(16)),
            Err(DigestError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn from_bytes_rejects_wrong_length() {
        assert!(matches!(
            Digest::from_bytes(&[0u8; 15]),
            Err(DigestError::InvalidLength { actual: 15 })
        ));
        assert!(Digest::from_bytes(&[0u8; 16]).is_ok());
    }

    #[test]
    fn ordering_is_unsigned() {
        let small = Digest::from_parts(1, 0);
        let top_bit = Digest::from_parts(0x8000_0000_0000_0000, 0);
        assert!(small < top_bit);
        // The legacy comparator treats the top bit as a sign bit.
        assert_eq!(small.legacy_cmp(&top_bit), Ordering::Greater);
    }

    #[test]
    fn low_half_breaks_ties() {
        let a = Digest::from_parts(7, 1);
        let b = Digest::from_parts(7, u64::MAX);
        assert!(a < b);
    }

    #[test]
    fn serde_uses_hex_string() {
        let d = Digest::from_text("hello");
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, format!("\"{d}\""));
        let back: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
