//! The swarm identifier: a 20-byte hash naming the content being shared.
use std::fmt;
use std::str::FromStr;

use serde::de::Visitor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// The length in bytes of an info hash.
pub const INFO_HASH_BYTES_LEN: usize = 20;

/// 20-byte identifier of a swarm (hash of the content metadata).
///
/// Values are kept opaque; the tracker never recomputes or verifies them.
/// The textual form is 40 lowercase hex characters:
///
/// ```
/// use anomos_tracker_primitives::info_hash::InfoHash;
///
/// let info_hash: InfoHash = "3b245504cf5f11bbdbe1201cea6a6bf45aee1bc0".parse().unwrap();
///
/// assert_eq!(info_hash.to_string(), "3b245504cf5f11bbdbe1201cea6a6bf45aee1bc0");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InfoHash([u8; INFO_HASH_BYTES_LEN]);

impl InfoHash {
    /// Returns the raw bytes of the info hash.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; INFO_HASH_BYTES_LEN] {
        &self.0
    }

    /// Returns the info hash as a 40-character lowercase hex string.
    #[must_use]
    pub fn to_hex_string(&self) -> String {
        let mut buffer = [0u8; INFO_HASH_BYTES_LEN * 2];
        let encoded = binascii::bin2hex(&self.0, &mut buffer).expect("output buffer has the exact size");
        std::str::from_utf8(encoded)
            .expect("hex digits are valid UTF-8")
            .to_owned()
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_string())
    }
}

impl fmt::Debug for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InfoHash({})", self.to_hex_string())
    }
}

impl From<[u8; INFO_HASH_BYTES_LEN]> for InfoHash {
    fn from(bytes: [u8; INFO_HASH_BYTES_LEN]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for InfoHash {
    type Error = InvalidInfoHashError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; INFO_HASH_BYTES_LEN] = bytes
            .try_into()
            .map_err(|_| InvalidInfoHashError::InvalidLength { len: bytes.len() })?;
        Ok(Self(bytes))
    }
}

impl FromStr for InfoHash {
    type Err = InvalidInfoHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != INFO_HASH_BYTES_LEN * 2 {
            return Err(InvalidInfoHashError::InvalidHexLength { len: s.len() });
        }
        let mut bytes = [0u8; INFO_HASH_BYTES_LEN];
        binascii::hex2bin(s.as_bytes(), &mut bytes).map_err(|_| InvalidInfoHashError::InvalidHexChars)?;
        Ok(Self(bytes))
    }
}

/// Errors raised when converting raw bytes or hex strings into an [`InfoHash`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidInfoHashError {
    #[error("invalid info hash length: {len}, expected {INFO_HASH_BYTES_LEN}")]
    InvalidLength { len: usize },

    #[error("invalid info hash hex length: {len}, expected {}", INFO_HASH_BYTES_LEN * 2)]
    InvalidHexLength { len: usize },

    #[error("info hash contains non-hex characters")]
    InvalidHexChars,
}

impl Serialize for InfoHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex_string())
    }
}

impl<'de> Deserialize<'de> for InfoHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(InfoHashVisitor)
    }
}

struct InfoHashVisitor;

impl Visitor<'_> for InfoHashVisitor {
    type Value = InfoHash;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a 40-character hex string")
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse()
            .map_err(|_| E::invalid_value(serde::de::Unexpected::Str(v), &"a 40-character hex string"))
    }

    // Bencoded sources hand strings over as raw bytes.
    fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        let s = std::str::from_utf8(v)
            .map_err(|_| E::invalid_value(serde::de::Unexpected::Bytes(v), &"a 40-character hex string"))?;
        self.visit_str(s)
    }
}

#[cfg(test)]
mod tests {

    mod the_info_hash {
        use std::str::FromStr;

        use crate::info_hash::{InfoHash, InvalidInfoHashError};

        #[test]
        fn it_should_be_parsed_from_a_40_char_hex_string() {
            let info_hash = InfoHash::from_str("3b245504cf5f11bbdbe1201cea6a6bf45aee1bc0").unwrap();

            assert_eq!(info_hash.to_hex_string(), "3b245504cf5f11bbdbe1201cea6a6bf45aee1bc0");
        }

        #[test]
        fn it_should_reject_hex_strings_with_the_wrong_length() {
            let result = InfoHash::from_str("3b2455");

            assert_eq!(result.unwrap_err(), InvalidInfoHashError::InvalidHexLength { len: 6 });
        }

        #[test]
        fn it_should_reject_non_hex_characters() {
            let result = InfoHash::from_str("ZZ245504cf5f11bbdbe1201cea6a6bf45aee1bc0");

            assert_eq!(result.unwrap_err(), InvalidInfoHashError::InvalidHexChars);
        }

        #[test]
        fn it_should_be_built_from_a_20_byte_slice() {
            let info_hash = InfoHash::try_from([255u8; 20].as_slice()).unwrap();

            assert_eq!(info_hash, InfoHash::from([255u8; 20]));
        }

        #[test]
        fn it_should_reject_slices_with_the_wrong_length() {
            let result = InfoHash::try_from([255u8; 19].as_slice());

            assert_eq!(result.unwrap_err(), InvalidInfoHashError::InvalidLength { len: 19 });
        }

        #[test]
        fn it_should_serialize_to_its_hex_form() {
            let info_hash: InfoHash = "3b245504cf5f11bbdbe1201cea6a6bf45aee1bc0".parse().unwrap();

            let json = serde_json::to_string(&info_hash).unwrap();

            assert_eq!(json, "\"3b245504cf5f11bbdbe1201cea6a6bf45aee1bc0\"");
        }
    }
}
