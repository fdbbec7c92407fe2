//! Transport codecs for big integers.
//!
//! JSON has no integer type wide enough for a 2048-bit value, so integers
//! travel as decimal strings. Small values may also arrive as plain JSON
//! numbers; both are accepted on input, only strings are produced on output.
//! Public keys additionally have a base64 form over fixed-width big-endian
//! bytes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use num_bigint::BigUint;

use super::arith::{bytes_to_int, int_to_bytes_padded, parse_decimal};
use crate::zkp::ZkpError;

/// Either shape an integer may take on the wire.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(untagged)]
pub enum DecimalOrNumber {
    Text(String),
    Number(u64),
}

impl DecimalOrNumber {
    /// Parse into a `BigUint`, rejecting anything that isn't plain digits.
    pub fn to_biguint(&self) -> Result<BigUint, ZkpError> {
        match self {
            DecimalOrNumber::Text(s) => parse_decimal(s),
            DecimalOrNumber::Number(n) => Ok(BigUint::from(*n)),
        }
    }
}

/// `#[serde(with = "decimal")]` for `BigUint` fields.
pub mod decimal {
    use num_bigint::BigUint;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::DecimalOrNumber;

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_str_radix(10))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        DecimalOrNumber::deserialize(deserializer)?
            .to_biguint()
            .map_err(de::Error::custom)
    }
}

/// `#[serde(with = "decimal_string")]`: strings only.
///
/// [`decimal`] relies on self-describing input to tell a string from a
/// number. Types persisted with bincode use this variant instead.
pub mod decimal_string {
    use num_bigint::BigUint;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::crypto::parse_decimal;

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        super::decimal::serialize(value, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_decimal(&s).map_err(de::Error::custom)
    }
}

/// Base64 (standard alphabet, padded) of `value` as exactly `width` bytes.
pub fn to_base64_fixed(value: &BigUint, width: usize) -> Result<String, ZkpError> {
    Ok(STANDARD.encode(int_to_bytes_padded(value, width)?))
}

/// Inverse of [`to_base64_fixed`]. The decoded length must equal `width`.
pub fn from_base64_fixed(encoded: &str, width: usize) -> Result<BigUint, ZkpError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|_| ZkpError::MalformedProof("invalid base64".into()))?;
    if bytes.len() != width {
        return Err(ZkpError::InvalidRange(format!(
            "expected {} bytes, got {}",
            width,
            bytes.len()
        )));
    }
    Ok(bytes_to_int(&bytes))
}
