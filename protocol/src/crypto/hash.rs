//! # Hashing Utilities
//!
//! SHA-256, and the one hash-to-integer construction the protocol depends on.
//!
//! ## hash_to_integer
//!
//! Fiat-Shamir challenges are only as good as the encoding underneath them.
//! Naive concatenation lets `("12", "3")` and `("1", "23")` collide, so every
//! value is framed:
//!
//! ```text
//! tag (1 byte) || length (u32, big-endian) || payload
//! ```
//!
//! | Tag    | Kind    | Payload                         |
//! |--------|---------|---------------------------------|
//! | `0x01` | integer | minimal big-endian bytes        |
//! | `0x02` | text    | UTF-8 bytes                     |
//! | `0x03` | bytes   | raw bytes                       |
//!
//! The framed stream is hashed with SHA-256 and the digest is read as a
//! big-endian unsigned integer. Prover and verifier must agree on this
//! byte-for-byte; changing it breaks every outstanding non-interactive proof.

use num_bigint::BigUint;
use sha2::{Digest, Sha256};

use super::arith::{bytes_to_int, int_to_bytes};

const TAG_INTEGER: u8 = 0x01;
const TAG_TEXT: u8 = 0x02;
const TAG_BYTES: u8 = 0x03;

/// Compute the SHA-256 hash of the input data.
///
/// ```
/// use scholarship_zkp::crypto::sha256;
///
/// let hash = sha256(b"scholarship");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// One value fed into [`hash_to_integer`].
#[derive(Debug, Clone, Copy)]
pub enum HashInput<'a> {
    Integer(&'a BigUint),
    Text(&'a str),
    Bytes(&'a [u8]),
}

impl HashInput<'_> {
    fn feed(&self, hasher: &mut Sha256) {
        let (tag, payload) = match self {
            HashInput::Integer(v) => (TAG_INTEGER, int_to_bytes(v)),
            HashInput::Text(s) => (TAG_TEXT, s.as_bytes().to_vec()),
            HashInput::Bytes(b) => (TAG_BYTES, b.to_vec()),
        };
        // Payloads are bounded by MAX_DECIMAL_DIGITS or by request size,
        // both far below u32::MAX.
        let len = payload.len() as u32;
        hasher.update([tag]);
        hasher.update(len.to_be_bytes());
        hasher.update(&payload);
    }
}

impl<'a> From<&'a BigUint> for HashInput<'a> {
    fn from(v: &'a BigUint) -> Self {
        HashInput::Integer(v)
    }
}

impl<'a> From<&'a str> for HashInput<'a> {
    fn from(s: &'a str) -> Self {
        HashInput::Text(s)
    }
}

impl<'a> From<&'a [u8]> for HashInput<'a> {
    fn from(b: &'a [u8]) -> Self {
        HashInput::Bytes(b)
    }
}

/// SHA-256 over the canonical framing of `values`, read as a big-endian
/// unsigned integer in `[0, 2^256)`.
pub fn hash_to_integer(values: &[HashInput<'_>]) -> BigUint {
    let mut hasher = Sha256::new();
    for value in values {
        value.feed(&mut hasher);
    }
    bytes_to_int(&hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        let hash = sha256(b"");
        let expected =
            hex::decode("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
                .unwrap();
        assert_eq!(hash.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_hash_to_integer_deterministic() {
        let v = BigUint::from(42u32);
        let a = hash_to_integer(&[HashInput::Integer(&v), HashInput::Text("msg")]);
        let b = hash_to_integer(&[(&v).into(), "msg".into()]);
        assert_eq!(a, b);
        assert!(a.bits() <= 256);
    }

    #[test]
    fn test_hash_to_integer_matches_manual_framing() {
        let v = BigUint::from(0x0102u32);
        let mut framed = vec![TAG_INTEGER, 0, 0, 0, 2, 1, 2];
        framed.extend_from_slice(&[TAG_TEXT, 0, 0, 0, 2]);
        framed.extend_from_slice(b"hi");

        let expected = BigUint::from_bytes_be(&sha256(&framed));
        let got = hash_to_integer(&[HashInput::Integer(&v), HashInput::Text("hi")]);
        assert_eq!(got, expected);
    }

    #[test]
    fn test_framing_prevents_concatenation_collisions() {
        let a = hash_to_integer(&[HashInput::Text("12"), HashInput::Text("3")]);
        let b = hash_to_integer(&[HashInput::Text("1"), HashInput::Text("23")]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_kind_is_part_of_the_hash() {
        let as_text = hash_to_integer(&[HashInput::Text("ab")]);
        let as_bytes = hash_to_integer(&[HashInput::Bytes(b"ab")]);
        assert_ne!(as_text, as_bytes);
    }

    #[test]
    fn test_zero_integer_encodes_one_byte() {
        let zero = BigUint::from(0u32);
        let framed = [TAG_INTEGER, 0, 0, 0, 1, 0];
        assert_eq!(
            hash_to_integer(&[HashInput::Integer(&zero)]),
            BigUint::from_bytes_be(&sha256(&framed))
        );
    }
}
