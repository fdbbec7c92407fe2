//! Modular arithmetic and integer codecs.
//!
//! Thin wrappers over `num-bigint`. The only opinions expressed here are
//! about ranges: the sampler never returns zero, exponentiation refuses a
//! degenerate modulus, and the decimal parser refuses anything that isn't a
//! plain run of digits.

use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::rngs::OsRng;

use crate::config::MAX_DECIMAL_DIGITS;
use crate::zkp::ZkpError;

/// `base^exponent mod modulus`.
///
/// # Panics
///
/// Panics if `modulus < 2`. A modulus of 0 or 1 is a programming error, not
/// an input error: every modulus in this crate comes from validated
/// [`DomainParameters`](super::DomainParameters).
pub fn mod_exp(base: &BigUint, exponent: &BigUint, modulus: &BigUint) -> BigUint {
    assert!(
        modulus > &BigUint::one(),
        "mod_exp called with modulus < 2"
    );
    base.modpow(exponent, modulus)
}

/// Uniform integer in `[1, bound - 1]` drawn from the operating system CSPRNG.
///
/// # Panics
///
/// Panics if `bound < 2`, since the range would be empty.
pub fn random_in_range(bound: &BigUint) -> BigUint {
    assert!(
        bound > &BigUint::one(),
        "random_in_range called with bound < 2"
    );
    OsRng.gen_biguint_range(&BigUint::one(), bound)
}

/// Uniform integer in `[0, 2^bits)` from the operating system CSPRNG.
pub fn random_bits(bits: u64) -> BigUint {
    OsRng.gen_biguint(bits)
}

/// Minimal big-endian encoding. Zero encodes as a single `0x00` byte.
pub fn int_to_bytes(value: &BigUint) -> Vec<u8> {
    value.to_bytes_be()
}

/// Fixed-width big-endian encoding, left-padded with zeros.
///
/// Fails with [`ZkpError::InvalidRange`] if `value` needs more than `width`
/// bytes.
pub fn int_to_bytes_padded(value: &BigUint, width: usize) -> Result<Vec<u8>, ZkpError> {
    if value.is_zero() {
        return Ok(vec![0u8; width]);
    }
    let raw = value.to_bytes_be();
    if raw.len() > width {
        return Err(ZkpError::InvalidRange(format!(
            "value needs {} bytes, width is {}",
            raw.len(),
            width
        )));
    }
    let mut out = vec![0u8; width - raw.len()];
    out.extend_from_slice(&raw);
    Ok(out)
}

/// Big-endian decode. The empty slice decodes to zero.
pub fn bytes_to_int(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

/// Parse an unsigned decimal string.
///
/// Only ASCII digits are accepted: no sign, no whitespace, no `0x`. Strings
/// longer than [`MAX_DECIMAL_DIGITS`] are rejected before parsing.
pub fn parse_decimal(s: &str) -> Result<BigUint, ZkpError> {
    if s.is_empty() {
        return Err(ZkpError::MalformedProof("empty integer".into()));
    }
    if s.len() > MAX_DECIMAL_DIGITS {
        return Err(ZkpError::MalformedProof("integer too long".into()));
    }
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ZkpError::MalformedProof("integer is not decimal".into()));
    }
    BigUint::parse_bytes(s.as_bytes(), 10)
        .ok_or_else(|| ZkpError::MalformedProof("integer is not decimal".into()))
}
