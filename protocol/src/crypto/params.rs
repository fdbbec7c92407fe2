//! # Domain Parameters
//!
//! The group every key and proof lives in: a safe prime `p = 2q + 1` and a
//! generator `g` of the order-`q` subgroup.
//!
//! The process default is RFC 3526 group 14 with `g = 2`, parsed exactly once
//! and shared as an `Arc`. Tests build tiny groups through
//! [`DomainParameters::new`] so they can run exhaustively.

use std::sync::{Arc, OnceLock};

use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::Serialize;

use crate::config::{MODP_2048_GENERATOR, MODP_2048_PRIME_HEX};
use crate::zkp::ZkpError;

/// Immutable `(p, g, q)` triple.
///
/// Serialized for `/health` and key exports; never deserialized, since
/// every construction must pass through [`DomainParameters::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainParameters {
    #[serde(with = "crate::crypto::codec::decimal")]
    p: BigUint,
    #[serde(with = "crate::crypto::codec::decimal")]
    g: BigUint,
    #[serde(with = "crate::crypto::codec::decimal")]
    q: BigUint,
}

static STANDARD: OnceLock<Arc<DomainParameters>> = OnceLock::new();

impl DomainParameters {
    /// Build and validate a custom group.
    ///
    /// Checks that `p` is odd and at least 5, that `2 <= g <= p - 2`, and that
    /// `g^q mod p == 1` with `q = (p - 1) / 2`. Primality of `p` and `q` is the
    /// caller's responsibility.
    pub fn new(p: BigUint, g: BigUint) -> Result<Self, ZkpError> {
        let two = BigUint::from(2u32);

        if p < BigUint::from(5u32) || (&p % &two).is_zero() {
            return Err(ZkpError::InvalidParameters(
                "modulus must be an odd prime >= 5".into(),
            ));
        }
        if g < two || g > &p - &two {
            return Err(ZkpError::InvalidParameters(
                "generator must lie in [2, p-2]".into(),
            ));
        }

        let q = (&p - BigUint::one()) / &two;
        if !g.modpow(&q, &p).is_one() {
            return Err(ZkpError::InvalidParameters(
                "generator does not lie in the order-q subgroup".into(),
            ));
        }

        Ok(Self { p, g, q })
    }

    /// The embedded 2048-bit MODP group, parsed once per process.
    pub fn standard() -> Arc<Self> {
        STANDARD
            .get_or_init(|| {
                // Both constants are compile-time literals covered by tests.
                let p = BigUint::parse_bytes(MODP_2048_PRIME_HEX.as_bytes(), 16)
                    .unwrap_or_default();
                let g = BigUint::from(MODP_2048_GENERATOR);
                let q = (&p - BigUint::one()) >> 1;
                Arc::new(Self { p, g, q })
            })
            .clone()
    }

    /// The safe prime modulus.
    pub fn p(&self) -> &BigUint {
        &self.p
    }

    /// The subgroup generator.
    pub fn g(&self) -> &BigUint {
        &self.g
    }

    /// The subgroup order, `(p - 1) / 2`.
    pub fn q(&self) -> &BigUint {
        &self.q
    }

    /// Width in bytes of a fixed-width encoding of a group element.
    pub fn byte_len(&self) -> usize {
        ((self.p.bits() + 7) / 8) as usize
    }

    /// `true` when `1 <= v <= p - 1`.
    pub fn is_group_element(&self, v: &BigUint) -> bool {
        !v.is_zero() && v < &self.p
    }

    /// `true` when `v` is a reduced exponent, `0 <= v <= q - 1`.
    pub fn is_exponent(&self, v: &BigUint) -> bool {
        v < &self.q
    }

    /// `true` when `1 <= v <= q - 1`, the range for private keys and nonces.
    pub fn is_secret_scalar(&self, v: &BigUint) -> bool {
        !v.is_zero() && v < &self.q
    }
}

#[cfg(test)]
pub(crate) fn toy_group() -> Arc<DomainParameters> {
    // p = 23, q = 11, g = 4 generates the order-11 subgroup.
    Arc::new(
        DomainParameters::new(BigUint::from(23u32), BigUint::from(4u32))
            .expect("toy group is valid"),
    )
}
