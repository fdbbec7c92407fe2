//! Proof artefacts: the one-shot nonce, the commitment built from it, and the
//! finished `(t, s, c)` transcript.

use std::fmt;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::crypto::codec::decimal;

/// The commitment secret `r`.
///
/// Not `Clone`, not `Copy`, not `Serialize`. It is moved into
/// [`SchnorrEngine::generate_response`](super::SchnorrEngine::generate_response)
/// and dropped there, so a single nonce can never answer two challenges
/// through the public API. Two answers to one nonce reveal `x`.
pub struct Nonce(BigUint);

impl Nonce {
    pub(crate) fn new(r: BigUint) -> Self {
        Self(r)
    }

    pub(crate) fn expose(&self) -> &BigUint {
        &self.0
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Nonce(<redacted>)")
    }
}

/// First prover message: `t = g^r mod p` and the nonce behind it.
#[derive(Debug)]
pub struct Commitment {
    pub nonce: Nonce,
    pub value: BigUint,
}

impl Commitment {
    /// The public part, `t`.
    pub fn value(&self) -> &BigUint {
        &self.value
    }

    /// Split into the nonce (for the response) and `t` (for the verifier).
    pub fn into_parts(self) -> (Nonce, BigUint) {
        (self.nonce, self.value)
    }
}

/// A complete transcript. All three integers travel as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    #[serde(with = "decimal")]
    pub commitment: BigUint,
    #[serde(with = "decimal")]
    pub response: BigUint,
    #[serde(with = "decimal")]
    pub challenge: BigUint,
}
