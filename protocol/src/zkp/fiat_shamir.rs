//! # Fiat-Shamir (non-interactive) Proofs
//!
//! The verifier's random challenge is replaced by a hash of everything the
//! verifier would have seen:
//!
//! ```text
//! c = int(SHA-256(frame(g) || frame(y) || frame(t) || frame(message))) mod q
//! ```
//!
//! with the framing from [`hash_to_integer`]. Binding the message means a
//! proof made for one purpose cannot be replayed for another. Binding `y`
//! means a proof for one student cannot be relabelled as another's.

use num_bigint::BigUint;

use super::interactive::SchnorrEngine;
use super::proof::Proof;
use super::ZkpError;
use crate::crypto::{hash_to_integer, DomainParameters, HashInput};
use crate::identity::{PrivateKey, PublicKey};

/// The Fiat-Shamir challenge for `(y, t, message)` in `params`' group.
///
/// Prover and verifier both call this; it is the whole wire contract.
pub fn challenge_for(
    params: &DomainParameters,
    public_key: &PublicKey,
    commitment: &BigUint,
    message: &str,
) -> BigUint {
    hash_to_integer(&[
        HashInput::Integer(params.g()),
        HashInput::Integer(public_key.value()),
        HashInput::Integer(commitment),
        HashInput::Text(message),
    ]) % params.q()
}

impl SchnorrEngine {
    /// Prove knowledge of `private_key` bound to `message`, no verifier needed.
    pub fn create_non_interactive_proof(
        &self,
        private_key: &PrivateKey,
        public_key: &PublicKey,
        message: &str,
    ) -> Proof {
        let (nonce, commitment) = self.generate_commitment().into_parts();
        let challenge = challenge_for(self.params(), public_key, &commitment, message);
        let response = self.generate_response(nonce, &challenge, private_key);
        Proof {
            commitment,
            response,
            challenge,
        }
    }

    /// Recompute the challenge, compare, then run the interactive check.
    pub fn check_non_interactive_proof(
        &self,
        proof: &Proof,
        public_key: &PublicKey,
        message: &str,
    ) -> Result<(), ZkpError> {
        let expected = challenge_for(self.params(), public_key, &proof.commitment, message);
        if expected != proof.challenge {
            return Err(ZkpError::ChallengeMismatch);
        }
        self.check_proof(&proof.commitment, &proof.response, &expected, public_key)
    }

    /// Boolean form of [`check_non_interactive_proof`](Self::check_non_interactive_proof).
    pub fn verify_non_interactive_proof(
        &self,
        proof: &Proof,
        public_key: &PublicKey,
        message: &str,
    ) -> bool {
        self.check_non_interactive_proof(proof, public_key, message)
            .is_ok()
    }
}
