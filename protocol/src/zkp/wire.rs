//! Transport shape of a proof, and the verifier that works on it.
//!
//! Clients send either `{"commitment", "response"}` or the short form
//! `{"t", "s"}`; non-interactive proofs add `"challenge"` (or `"c"`). Values
//! are decimal strings or, for small values, JSON numbers. Supplying both
//! the long and the short name for one field is a duplicate and fails to
//! parse.
//!
//! Everything in this module answers `false` rather than erroring once it
//! gets past parsing: a malformed proof is simply not a valid proof.

use num_bigint::BigUint;
use serde::Deserialize;
use tracing::debug;

use super::interactive::SchnorrEngine;
use super::proof::Proof;
use super::ZkpError;
use crate::crypto::codec::DecimalOrNumber;
use crate::crypto::parse_decimal;
use crate::identity::PublicKey;

/// A proof as received from the network, before normalization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProofEnvelope {
    #[serde(alias = "t", default)]
    pub commitment: Option<DecimalOrNumber>,
    #[serde(alias = "s", default)]
    pub response: Option<DecimalOrNumber>,
    #[serde(alias = "c", default)]
    pub challenge: Option<DecimalOrNumber>,
}

fn required(field: &Option<DecimalOrNumber>, name: &str) -> Result<BigUint, ZkpError> {
    field
        .as_ref()
        .ok_or_else(|| ZkpError::MalformedProof(format!("missing {name}")))?
        .to_biguint()
}

impl ProofEnvelope {
    /// Normalize an interactive proof. The challenge comes from the
    /// verifier's session; any challenge in the envelope is ignored.
    pub fn normalize(&self, session_challenge: &BigUint) -> Result<Proof, ZkpError> {
        Ok(Proof {
            commitment: required(&self.commitment, "commitment")?,
            response: required(&self.response, "response")?,
            challenge: session_challenge.clone(),
        })
    }

    /// Normalize a non-interactive proof; the challenge is mandatory.
    pub fn normalize_non_interactive(&self) -> Result<Proof, ZkpError> {
        Ok(Proof {
            commitment: required(&self.commitment, "commitment")?,
            response: required(&self.response, "response")?,
            challenge: required(&self.challenge, "challenge")?,
        })
    }

    /// Parse a JSON body. Duplicate aliases, wrong types and unknown shapes
    /// all surface as `MalformedProof`.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, ZkpError> {
        Self::deserialize(json).map_err(|e| ZkpError::MalformedProof(e.to_string()))
    }
}

impl From<&Proof> for ProofEnvelope {
    fn from(proof: &Proof) -> Self {
        Self {
            commitment: Some(DecimalOrNumber::Text(proof.commitment.to_str_radix(10))),
            response: Some(DecimalOrNumber::Text(proof.response.to_str_radix(10))),
            challenge: Some(DecimalOrNumber::Text(proof.challenge.to_str_radix(10))),
        }
    }
}

/// String-level verifier for request handlers.
#[derive(Debug, Clone)]
pub struct ProofVerifier {
    engine: SchnorrEngine,
}

impl ProofVerifier {
    pub fn new(engine: SchnorrEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &SchnorrEngine {
        &self.engine
    }

    /// Verify decimal `t`, `s`, `c` and `y`. Unparseable input is `false`.
    pub fn verify_strings(
        &self,
        commitment: &str,
        response: &str,
        challenge: &str,
        public_key: &str,
    ) -> bool {
        let parsed = (|| -> Result<_, ZkpError> {
            Ok((
                parse_decimal(commitment)?,
                parse_decimal(response)?,
                parse_decimal(challenge)?,
                PublicKey::from_decimal(public_key)?,
            ))
        })();
        match parsed {
            Ok((t, s, c, y)) => self.engine.verify_proof(&t, &s, &c, &y),
            Err(err) => {
                debug!(reason = %err, "unparseable proof");
                false
            }
        }
    }

    /// Verify an interactive envelope against the session's challenge.
    pub fn verify_envelope(
        &self,
        envelope: &ProofEnvelope,
        session_challenge: &BigUint,
        public_key: &PublicKey,
    ) -> bool {
        match envelope.normalize(session_challenge) {
            Ok(proof) => self
                .engine
                .verify_complete_proof(&proof, session_challenge, public_key),
            Err(err) => {
                debug!(reason = %err, "malformed interactive proof");
                false
            }
        }
    }

    /// Verify a non-interactive envelope bound to `message`.
    pub fn verify_non_interactive_envelope(
        &self,
        envelope: &ProofEnvelope,
        public_key: &PublicKey,
        message: &str,
    ) -> bool {
        match envelope.normalize_non_interactive() {
            Ok(proof) => self
                .engine
                .verify_non_interactive_proof(&proof, public_key, message),
            Err(err) => {
                debug!(reason = %err, "malformed non-interactive proof");
                false
            }
        }
    }
}
