//! # Interactive Schnorr Engine
//!
//! The classic three-move protocol:
//!
//! ```text
//! Prover                              Verifier
//!   r <- [1, q-1], t = g^r mod p
//!                 ---- t ---->
//!                                       c <- 256 random bits
//!                 <--- c -----
//!   s = (r + c*x) mod q
//!                 ---- s ---->
//!                                       g^s == t * y^c (mod p) ?
//! ```
//!
//! Completeness: `g^s = g^(r + c*x) = t * y^c` because `g` has order `q`.
//! Soundness: two accepting answers to one `t` under different challenges
//! give `x = (s1 - s2) / (c1 - c2) mod q`. That same algebra is why a nonce
//! must never be reused, and why [`Nonce`] is move-only.

use std::sync::Arc;

use num_bigint::BigUint;
use tracing::debug;

use super::proof::{Commitment, Nonce, Proof};
use super::ZkpError;
use crate::config::CHALLENGE_BITS;
use crate::crypto::{mod_exp, random_bits, random_in_range, DomainParameters};
use crate::identity::{PrivateKey, PublicKey};

// ---------------------------------------------------------------------------
// SchnorrEngine
// ---------------------------------------------------------------------------

/// Prover and verifier operations for one group. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SchnorrEngine {
    params: Arc<DomainParameters>,
}

impl SchnorrEngine {
    pub fn new(params: Arc<DomainParameters>) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &Arc<DomainParameters> {
        &self.params
    }

    /// Draw a fresh nonce `r` in `[1, q-1]` and commit to it.
    pub fn generate_commitment(&self) -> Commitment {
        let r = random_in_range(self.params.q());
        let value = mod_exp(self.params.g(), &r, self.params.p());
        Commitment {
            nonce: Nonce::new(r),
            value,
        }
    }

    /// A uniform 256-bit challenge.
    ///
    /// For the standard group `2^256 < q`, so the value is used as-is.
    pub fn generate_challenge(&self) -> BigUint {
        random_bits(CHALLENGE_BITS)
    }

    /// `s = (r + c*x) mod q`. Consumes the nonce.
    pub fn generate_response(
        &self,
        nonce: Nonce,
        challenge: &BigUint,
        private_key: &PrivateKey,
    ) -> BigUint {
        self.compute_response(nonce.expose(), challenge, private_key.expose())
    }

    pub(crate) fn compute_response(&self, r: &BigUint, c: &BigUint, x: &BigUint) -> BigUint {
        let q = self.params.q();
        ((r % q) + (c % q) * (x % q)) % q
    }

    /// Check a transcript and say why it fails.
    ///
    /// Accepts iff `t` and `y` lie in `[1, p-1]`, `s` lies in `[0, q-1]` and
    /// `g^s mod p == t * y^c mod p`.
    pub fn check_proof(
        &self,
        commitment: &BigUint,
        response: &BigUint,
        challenge: &BigUint,
        public_key: &PublicKey,
    ) -> Result<(), ZkpError> {
        let p = self.params.p();

        if !self.params.is_group_element(commitment) {
            return Err(ZkpError::InvalidRange("commitment outside [1, p-1]".into()));
        }
        if !self.params.is_group_element(public_key.value()) {
            return Err(ZkpError::InvalidRange("public key outside [1, p-1]".into()));
        }
        if !self.params.is_exponent(response) {
            return Err(ZkpError::InvalidRange("response outside [0, q-1]".into()));
        }

        let lhs = mod_exp(self.params.g(), response, p);
        let rhs = (commitment * mod_exp(public_key.value(), challenge, p)) % p;

        if lhs == rhs {
            Ok(())
        } else {
            Err(ZkpError::VerificationFailed)
        }
    }

    /// Boolean form of [`check_proof`](Self::check_proof).
    pub fn verify_proof(
        &self,
        commitment: &BigUint,
        response: &BigUint,
        challenge: &BigUint,
        public_key: &PublicKey,
    ) -> bool {
        match self.check_proof(commitment, response, challenge, public_key) {
            Ok(()) => true,
            Err(err) => {
                debug!(reason = %err, "proof rejected");
                false
            }
        }
    }

    /// Commit and respond in one go against a challenge obtained elsewhere,
    /// typically from a verifier's challenge session.
    pub fn create_proof(&self, private_key: &PrivateKey, external_challenge: &BigUint) -> Proof {
        let (nonce, commitment) = self.generate_commitment().into_parts();
        let response = self.generate_response(nonce, external_challenge, private_key);
        Proof {
            commitment,
            response,
            challenge: external_challenge.clone(),
        }
    }

    /// Verify `proof` against the challenge the verifier issued.
    ///
    /// `proof.challenge` is ignored: a prover does not get to pick `c`.
    pub fn verify_complete_proof(
        &self,
        proof: &Proof,
        challenge: &BigUint,
        public_key: &PublicKey,
    ) -> bool {
        self.verify_proof(&proof.commitment, &proof.response, challenge, public_key)
    }
}

// ---------------------------------------------------------------------------
// ProofRound
// ---------------------------------------------------------------------------

/// Where a [`ProofRound`] is in the three-move exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    Idle,
    CommitmentIssued,
    ChallengeIssued,
    ResponseIssued,
    Verified,
    Rejected,
}

/// Verifier-side transcript of one interactive round.
///
/// Each move is accepted only in order; anything else fails with
/// [`ZkpError::InvalidState`] and leaves the round untouched. `Verified` and
/// `Rejected` are terminal.
#[derive(Debug)]
pub struct ProofRound {
    engine: SchnorrEngine,
    public_key: PublicKey,
    state: RoundState,
    commitment: Option<BigUint>,
    challenge: Option<BigUint>,
    response: Option<BigUint>,
}

impl ProofRound {
    pub fn new(engine: SchnorrEngine, public_key: PublicKey) -> Self {
        Self {
            engine,
            public_key,
            state: RoundState::Idle,
            commitment: None,
            challenge: None,
            response: None,
        }
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    fn require_state(&self, expected: RoundState) -> Result<(), ZkpError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ZkpError::InvalidState {
                expected,
                found: self.state,
            })
        }
    }

    /// Move 1: the prover's `t`.
    pub fn receive_commitment(&mut self, commitment: BigUint) -> Result<(), ZkpError> {
        self.require_state(RoundState::Idle)?;
        self.commitment = Some(commitment);
        self.state = RoundState::CommitmentIssued;
        Ok(())
    }

    /// Move 2: draw and record `c`.
    pub fn issue_challenge(&mut self) -> Result<BigUint, ZkpError> {
        self.require_state(RoundState::CommitmentIssued)?;
        let c = self.engine.generate_challenge();
        self.challenge = Some(c.clone());
        self.state = RoundState::ChallengeIssued;
        Ok(c)
    }

    /// Move 3: the prover's `s`.
    pub fn receive_response(&mut self, response: BigUint) -> Result<(), ZkpError> {
        self.require_state(RoundState::ChallengeIssued)?;
        self.response = Some(response);
        self.state = RoundState::ResponseIssued;
        Ok(())
    }

    /// Decide the round. Returns the verdict and moves to a terminal state.
    pub fn verify(&mut self) -> Result<bool, ZkpError> {
        self.require_state(RoundState::ResponseIssued)?;
        let accepted = match (&self.commitment, &self.response, &self.challenge) {
            (Some(t), Some(s), Some(c)) => self.engine.verify_proof(t, s, c, &self.public_key),
            _ => false,
        };
        self.state = if accepted {
            RoundState::Verified
        } else {
            RoundState::Rejected
        };
        Ok(accepted)
    }

    /// The full transcript, once all three moves have happened.
    pub fn transcript(&self) -> Option<Proof> {
        match (&self.commitment, &self.response, &self.challenge) {
            (Some(t), Some(s), Some(c)) => Some(Proof {
                commitment: t.clone(),
                response: s.clone(),
                challenge: c.clone(),
            }),
            _ => None,
        }
    }
}
