//! # Zero-Knowledge Proof Module
//!
//! Schnorr proofs of knowledge of a discrete logarithm: the student shows
//! they know `x` with `y = g^x mod p` and the verifier learns nothing else.
//!
//! ## Architecture
//!
//! ```text
//! proof.rs        - Nonce, Commitment, Proof
//! interactive.rs  - SchnorrEngine (commit / challenge / respond / verify), ProofRound
//! fiat_shamir.rs  - non-interactive proofs bound to a message
//! wire.rs         - ProofEnvelope (t/s/c aliases) and ProofVerifier
//! error.rs        - ZkpError
//! ```
//!
//! ## Security Model
//!
//! - **Completeness**: an honest prover always convinces an honest verifier.
//! - **Special soundness**: two accepting transcripts sharing `t` yield `x`.
//! - **Honest-verifier zero knowledge**: transcripts can be simulated
//!   without `x`. In the Fiat-Shamir mode this holds in the random oracle
//!   model with SHA-256 as the oracle.

pub mod error;
pub mod fiat_shamir;
pub mod interactive;
pub mod proof;
pub mod wire;

pub use error::{ZkpError, ZkpResult};
pub use fiat_shamir::challenge_for;
pub use interactive::{ProofRound, RoundState, SchnorrEngine};
pub use proof::{Commitment, Nonce, Proof};
pub use wire::{ProofEnvelope, ProofVerifier};
