// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Scholarship ZKP - Core Library
//!
//! Students prove they hold the secret behind a registered public key
//! without ever handing that secret to anyone. The verifier learns exactly
//! one bit: "yes, this is the student the college certified".
//!
//! The proof system is plain Schnorr over the RFC 3526 2048-bit MODP group.
//! No pairings, no trusted setup, no circuits. It is old, it is boring, and
//! that is the point.
//!
//! ## Architecture
//!
//! - **config** - Protocol constants and session tunables.
//! - **crypto** - Group parameters, modular arithmetic, hashing, codecs.
//! - **identity** - Key generation, derivation, validation, import/export.
//! - **zkp** - Interactive Schnorr rounds and the Fiat-Shamir variant.
//! - **session** - Single-use, time-bounded challenge sessions.
//! - **storage** - sled persistence for sessions, the registry and students.
//! - **credential** - HMAC-signed student credentials.
//! - **eligibility** - Scholarship rules and the decision log.
//!
//! ## Design Philosophy
//!
//! 1. Verification answers `true` or `false`. Malformed input is `false`,
//!    never a panic.
//! 2. Secrets never reach a log line, an error message or a `Debug` impl.
//! 3. A challenge is answered at most once. Replays lose.

pub mod config;
pub mod credential;
pub mod crypto;
pub mod eligibility;
pub mod identity;
pub mod session;
pub mod storage;
pub mod zkp;

pub use crypto::DomainParameters;
pub use identity::{KeyManager, KeyPair, PrivateKey, PublicKey};
pub use session::ChallengeSessionManager;
pub use zkp::{Proof, SchnorrEngine, ZkpError};
