//! # Identity Module
//!
//! A student's identity is a Schnorr key pair in the domain group. The
//! public half is what the college binds to a credential; the private half
//! never leaves the student's machine.

pub mod keys;

pub use keys::{ExportedPublicKey, KeyFile, KeyManager, KeyPair, PrivateKey, PublicKey};
