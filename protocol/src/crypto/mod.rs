//! # Cryptographic Primitives
//!
//! Everything the Schnorr engine needs and nothing it doesn't:
//!
//! - **params** - The `(p, g, q)` group description and its validation.
//! - **arith** - Modular exponentiation, CSPRNG sampling, integer/byte codecs.
//! - **hash** - SHA-256 and the canonical hash-to-integer encoding.
//! - **codec** - Serde helpers for decimal big integers and base64.
//!
//! ## A note on "rolling your own crypto"
//!
//! We don't. Big-integer arithmetic comes from `num-bigint`, randomness from
//! the OS, hashing from `sha2`. The code here only wires them together in
//! the order the protocol demands.

pub mod arith;
pub mod codec;
pub mod hash;
pub mod params;

pub use arith::{
    bytes_to_int, int_to_bytes, int_to_bytes_padded, mod_exp, parse_decimal, random_bits,
    random_in_range,
};
pub use hash::{hash_to_integer, sha256, HashInput};
pub use params::DomainParameters;
