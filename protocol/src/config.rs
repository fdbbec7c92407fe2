//! # Protocol Configuration & Constants
//!
//! Every magic number in the scholarship verifier lives here. If you're
//! hardcoding a TTL or a bit length somewhere else, move it here.
//!
//! The group constants define which keys and proofs are mutually valid.
//! Changing them after students have registered keys invalidates every key
//! and every proof issued so far, so treat them as frozen.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Human-readable protocol version, reported by `/health` and `version`.
pub const PROTOCOL_VERSION: &str = "0.1.0";

/// Issuer name embedded in every credential.
pub const CREDENTIAL_ISSUER: &str = "College Verification System";

/// Credential schema version.
pub const CREDENTIAL_VERSION: &str = "1.0";

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// 2048-bit MODP safe prime from RFC 3526 (group 14), hex-encoded.
///
/// `p = 2q + 1` with `q` prime. Generator 2 is a quadratic residue mod this
/// prime and therefore generates the order-`q` subgroup.
pub const MODP_2048_PRIME_HEX: &str = concat!(
    "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD1",
    "29024E088A67CC74020BBEA63B139B22514A08798E3404DD",
    "EF9519B3CD3A431B302B0A6DF25F14374FE1356D6D51C245",
    "E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED",
    "EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3D",
    "C2007CB8A163BF0598DA48361C55D39A69163FA8FD24CF5F",
    "83655D23DCA3AD961C62F356208552BB9ED529077096966D",
    "670C354E4ABC9804F1746C08CA18217C32905E462E36CE3B",
    "E39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9",
    "DE2BCBF6955817183995497CEA956AE515D2261898FA0510",
    "15728E5A8AACAA68FFFFFFFFFFFFFFFF",
);

/// Generator for the embedded group.
pub const MODP_2048_GENERATOR: u32 = 2;

/// Bit length of interactive challenges. 256 bits makes guessing the
/// verifier's challenge in advance infeasible.
pub const CHALLENGE_BITS: u64 = 256;

/// Hash function used for Fiat-Shamir challenges and `hash_to_integer`.
pub const HASH_FUNCTION: &str = "SHA-256";

/// Digest length of [`HASH_FUNCTION`] in bytes.
pub const HASH_OUTPUT_LENGTH: usize = 32;

/// Maximum accepted length of a decimal-encoded integer on the wire.
/// A 2048-bit value has 617 decimal digits; anything much longer is garbage
/// and is refused before it reaches the big-integer parser.
pub const MAX_DECIMAL_DIGITS: usize = 1024;

// ---------------------------------------------------------------------------
// Session & Credential Lifetimes
// ---------------------------------------------------------------------------

/// Default lifetime of a challenge session.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(300);

/// Credentials are valid for one year from issuance.
pub const CREDENTIAL_VALIDITY: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Admission years older than this (relative to the current year) are not
/// eligible for a scholarship.
pub const MAX_ADMISSION_AGE_YEARS: i32 = 5;

// ---------------------------------------------------------------------------
// Network Parameters
// ---------------------------------------------------------------------------

/// Default HTTP API port.
pub const DEFAULT_RPC_PORT: u16 = 5002;

/// Default Prometheus metrics port.
pub const DEFAULT_METRICS_PORT: u16 = 9742;

// ---------------------------------------------------------------------------
// Session Configuration
// ---------------------------------------------------------------------------

/// When a challenge session is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsumePolicy {
    /// Consume only on a successful verification. Failed attempts may retry
    /// against the same challenge until it expires.
    #[default]
    OnSuccess,
    /// Consume on the first attempt, whatever its outcome.
    Always,
}

/// Tunables for [`crate::session::ChallengeSessionManager`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long an issued challenge stays usable.
    pub ttl: Duration,
    /// Whether failed attempts burn the session.
    pub consume_policy: ConsumePolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_SESSION_TTL,
            consume_policy: ConsumePolicy::OnSuccess,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prime_hex_is_2048_bits() {
        // 2048 bits = 512 hex digits.
        assert_eq!(MODP_2048_PRIME_HEX.len(), 512);
        assert!(MODP_2048_PRIME_HEX.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_challenge_bits_match_hash_width() {
        assert_eq!(CHALLENGE_BITS as usize, HASH_OUTPUT_LENGTH * 8);
    }

    #[test]
    fn test_default_session_config() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.ttl, Duration::from_secs(300));
        assert_eq!(cfg.consume_policy, ConsumePolicy::OnSuccess);
    }

    #[test]
    fn test_lifetimes_sanity() {
        assert!(DEFAULT_SESSION_TTL < CREDENTIAL_VALIDITY);
        assert!(MAX_ADMISSION_AGE_YEARS > 0);
    }
}
