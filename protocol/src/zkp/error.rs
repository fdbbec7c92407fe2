//! Error taxonomy for the proof engine and challenge sessions.
//!
//! Verification paths collapse all of these into `false` at the boundary;
//! the typed variants exist so internal callers and logs can tell *why*.
//! No variant ever carries a nonce or a private key.

use thiserror::Error;

use super::interactive::RoundState;

/// Errors produced by the Schnorr engine, key manager and session manager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZkpError {
    /// A key, nonce, exponent or group element lies outside its allowed range.
    #[error("value out of range: {0}")]
    InvalidRange(String),

    /// The proof could not be parsed, or one of its fields is missing.
    #[error("malformed proof: {0}")]
    MalformedProof(String),

    /// The Fiat-Shamir challenge inside the proof does not match the one
    /// recomputed from the public inputs.
    #[error("challenge does not match the recomputed value")]
    ChallengeMismatch,

    /// The challenge session outlived its TTL.
    #[error("challenge session expired: {0}")]
    SessionExpired(String),

    /// No challenge session exists with this id.
    #[error("challenge session not found: {0}")]
    SessionNotFound(String),

    /// The challenge session was already consumed.
    #[error("challenge session already used: {0}")]
    SessionAlreadyUsed(String),

    /// The verification equation does not hold.
    #[error("proof verification failed")]
    VerificationFailed,

    /// A proof round operation was called out of order.
    #[error("invalid round state: expected {expected:?}, found {found:?}")]
    InvalidState {
        expected: RoundState,
        found: RoundState,
    },

    /// The session store failed underneath us.
    #[error("session store error: {0}")]
    Storage(String),

    /// A custom group was rejected during construction.
    #[error("invalid domain parameters: {0}")]
    InvalidParameters(String),
}

/// Convenience alias used across the proof engine.
pub type ZkpResult<T> = Result<T, ZkpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_descriptive() {
        let err = ZkpError::SessionNotFound("abc".into());
        assert_eq!(err.to_string(), "challenge session not found: abc");

        let err = ZkpError::InvalidState {
            expected: RoundState::Idle,
            found: RoundState::Verified,
        };
        assert!(err.to_string().contains("Idle"));
        assert!(err.to_string().contains("Verified"));
    }
}
