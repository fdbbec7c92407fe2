//! # Student Credentials
//!
//! The college vouches for a student by signing a credential that binds the
//! student's id and attributes to their public key. Verifiers check the
//! signature and expiry, then only ever use the `public_key` field.
//!
//! Signatures are HMAC-SHA256 over the credential's canonical JSON (object
//! keys sorted, no whitespace), hex-encoded. HMAC means issuer and verifier
//! share the secret; this is a single-institution deployment, not a PKI.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::config::{CREDENTIAL_ISSUER, CREDENTIAL_VALIDITY, CREDENTIAL_VERSION};
use crate::identity::PublicKey;

type HmacSha256 = Hmac<Sha256>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("credential signature is invalid")]
    BadSignature,

    #[error("credential expired at {0}")]
    Expired(DateTime<Utc>),

    #[error("credential public key is malformed")]
    MalformedPublicKey,

    #[error("issuer key rejected: {0}")]
    InvalidKey(String),

    #[error("credential serialization error: {0}")]
    Serialization(String),
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// What the college knows about a student before any key is involved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub student_id: String,
    pub name: String,
    pub email: String,
    pub department: String,
    pub admission_year: i32,
    /// Decimal public key once the student has bound one.
    #[serde(default)]
    pub public_key: Option<String>,
}

impl StudentRecord {
    /// Identity check before a key is bound: the claimed name must match
    /// the enrolled one, ignoring case and surrounding whitespace.
    pub fn matches_identity(&self, name: &str) -> bool {
        let claimed = name.trim();
        !claimed.is_empty() && self.name.trim().to_lowercase() == claimed.to_lowercase()
    }
}

/// The signed payload. Field names are part of the signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub student_id: String,
    /// Decimal string, exactly as bound by the issuer.
    pub public_key: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    pub admission_year: Option<i32>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub issuer: String,
    pub version: String,
}

impl Credential {
    /// Canonical byte form that the signature covers.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, CredentialError> {
        // serde_json::Value keeps object keys in a BTreeMap, so this sorts them.
        let value =
            serde_json::to_value(self).map_err(|e| CredentialError::Serialization(e.to_string()))?;
        serde_json::to_vec(&value).map_err(|e| CredentialError::Serialization(e.to_string()))
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// A credential and its hex HMAC tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedCredential {
    pub credential: Credential,
    pub signature: String,
}

impl SignedCredential {
    /// The bound public key, parsed.
    pub fn public_key(&self) -> Result<PublicKey, CredentialError> {
        PublicKey::from_decimal(&self.credential.public_key)
            .map_err(|_| CredentialError::MalformedPublicKey)
    }
}

// ---------------------------------------------------------------------------
// CredentialIssuer
// ---------------------------------------------------------------------------

/// Signs and validates credentials with a shared HMAC secret.
#[derive(Clone)]
pub struct CredentialIssuer {
    secret: Vec<u8>,
}

impl fmt::Debug for CredentialIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialIssuer")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl CredentialIssuer {
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, CredentialError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(CredentialError::InvalidKey("secret must not be empty".into()));
        }
        Ok(Self { secret })
    }

    fn mac(&self) -> Result<HmacSha256, CredentialError> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| CredentialError::InvalidKey(e.to_string()))
    }

    /// Unsigned credential for `student`, valid for one year from `now`.
    pub fn create_credential(
        &self,
        student: &StudentRecord,
        public_key: &str,
        now: DateTime<Utc>,
    ) -> Credential {
        // CREDENTIAL_VALIDITY is a small constant, well inside chrono's range.
        let validity =
            Duration::from_std(CREDENTIAL_VALIDITY).unwrap_or_else(|_| Duration::days(365));
        Credential {
            student_id: student.student_id.clone(),
            public_key: public_key.to_string(),
            name: Some(student.name.clone()),
            email: Some(student.email.clone()),
            department: Some(student.department.clone()),
            admission_year: Some(student.admission_year),
            issued_at: now,
            expires_at: now + validity,
            issuer: CREDENTIAL_ISSUER.to_string(),
            version: CREDENTIAL_VERSION.to_string(),
        }
    }

    /// Hex HMAC-SHA256 over the canonical JSON.
    pub fn sign(&self, credential: &Credential) -> Result<String, CredentialError> {
        let mut mac = self.mac()?;
        mac.update(&credential.canonical_bytes()?);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Constant-time tag comparison. Anything unparseable is `false`.
    pub fn verify_signature(&self, credential: &Credential, signature: &str) -> bool {
        let Ok(tag) = hex::decode(signature) else {
            return false;
        };
        let (Ok(mut mac), Ok(bytes)) = (self.mac(), credential.canonical_bytes()) else {
            return false;
        };
        mac.update(&bytes);
        mac.verify_slice(&tag).is_ok()
    }

    /// Create and sign in one step.
    pub fn issue(
        &self,
        student: &StudentRecord,
        public_key: &str,
        now: DateTime<Utc>,
    ) -> Result<SignedCredential, CredentialError> {
        let credential = self.create_credential(student, public_key, now);
        let signature = self.sign(&credential)?;
        Ok(SignedCredential {
            credential,
            signature,
        })
    }

    /// Signature first, then expiry.
    pub fn validate(
        &self,
        signed: &SignedCredential,
        now: DateTime<Utc>,
    ) -> Result<(), CredentialError> {
        if !self.verify_signature(&signed.credential, &signed.signature) {
            return Err(CredentialError::BadSignature);
        }
        if signed.credential.is_expired_at(now) {
            return Err(CredentialError::Expired(signed.credential.expires_at));
        }
        Ok(())
    }
}
