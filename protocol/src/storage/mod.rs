//! # Storage Module
//!
//! Persistence for everything that must outlive a process: challenge
//! sessions, the registry of bound public keys, and the issuer's student
//! roster.
//!
//! ## Architecture
//!
//! ```text
//! db.rs  - ScholarDB: sled trees for sessions, registry, students and
//!          issued credentials
//! ```
//!
//! ## Data Flow
//!
//! ```text
//! /issuer/credentials → SignedCredential → /register-credential → RegistryEntry
//!                                                                     ↓
//! /request-challenge → ChallengeSession ──→ /verify-proof ──→ KeyDirectory
//!         ↓                                      ↓
//!     ScholarDB                              ScholarDB
//!     (sessions)                             (sessions, registry)
//! ```
//!
//! Values are bincode on disk. JSON is for the API; bincode is for storage.

pub mod db;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::credential::SignedCredential;
use crate::identity::PublicKey;
use crate::zkp::ZkpError;

pub use db::{DbError, DbResult, ScholarDB};

/// A student's registered credential and the key it binds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub student_id: String,
    /// Decimal public key, copied from the credential.
    pub public_key: String,
    pub credential: SignedCredential,
    pub registered_at: DateTime<Utc>,
}

impl RegistryEntry {
    pub fn new(credential: SignedCredential, registered_at: DateTime<Utc>) -> Self {
        Self {
            student_id: credential.credential.student_id.clone(),
            public_key: credential.credential.public_key.clone(),
            credential,
            registered_at,
        }
    }
}

/// Looks up the public key a subject has bound through a credential.
///
/// Verifiers use this instead of trusting a key supplied in the request.
pub trait KeyDirectory: Send + Sync {
    fn bound_public_key(&self, subject: &str) -> Result<Option<PublicKey>, ZkpError>;
}
