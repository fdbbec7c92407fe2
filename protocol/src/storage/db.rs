//! # ScholarDB - Persistent Storage Engine
//!
//! Everything the verifier and issuer need to survive a restart, on sled.
//!
//! ## Tree Layout
//!
//! | Tree          | Key                | Value                       |
//! |---------------|--------------------|-----------------------------|
//! | `sessions`    | session id (UTF-8) | `bincode(ChallengeSession)` |
//! | `registry`    | student id (UTF-8) | `bincode(RegistryEntry)`    |
//! | `students`    | student id (UTF-8) | `bincode(StudentRecord)`    |
//! | `credentials` | student id (UTF-8) | `bincode(SignedCredential)` |
//!
//! ## Atomicity
//!
//! Consuming a session is a sled `compare_and_swap` on the exact bytes we
//! read. If another writer got there first the swap fails, we re-read, and
//! the second look sees `used = true`.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::{Db, Tree};
use tracing::warn;

use super::{KeyDirectory, RegistryEntry};
use crate::credential::{SignedCredential, StudentRecord};
use crate::identity::PublicKey;
use crate::session::{ChallengeSession, SessionStore};
use crate::zkp::ZkpError;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),
}

pub type DbResult<T> = Result<T, DbError>;

impl From<DbError> for ZkpError {
    fn from(err: DbError) -> Self {
        ZkpError::Storage(err.to_string())
    }
}

fn encode<T: Serialize>(value: &T) -> DbResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| DbError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> DbResult<T> {
    bincode::deserialize(bytes).map_err(|e| DbError::Serialization(e.to_string()))
}

// ---------------------------------------------------------------------------
// ScholarDB
// ---------------------------------------------------------------------------

/// sled-backed storage for sessions, the key registry and student records.
///
/// Cloning is cheap: every handle shares the same underlying database.
#[derive(Debug, Clone)]
pub struct ScholarDB {
    db: Db,
    sessions: Tree,
    registry: Tree,
    students: Tree,
    credentials: Tree,
}

impl ScholarDB {
    /// Open or create a database at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// In-memory database, removed on drop. For tests.
    pub fn open_temporary() -> DbResult<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> DbResult<Self> {
        let sessions = db.open_tree("sessions")?;
        let registry = db.open_tree("registry")?;
        let students = db.open_tree("students")?;
        let credentials = db.open_tree("credentials")?;
        Ok(Self {
            db,
            sessions,
            registry,
            students,
            credentials,
        })
    }

    /// Flush all dirty buffers to disk.
    pub fn flush(&self) -> DbResult<()> {
        self.db.flush()?;
        Ok(())
    }

    // -- Sessions -----------------------------------------------------------

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn read_session(&self, session_id: &str) -> DbResult<Option<(sled::IVec, ChallengeSession)>> {
        match self.sessions.get(session_id.as_bytes())? {
            Some(raw) => {
                let session = decode(&raw)?;
                Ok(Some((raw, session)))
            }
            None => Ok(None),
        }
    }

    // -- Registry -----------------------------------------------------------

    /// Insert or replace the registry entry for `entry.student_id`.
    pub fn upsert_registry_entry(&self, entry: &RegistryEntry) -> DbResult<()> {
        self.registry
            .insert(entry.student_id.as_bytes(), encode(entry)?)?;
        self.registry.flush()?;
        Ok(())
    }

    pub fn get_registry_entry(&self, student_id: &str) -> DbResult<Option<RegistryEntry>> {
        self.registry
            .get(student_id.as_bytes())?
            .map(|raw| decode(&raw))
            .transpose()
    }

    pub fn registry_count(&self) -> usize {
        self.registry.len()
    }

    // -- Students -----------------------------------------------------------

    /// Add a student. Fails with `AlreadyExists` if the id is taken.
    pub fn insert_student(&self, student: &StudentRecord) -> DbResult<()> {
        let swapped = self.students.compare_and_swap(
            student.student_id.as_bytes(),
            None as Option<&[u8]>,
            Some(encode(student)?),
        )?;
        if swapped.is_err() {
            return Err(DbError::AlreadyExists(student.student_id.clone()));
        }
        self.students.flush()?;
        Ok(())
    }

    /// Overwrite an existing student. Fails with `NotFound` otherwise.
    pub fn update_student(&self, student: &StudentRecord) -> DbResult<()> {
        if !self.students.contains_key(student.student_id.as_bytes())? {
            return Err(DbError::NotFound(student.student_id.clone()));
        }
        self.students
            .insert(student.student_id.as_bytes(), encode(student)?)?;
        self.students.flush()?;
        Ok(())
    }

    pub fn get_student(&self, student_id: &str) -> DbResult<Option<StudentRecord>> {
        self.students
            .get(student_id.as_bytes())?
            .map(|raw| decode(&raw))
            .transpose()
    }

    /// All students in key order.
    pub fn list_students(&self) -> DbResult<Vec<StudentRecord>> {
        self.students
            .iter()
            .map(|item| {
                let (_, raw) = item?;
                decode(&raw)
            })
            .collect()
    }

    // -- Issued credentials -------------------------------------------------

    /// Record a credential the issuer signed. The latest one per student wins.
    pub fn store_credential(&self, signed: &SignedCredential) -> DbResult<()> {
        self.credentials
            .insert(signed.credential.student_id.as_bytes(), encode(signed)?)?;
        self.credentials.flush()?;
        Ok(())
    }

    /// Most recently issued credential for a student.
    pub fn get_credential(&self, student_id: &str) -> DbResult<Option<SignedCredential>> {
        self.credentials
            .get(student_id.as_bytes())?
            .map(|raw| decode(&raw))
            .transpose()
    }
}

// ---------------------------------------------------------------------------
// Trait impls
// ---------------------------------------------------------------------------

impl SessionStore for ScholarDB {
    fn put(&self, session: &ChallengeSession) -> Result<bool, ZkpError> {
        let swapped = self
            .sessions
            .compare_and_swap(
                session.session_id.as_bytes(),
                None as Option<&[u8]>,
                Some(encode(session)?),
            )
            .map_err(DbError::from)?;
        Ok(swapped.is_ok())
    }

    fn get(&self, session_id: &str) -> Result<Option<ChallengeSession>, ZkpError> {
        Ok(self.read_session(session_id)?.map(|(_, s)| s))
    }

    fn compare_and_swap_used(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, ZkpError> {
        loop {
            let Some((raw, mut session)) = self.read_session(session_id)? else {
                return Ok(false);
            };
            if !session.is_live_at(now) {
                return Ok(false);
            }
            session.used = true;
            let swapped = self
                .sessions
                .compare_and_swap(session_id.as_bytes(), Some(raw), Some(encode(&session)?))
                .map_err(DbError::from)?;
            if swapped.is_ok() {
                return Ok(true);
            }
            // Lost a race; the re-read decides.
        }
    }

    fn remove_expired(&self, now: DateTime<Utc>) -> Result<usize, ZkpError> {
        let mut removed = 0;
        for item in self.sessions.iter() {
            let (key, raw) = item.map_err(DbError::from)?;
            let session: ChallengeSession = match decode(&raw) {
                Ok(s) => s,
                Err(err) => {
                    warn!(error = %err, "dropping undecodable session record");
                    self.sessions.remove(&key).map_err(DbError::from)?;
                    removed += 1;
                    continue;
                }
            };
            if session.is_expired_at(now) {
                // Only remove the exact record we inspected.
                let gone = self
                    .sessions
                    .compare_and_swap(&key, Some(raw), None as Option<&[u8]>)
                    .map_err(DbError::from)?;
                if gone.is_ok() {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }
}

impl KeyDirectory for ScholarDB {
    fn bound_public_key(&self, subject: &str) -> Result<Option<PublicKey>, ZkpError> {
        let Some(entry) = self.get_registry_entry(subject)? else {
            return Ok(None);
        };
        PublicKey::from_decimal(&entry.public_key)
            .map(Some)
            .map_err(|_| ZkpError::Storage(format!("registry key for {subject} is corrupt")))
    }
}
