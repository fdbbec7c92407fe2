//! Challenge session records and the storage seam behind them.
//!
//! The only write that matters is the `used` flip. It must be a single
//! atomic step in every backend: two verifiers racing on one session must
//! never both see `false -> true`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::crypto::codec::decimal_string;
use crate::zkp::ZkpError;

// ---------------------------------------------------------------------------
// ChallengeSession
// ---------------------------------------------------------------------------

/// One issued challenge.
///
/// `used` flips from `false` to `true` at most once. A session is dead once
/// `now > expires_at`, used or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeSession {
    pub session_id: String,
    #[serde(with = "decimal_string")]
    pub challenge: BigUint,
    /// Student this challenge was issued to, if any.
    pub subject: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

impl ChallengeSession {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Not used and not expired.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        !self.used && !self.is_expired_at(now)
    }
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// Key-value persistence for challenge sessions.
pub trait SessionStore: Send + Sync {
    /// Insert `session` unless its id is already taken. Returns whether it
    /// was inserted.
    fn put(&self, session: &ChallengeSession) -> Result<bool, ZkpError>;

    fn get(&self, session_id: &str) -> Result<Option<ChallengeSession>, ZkpError>;

    /// Atomically set `used` if the session exists, is unused and has not
    /// expired at `now`. Returns `true` only for the call that flipped it.
    fn compare_and_swap_used(&self, session_id: &str, now: DateTime<Utc>)
        -> Result<bool, ZkpError>;

    /// Drop every session that expired before `now`. Returns how many.
    fn remove_expired(&self, now: DateTime<Utc>) -> Result<usize, ZkpError>;
}

impl<S: SessionStore + ?Sized> SessionStore for Arc<S> {
    fn put(&self, session: &ChallengeSession) -> Result<bool, ZkpError> {
        (**self).put(session)
    }

    fn get(&self, session_id: &str) -> Result<Option<ChallengeSession>, ZkpError> {
        (**self).get(session_id)
    }

    fn compare_and_swap_used(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, ZkpError> {
        (**self).compare_and_swap_used(session_id, now)
    }

    fn remove_expired(&self, now: DateTime<Utc>) -> Result<usize, ZkpError> {
        (**self).remove_expired(now)
    }
}

// ---------------------------------------------------------------------------
// MemorySessionStore
// ---------------------------------------------------------------------------

/// In-process store. The `used` flip happens under the entry's shard lock.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, ChallengeSession>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn put(&self, session: &ChallengeSession) -> Result<bool, ZkpError> {
        match self.sessions.entry(session.session_id.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(session.clone());
                Ok(true)
            }
        }
    }

    fn get(&self, session_id: &str) -> Result<Option<ChallengeSession>, ZkpError> {
        Ok(self.sessions.get(session_id).map(|s| s.clone()))
    }

    fn compare_and_swap_used(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, ZkpError> {
        let Some(mut session) = self.sessions.get_mut(session_id) else {
            return Ok(false);
        };
        if !session.is_live_at(now) {
            return Ok(false);
        }
        session.used = true;
        Ok(true)
    }

    fn remove_expired(&self, now: DateTime<Utc>) -> Result<usize, ZkpError> {
        let mut removed = 0;
        self.sessions.retain(|_, s| {
            let keep = !s.is_expired_at(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}
