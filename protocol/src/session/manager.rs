//! # Challenge Session Manager
//!
//! Hands out single-use, time-bounded challenges and settles proofs against
//! them. A missing, expired, used or foreign session all look the same from
//! outside: there is simply no challenge to answer.

use chrono::{DateTime, Duration, Utc};
use num_bigint::BigUint;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::store::{ChallengeSession, SessionStore};
use crate::config::{ConsumePolicy, SessionConfig};
use crate::zkp::{SchnorrEngine, ZkpError};

/// Outcome of [`ChallengeSessionManager::verify_with_session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionVerdict {
    /// The proof verified and this call consumed the session.
    Accepted,
    /// The proof did not verify.
    Rejected,
    /// No live session matched: missing, expired, already used, or bound to
    /// a different subject.
    Unavailable,
}

impl SessionVerdict {
    pub fn is_accepted(self) -> bool {
        self == SessionVerdict::Accepted
    }
}

/// Issues challenges and enforces one answer per challenge.
#[derive(Debug)]
pub struct ChallengeSessionManager<S: SessionStore> {
    store: S,
    engine: SchnorrEngine,
    config: SessionConfig,
}

impl<S: SessionStore> ChallengeSessionManager<S> {
    pub fn new(store: S, engine: SchnorrEngine, config: SessionConfig) -> Self {
        Self {
            store,
            engine,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Issue a fresh session, optionally bound to `subject`.
    pub fn issue_session(&self, subject: Option<&str>) -> Result<ChallengeSession, ZkpError> {
        self.issue_session_at(subject, Utc::now())
    }

    pub fn issue_session_at(
        &self,
        subject: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ChallengeSession, ZkpError> {
        let ttl = Duration::from_std(self.config.ttl)
            .map_err(|_| ZkpError::InvalidParameters("session ttl out of range".into()))?;

        let session = ChallengeSession {
            session_id: Uuid::new_v4().to_string(),
            challenge: self.engine.generate_challenge(),
            subject: subject.map(str::to_owned),
            created_at: now,
            expires_at: now + ttl,
            used: false,
        };

        if !self.store.put(&session)? {
            return Err(ZkpError::Storage("session id collision".into()));
        }

        debug!(session_id = %session.session_id, subject = ?session.subject, "challenge issued");
        Ok(session)
    }

    /// The challenge of a live session, or `None`.
    pub fn get_challenge(&self, session_id: &str) -> Option<BigUint> {
        self.get_challenge_at(session_id, Utc::now())
    }

    pub fn get_challenge_at(&self, session_id: &str, now: DateTime<Utc>) -> Option<BigUint> {
        self.live_session(session_id, now).map(|s| s.challenge)
    }

    /// Consume a live session. `true` only for the call that consumed it.
    pub fn mark_used(&self, session_id: &str) -> bool {
        self.mark_used_at(session_id, Utc::now())
    }

    pub fn mark_used_at(&self, session_id: &str, now: DateTime<Utc>) -> bool {
        match self.store.compare_and_swap_used(session_id, now) {
            Ok(claimed) => claimed,
            Err(err) => {
                warn!(session_id, error = %err, "session store failed during mark_used");
                false
            }
        }
    }

    /// Fetch the session's challenge, run `verify` on it, and consume the
    /// session according to the configured [`ConsumePolicy`].
    ///
    /// A session bound to a subject is unavailable to any other subject.
    /// Only store failures are errors; everything else is a verdict.
    pub fn verify_with_session<F>(
        &self,
        session_id: &str,
        subject: Option<&str>,
        verify: F,
    ) -> Result<SessionVerdict, ZkpError>
    where
        F: FnOnce(&BigUint) -> bool,
    {
        self.settle(session_id, subject, Utc::now, verify)
    }

    /// [`verify_with_session`](Self::verify_with_session) at a fixed instant.
    pub fn verify_with_session_at<F>(
        &self,
        session_id: &str,
        subject: Option<&str>,
        now: DateTime<Utc>,
        verify: F,
    ) -> Result<SessionVerdict, ZkpError>
    where
        F: FnOnce(&BigUint) -> bool,
    {
        self.settle(session_id, subject, || now, verify)
    }

    /// The clock is read once for the lookup and again for the claim, so a
    /// slow `verify` cannot consume a session after it expired.
    fn settle<C, F>(
        &self,
        session_id: &str,
        subject: Option<&str>,
        clock: C,
        verify: F,
    ) -> Result<SessionVerdict, ZkpError>
    where
        C: Fn() -> DateTime<Utc>,
        F: FnOnce(&BigUint) -> bool,
    {
        let session = match self.store.get(session_id)? {
            Some(s) if s.is_live_at(clock()) => s,
            _ => {
                debug!(session_id, "no live session");
                return Ok(SessionVerdict::Unavailable);
            }
        };

        if let Some(bound) = session.subject.as_deref() {
            if subject != Some(bound) {
                debug!(session_id, "session bound to another subject");
                return Ok(SessionVerdict::Unavailable);
            }
        }

        let verdict = match self.config.consume_policy {
            ConsumePolicy::Always => {
                if !self.store.compare_and_swap_used(session_id, clock())? {
                    return Ok(SessionVerdict::Unavailable);
                }
                if verify(&session.challenge) {
                    SessionVerdict::Accepted
                } else {
                    SessionVerdict::Rejected
                }
            }
            ConsumePolicy::OnSuccess => {
                if !verify(&session.challenge) {
                    SessionVerdict::Rejected
                } else if self.store.compare_and_swap_used(session_id, clock())? {
                    SessionVerdict::Accepted
                } else {
                    // Somebody else consumed it between our read and our claim.
                    SessionVerdict::Unavailable
                }
            }
        };

        debug!(session_id, ?verdict, "session settled");
        Ok(verdict)
    }

    /// Drop expired sessions. Returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        match self.store.remove_expired(now) {
            Ok(0) => 0,
            Ok(n) => {
                info!(removed = n, "purged expired challenge sessions");
                n
            }
            Err(err) => {
                warn!(error = %err, "failed to purge expired sessions");
                0
            }
        }
    }

    fn live_session(&self, session_id: &str, now: DateTime<Utc>) -> Option<ChallengeSession> {
        match self.store.get(session_id) {
            Ok(Some(s)) if s.is_live_at(now) => Some(s),
            Ok(_) => None,
            Err(err) => {
                warn!(session_id, error = %err, "session store failed during lookup");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::DomainParameters;
    use crate::identity::KeyManager;
    use crate::session::MemorySessionStore;
    use std::sync::Arc;
    use std::time::Duration as StdDuration;

    fn manager(policy: ConsumePolicy) -> ChallengeSessionManager<MemorySessionStore> {
        let engine = SchnorrEngine::new(DomainParameters::standard());
        ChallengeSessionManager::new(
            MemorySessionStore::new(),
            engine,
            SessionConfig {
                ttl: StdDuration::from_secs(300),
                consume_policy: policy,
            },
        )
    }

    #[test]
    fn test_issue_and_fetch() {
        let m = manager(ConsumePolicy::OnSuccess);
        let s = m.issue_session(Some("S001")).unwrap();
        assert_eq!(s.expires_at - s.created_at, Duration::seconds(300));
        assert!(!s.used);
        assert_eq!(m.get_challenge(&s.session_id), Some(s.challenge.clone()));
        assert!(Uuid::parse_str(&s.session_id).is_ok());
    }

    #[test]
    fn test_session_ids_unique() {
        let m = manager(ConsumePolicy::OnSuccess);
        let a = m.issue_session(None).unwrap();
        let b = m.issue_session(None).unwrap();
        assert_ne!(a.session_id, b.session_id);
    }

    #[test]
    fn test_unknown_session() {
        let m = manager(ConsumePolicy::OnSuccess);
        assert!(m.get_challenge("nope").is_none());
        assert!(!m.mark_used("nope"));
        assert_eq!(
            m.verify_with_session("nope", None, |_| true).unwrap(),
            SessionVerdict::Unavailable
        );
    }

    #[test]
    fn test_mark_used_once() {
        let m = manager(ConsumePolicy::OnSuccess);
        let s = m.issue_session(None).unwrap();
        assert!(m.mark_used(&s.session_id));
        assert!(!m.mark_used(&s.session_id));
        assert!(m.get_challenge(&s.session_id).is_none());
    }

    #[test]
    fn test_expired_session_unavailable() {
        let m = manager(ConsumePolicy::OnSuccess);
        let issued = Utc::now();
        let s = m.issue_session_at(None, issued).unwrap();
        let late = issued + Duration::seconds(301);

        assert!(m.get_challenge_at(&s.session_id, late).is_none());
        assert!(!m.mark_used_at(&s.session_id, late));
        assert_eq!(
            m.verify_with_session_at(&s.session_id, None, late, |_| true)
                .unwrap(),
            SessionVerdict::Unavailable
        );
        assert_eq!(m.purge_expired(late), 1);
    }

    #[test]
    fn test_claim_rechecks_expiry_after_slow_verification() {
        use std::cell::Cell;

        let m = manager(ConsumePolicy::OnSuccess);
        let issued = Utc::now();
        let s = m.issue_session_at(None, issued).unwrap();

        // Live when read, expired by the time the proof has been checked.
        let reads = Cell::new(0);
        let clock = || {
            reads.set(reads.get() + 1);
            if reads.get() == 1 {
                issued + Duration::seconds(299)
            } else {
                issued + Duration::seconds(301)
            }
        };
        assert_eq!(
            m.settle(&s.session_id, None, clock, |_| true).unwrap(),
            SessionVerdict::Unavailable
        );
        assert_eq!(reads.get(), 2);
        assert!(!m.store().get(&s.session_id).unwrap().unwrap().used);
    }

    #[test]
    fn test_replay_is_rejected() {
        let params = DomainParameters::standard();
        let engine = SchnorrEngine::new(params.clone());
        let km = KeyManager::new(params);
        let pair = km.generate_key_pair();
        let m = manager(ConsumePolicy::OnSuccess);

        let s = m.issue_session(Some("S001")).unwrap();
        let proof = engine.create_proof(pair.private_key(), &s.challenge);
        let check = |c: &BigUint| engine.verify_complete_proof(&proof, c, pair.public_key());

        assert_eq!(
            m.verify_with_session(&s.session_id, Some("S001"), check).unwrap(),
            SessionVerdict::Accepted
        );
        assert_eq!(
            m.verify_with_session(&s.session_id, Some("S001"), check).unwrap(),
            SessionVerdict::Unavailable
        );
    }

    #[test]
    fn test_on_success_allows_retry_after_failure() {
        let m = manager(ConsumePolicy::OnSuccess);
        let s = m.issue_session(None).unwrap();
        assert_eq!(
            m.verify_with_session(&s.session_id, None, |_| false).unwrap(),
            SessionVerdict::Rejected
        );
        assert_eq!(
            m.verify_with_session(&s.session_id, None, |_| true).unwrap(),
            SessionVerdict::Accepted
        );
    }

    #[test]
    fn test_always_burns_session_on_failure() {
        let m = manager(ConsumePolicy::Always);
        let s = m.issue_session(None).unwrap();
        assert_eq!(
            m.verify_with_session(&s.session_id, None, |_| false).unwrap(),
            SessionVerdict::Rejected
        );
        assert_eq!(
            m.verify_with_session(&s.session_id, None, |_| true).unwrap(),
            SessionVerdict::Unavailable
        );
    }

    #[test]
    fn test_subject_binding() {
        let m = manager(ConsumePolicy::OnSuccess);
        let s = m.issue_session(Some("S001")).unwrap();
        assert_eq!(
            m.verify_with_session(&s.session_id, Some("S002"), |_| true)
                .unwrap(),
            SessionVerdict::Unavailable
        );
        assert_eq!(
            m.verify_with_session(&s.session_id, None, |_| true).unwrap(),
            SessionVerdict::Unavailable
        );
        assert!(m
            .verify_with_session(&s.session_id, Some("S001"), |_| true)
            .unwrap()
            .is_accepted());
    }

    #[test]
    fn test_concurrent_verification_single_winner() {
        let m = Arc::new(manager(ConsumePolicy::OnSuccess));
        let s = m.issue_session(None).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let m = Arc::clone(&m);
                let id = s.session_id.clone();
                std::thread::spawn(move || m.verify_with_session(&id, None, |_| true).unwrap())
            })
            .collect();
        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|v| v.is_accepted())
            .count();
        assert_eq!(accepted, 1);
    }
}
