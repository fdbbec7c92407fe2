//! End-to-end integration tests for the scholarship ZKP library.
//!
//! These walk the whole student journey through the public API only: key
//! generation, credential issuance, registration, challenge sessions on a
//! real on-disk sled database, proof verification, and the eligibility
//! decision.
//!
//! Each test stands alone with its own temporary database.

use std::time::Duration as StdDuration;

use chrono::{Datelike, Duration, Utc};

use scholarship_zkp::config::{ConsumePolicy, SessionConfig};
use scholarship_zkp::credential::{CredentialIssuer, StudentRecord};
use scholarship_zkp::crypto::parse_decimal;
use scholarship_zkp::eligibility::{DecisionKind, EligibilityEngine};
use scholarship_zkp::identity::KeyFile;
use scholarship_zkp::session::SessionVerdict;
use scholarship_zkp::storage::{KeyDirectory, RegistryEntry, ScholarDB};
use scholarship_zkp::zkp::{ProofEnvelope, ProofVerifier};
use scholarship_zkp::{ChallengeSessionManager, DomainParameters, KeyManager, SchnorrEngine};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn student(id: &str, admission_year: i32) -> StudentRecord {
    StudentRecord {
        student_id: id.into(),
        name: "Alice".into(),
        email: "alice@college.edu".into(),
        department: "Computer Science".into(),
        admission_year,
        public_key: None,
    }
}

fn manager(db: &ScholarDB, policy: ConsumePolicy) -> ChallengeSessionManager<ScholarDB> {
    ChallengeSessionManager::new(
        db.clone(),
        SchnorrEngine::new(DomainParameters::standard()),
        SessionConfig {
            ttl: StdDuration::from_secs(300),
            consume_policy: policy,
        },
    )
}

// ---------------------------------------------------------------------------
// 1. Bare protocol scenarios
// ---------------------------------------------------------------------------

#[test]
fn interactive_round_accepts_and_rejects_shifted_challenge() {
    let params = DomainParameters::standard();
    let keys = KeyManager::new(params.clone());
    let engine = SchnorrEngine::new(params);
    let pair = keys.generate_key_pair();

    let (nonce, t) = engine.generate_commitment().into_parts();
    let c = engine.generate_challenge();
    let s = engine.generate_response(nonce, &c, pair.private_key());

    assert!(engine.verify_proof(&t, &s, &c, pair.public_key()));
    assert!(!engine.verify_proof(&t, &s, &(c + 1u32), pair.public_key()));
}

#[test]
fn non_interactive_proof_is_bound_to_its_message() {
    let params = DomainParameters::standard();
    let keys = KeyManager::new(params.clone());
    let engine = SchnorrEngine::new(params);
    let pair = keys.generate_key_pair();

    let proof = engine.create_non_interactive_proof(pair.private_key(), pair.public_key(), "app-2026");
    assert!(engine.verify_non_interactive_proof(&proof, pair.public_key(), "app-2026"));
    assert!(!engine.verify_non_interactive_proof(&proof, pair.public_key(), "other"));
}

// ---------------------------------------------------------------------------
// 2. Full scholarship flow
// ---------------------------------------------------------------------------

#[test]
fn full_scholarship_flow() {
    let dir = tempfile::tempdir().unwrap();
    let db = ScholarDB::open(dir.path()).unwrap();
    let params = DomainParameters::standard();
    let keys = KeyManager::new(params.clone());
    let verifier = ProofVerifier::new(SchnorrEngine::new(params));
    let issuer = CredentialIssuer::new("college-secret").unwrap();
    let sessions = manager(&db, ConsumePolicy::OnSuccess);
    let eligibility = EligibilityEngine::default();
    let now = Utc::now();

    // Issuer side: roster entry, key binding, signed credential.
    db.insert_student(&student("S001", now.year())).unwrap();
    let pair = keys.generate_key_pair();
    let mut record = db.get_student("S001").unwrap().unwrap();
    record.public_key = Some(pair.public_key().to_decimal());
    db.update_student(&record).unwrap();
    let signed = issuer
        .issue(&record, &pair.public_key().to_decimal(), now)
        .unwrap();

    // Verifier side: validate and register.
    issuer.validate(&signed, now).unwrap();
    assert!(keys.validate_public_key(&signed.public_key().unwrap()));
    db.upsert_registry_entry(&RegistryEntry::new(signed, now))
        .unwrap();
    let bound = db.bound_public_key("S001").unwrap().unwrap();
    assert_eq!(&bound, pair.public_key());

    // Challenge, answered over the wire format.
    let session = sessions.issue_session(Some("S001")).unwrap();
    let wire_challenge = session.challenge.to_str_radix(10);
    let c = parse_decimal(&wire_challenge).unwrap();
    let proof = verifier.engine().create_proof(pair.private_key(), &c);
    let envelope = ProofEnvelope::from_json(&serde_json::json!({
        "t": proof.commitment.to_str_radix(10),
        "s": proof.response.to_str_radix(10),
    }))
    .unwrap();

    let verdict = sessions
        .verify_with_session(&session.session_id, Some("S001"), |c| {
            verifier.verify_envelope(&envelope, c, &bound)
        })
        .unwrap();
    assert_eq!(verdict, SessionVerdict::Accepted);

    // Replay of the exact same proof.
    let replay = sessions
        .verify_with_session(&session.session_id, Some("S001"), |c| {
            verifier.verify_envelope(&envelope, c, &bound)
        })
        .unwrap();
    assert_eq!(replay, SessionVerdict::Unavailable);

    // Decision.
    let entry = db.get_registry_entry("S001").unwrap().unwrap();
    let decision =
        eligibility.check_eligibility("S001", &entry.credential.credential, verdict.is_accepted(), now);
    assert_eq!(decision.decision, DecisionKind::Grant);
    assert_eq!(eligibility.decision_history(Some("S001")).len(), 1);
}

// ---------------------------------------------------------------------------
// 3. Sessions survive a restart, and stay single-use across it
// ---------------------------------------------------------------------------

#[test]
fn session_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let params = DomainParameters::standard();
    let keys = KeyManager::new(params.clone());
    let engine = SchnorrEngine::new(params);
    let pair = keys.generate_key_pair();

    let (session_id, proof) = {
        let db = ScholarDB::open(dir.path()).unwrap();
        let sessions = manager(&db, ConsumePolicy::OnSuccess);
        let session = sessions.issue_session(None).unwrap();
        let proof = engine.create_proof(pair.private_key(), &session.challenge);
        db.flush().unwrap();
        (session.session_id, proof)
    };

    let db = ScholarDB::open(dir.path()).unwrap();
    let sessions = manager(&db, ConsumePolicy::OnSuccess);
    let check = |c: &num_bigint::BigUint| engine.verify_complete_proof(&proof, c, pair.public_key());
    assert_eq!(
        sessions.verify_with_session(&session_id, None, check).unwrap(),
        SessionVerdict::Accepted
    );
    db.flush().unwrap();
    drop(sessions);
    drop(db);

    let db = ScholarDB::open(dir.path()).unwrap();
    let sessions = manager(&db, ConsumePolicy::OnSuccess);
    assert!(sessions.get_challenge(&session_id).is_none());
}

// ---------------------------------------------------------------------------
// 4. Expiry and the single-shot policy
// ---------------------------------------------------------------------------

#[test]
fn expired_sessions_are_unavailable_and_purged() {
    let db = ScholarDB::open_temporary().unwrap();
    let sessions = manager(&db, ConsumePolicy::OnSuccess);
    let issued = Utc::now();
    let session = sessions.issue_session_at(None, issued).unwrap();

    // Inclusive at the boundary, dead one second after.
    let boundary = issued + Duration::seconds(300);
    assert!(sessions.get_challenge_at(&session.session_id, boundary).is_some());
    let late = boundary + Duration::seconds(1);
    assert_eq!(
        sessions
            .verify_with_session_at(&session.session_id, None, late, |_| true)
            .unwrap(),
        SessionVerdict::Unavailable
    );
    assert_eq!(sessions.purge_expired(late), 1);
    assert_eq!(db.session_count(), 0);
}

#[test]
fn single_shot_policy_burns_failed_attempts() {
    let db = ScholarDB::open_temporary().unwrap();
    let sessions = manager(&db, ConsumePolicy::Always);
    let session = sessions.issue_session(None).unwrap();

    assert_eq!(
        sessions
            .verify_with_session(&session.session_id, None, |_| false)
            .unwrap(),
        SessionVerdict::Rejected
    );
    assert_eq!(
        sessions
            .verify_with_session(&session.session_id, None, |_| true)
            .unwrap(),
        SessionVerdict::Unavailable
    );
}

// ---------------------------------------------------------------------------
// 5. Key files
// ---------------------------------------------------------------------------

#[test]
fn key_file_round_trip_and_mismatch() {
    let keys = KeyManager::new(DomainParameters::standard());
    let pair = keys.generate_key_pair();
    let other = keys.generate_key_pair();

    let json = serde_json::to_string(&KeyFile::from_key_pair(&pair)).unwrap();
    let back: KeyFile = serde_json::from_str(&json).unwrap();
    let restored = back.into_key_pair(&keys).unwrap();
    assert_eq!(restored.public_key(), pair.public_key());

    let mismatched = KeyFile {
        private_key: KeyFile::from_key_pair(&pair).private_key,
        public_key: other.public_key().to_decimal(),
    };
    assert!(mismatched.into_key_pair(&keys).is_err());
}
