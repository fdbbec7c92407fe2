//! Terminal walkthrough of one scholarship application.
//!
//! A college enrolls a student, the student binds a key and receives a
//! signed credential, a verifier registers it, issues a challenge, checks a
//! zero-knowledge proof, and decides eligibility. Then a replay and an
//! impostor both fail.
//!
//! Run with:
//!   cargo run --example demo --release

use std::time::Instant;

use chrono::{Datelike, Utc};

use scholarship_zkp::config::SessionConfig;
use scholarship_zkp::credential::{CredentialIssuer, StudentRecord};
use scholarship_zkp::eligibility::EligibilityEngine;
use scholarship_zkp::session::MemorySessionStore;
use scholarship_zkp::storage::{RegistryEntry, ScholarDB};
use scholarship_zkp::{ChallengeSessionManager, DomainParameters, KeyManager, SchnorrEngine};

// ---------------------------------------------------------------------------
// ANSI color constants
// ---------------------------------------------------------------------------

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const MAGENTA: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

const BG_BLUE: &str = "\x1b[44m";

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

fn banner() {
    println!();
    println!("{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}");
    println!("{BG_BLUE}{BOLD}{WHITE}    SCHOLARSHIP ZKP  --  Eligibility Walkthrough                    {RESET}");
    println!("{BG_BLUE}{BOLD}{WHITE}    Schnorr over RFC 3526 MODP-2048  |  HMAC-SHA256 credentials     {RESET}");
    println!("{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}");
    println!();
}

fn section(num: u32, title: &str) {
    println!();
    println!("{BOLD}{CYAN}===[{YELLOW} Step {num} {CYAN}]=============================================================={RESET}");
    println!("{BOLD}{WHITE}  {title}{RESET}");
    println!("{CYAN}------------------------------------------------------------------------{RESET}");
}

fn success(text: &str) {
    println!("{GREEN}  [OK] {text}{RESET}");
}

fn failure(text: &str) {
    println!("{RED}  [NO] {text}{RESET}");
}

fn info(label: &str, value: &str) {
    println!("{WHITE}  {BOLD}{label}:{RESET} {YELLOW}{value}{RESET}");
}

fn timing(label: &str, elapsed: std::time::Duration) {
    let ms = elapsed.as_secs_f64() * 1000.0;
    println!("{DIM}{MAGENTA}  [{label}: {ms:.2} ms]{RESET}");
}

/// First and last few digits of a big decimal.
fn abbreviate(decimal: &str) -> String {
    if decimal.len() <= 20 {
        return decimal.to_string();
    }
    format!(
        "{}...{} ({} digits)",
        &decimal[..8],
        &decimal[decimal.len() - 8..],
        decimal.len()
    )
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<(), Box<dyn std::error::Error>> {
    banner();

    let params = DomainParameters::standard();
    let keys = KeyManager::new(params.clone());
    let engine = SchnorrEngine::new(params.clone());
    let issuer = CredentialIssuer::new("demo-college-secret")?;
    let db = ScholarDB::open_temporary()?;
    let sessions = ChallengeSessionManager::new(
        MemorySessionStore::new(),
        engine.clone(),
        SessionConfig::default(),
    );
    let eligibility = EligibilityEngine::default();
    let now = Utc::now();

    // -- 1 --
    section(1, "The college enrolls a student");
    let mut record = StudentRecord {
        student_id: "STU001".into(),
        name: "Ada Lovelace".into(),
        email: "ada@college.edu".into(),
        department: "Computer Science".into(),
        admission_year: now.year() - 1,
        public_key: None,
    };
    db.insert_student(&record)?;
    info("Student", &format!("{} ({})", record.name, record.student_id));
    info("Group", &format!("p has {} bits, g = {}", params.p().bits(), params.g()));

    // -- 2 --
    section(2, "The student generates a key pair");
    let started = Instant::now();
    let pair = keys.generate_key_pair();
    timing("keygen", started.elapsed());
    info("Public key y", &abbreviate(&pair.public_key().to_decimal()));
    success("private key x never leaves this step");

    // -- 3 --
    section(3, "The college binds the key and signs a credential");
    record.public_key = Some(pair.public_key().to_decimal());
    db.update_student(&record)?;
    let signed = issuer.issue(&record, &pair.public_key().to_decimal(), now)?;
    info("Signature", &signed.signature);
    info("Expires", &signed.credential.expires_at.to_rfc3339());

    // -- 4 --
    section(4, "The verifier registers the credential");
    issuer.validate(&signed, now)?;
    let started = Instant::now();
    let valid_key = keys.validate_public_key(&signed.public_key()?);
    timing("subgroup check", started.elapsed());
    if !valid_key {
        failure("public key rejected");
        return Ok(());
    }
    db.upsert_registry_entry(&RegistryEntry::new(signed, now))?;
    success("signature, expiry and key all check out");

    // -- 5 --
    section(5, "Challenge, proof, verification");
    let session = sessions.issue_session(Some("STU001"))?;
    info("Session", &session.session_id);
    info("Challenge c", &abbreviate(&session.challenge.to_str_radix(10)));

    let started = Instant::now();
    let proof = engine.create_proof(pair.private_key(), &session.challenge);
    timing("prove", started.elapsed());
    info("Commitment t", &abbreviate(&proof.commitment.to_str_radix(10)));
    info("Response s", &abbreviate(&proof.response.to_str_radix(10)));

    let started = Instant::now();
    let verdict = sessions.verify_with_session(&session.session_id, Some("STU001"), |c| {
        engine.verify_complete_proof(&proof, c, pair.public_key())
    })?;
    timing("verify", started.elapsed());
    info("Verdict", &format!("{verdict:?}"));

    // -- 6 --
    section(6, "Eligibility");
    if let Some(entry) = db.get_registry_entry("STU001")? {
        let decision = eligibility.check_eligibility(
            "STU001",
            &entry.credential.credential,
            verdict.is_accepted(),
            Utc::now(),
        );
        info("Decision", &format!("{:?}", decision.decision));
        for reason in &decision.reasons {
            success(reason);
        }
    }

    // -- 7 --
    section(7, "Attacks");
    let replay = sessions.verify_with_session(&session.session_id, Some("STU001"), |c| {
        engine.verify_complete_proof(&proof, c, pair.public_key())
    })?;
    failure(&format!("replaying the same proof: {replay:?}"));

    let impostor = keys.generate_key_pair();
    let session = sessions.issue_session(Some("STU001"))?;
    let forged = engine.create_proof(impostor.private_key(), &session.challenge);
    let attempt = sessions.verify_with_session(&session.session_id, Some("STU001"), |c| {
        engine.verify_complete_proof(&forged, c, pair.public_key())
    })?;
    failure(&format!("proving with someone else's key: {attempt:?}"));

    let fs = engine.create_non_interactive_proof(pair.private_key(), pair.public_key(), "app-2026");
    if engine.verify_non_interactive_proof(&fs, pair.public_key(), "app-2026") {
        success("non-interactive proof accepted for its own message");
    }
    if !engine.verify_non_interactive_proof(&fs, pair.public_key(), "app-2027") {
        failure("the same proof presented for another message");
    }

    println!();
    Ok(())
}
