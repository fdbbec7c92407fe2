//! # Scholarship Eligibility
//!
//! Turns "the proof verified" plus a credential into a GRANT or DENY with
//! human-readable reasons, and keeps every decision for later audit.

use chrono::{DateTime, Datelike, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::MAX_ADMISSION_AGE_YEARS;
use crate::credential::Credential;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DecisionKind {
    Grant,
    Deny,
}

/// One eligibility ruling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub student_id: String,
    pub eligible: bool,
    pub decision: DecisionKind,
    pub reasons: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Extra, per-programme rules layered on top of the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criteria {
    #[serde(default)]
    pub min_admission_year: Option<i32>,
    #[serde(default)]
    pub required_department: Option<String>,
}

/// Evaluates eligibility and records the outcome.
#[derive(Debug)]
pub struct EligibilityEngine {
    max_admission_age: i32,
    history: RwLock<Vec<Decision>>,
}

impl Default for EligibilityEngine {
    fn default() -> Self {
        Self::new(MAX_ADMISSION_AGE_YEARS)
    }
}

impl EligibilityEngine {
    pub fn new(max_admission_age: i32) -> Self {
        Self {
            max_admission_age,
            history: RwLock::new(Vec::new()),
        }
    }

    /// Rule order: proof, required attributes, admission age, expiry.
    /// A failed proof short-circuits everything else.
    pub fn check_eligibility(
        &self,
        student_id: &str,
        credential: &Credential,
        proof_verified: bool,
        now: DateTime<Utc>,
    ) -> Decision {
        let mut reasons = Vec::new();

        if !proof_verified {
            reasons.push("ZKP proof verification failed".to_string());
            return self.record(student_id, false, reasons, now);
        }

        let mut eligible = true;

        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        let required = [
            ("student_id", !credential.student_id.is_empty()),
            ("name", present(&credential.name)),
            ("department", present(&credential.department)),
            ("admission_year", credential.admission_year.is_some()),
        ];
        for (field, ok) in required {
            if !ok {
                eligible = false;
                reasons.push(format!("Missing required field: {field}"));
            }
        }

        if eligible {
            if let Some(year) = credential.admission_year {
                if now.year() - year > self.max_admission_age {
                    eligible = false;
                    reasons.push(format!(
                        "Admission year too old (>{} years)",
                        self.max_admission_age
                    ));
                }
            }
        }

        if credential.is_expired_at(now) {
            eligible = false;
            reasons.push("Credential expired".to_string());
        }

        if eligible {
            reasons.push("All eligibility criteria met".to_string());
            reasons.push("ZKP proof verified successfully".to_string());
        }

        self.record(student_id, eligible, reasons, now)
    }

    /// Evaluate `criteria` against a credential without recording anything.
    pub fn apply_custom_criteria(
        &self,
        credential: &Credential,
        criteria: &Criteria,
    ) -> (bool, Vec<String>) {
        let mut eligible = true;
        let mut reasons = Vec::new();

        if let Some(min_year) = criteria.min_admission_year {
            if credential.admission_year.unwrap_or(0) < min_year {
                eligible = false;
                reasons.push(format!("Admission year before {min_year}"));
            }
        }

        if let Some(required) = &criteria.required_department {
            if credential.department.as_deref() != Some(required.as_str()) {
                eligible = false;
                reasons.push(format!("Not in required department: {required}"));
            }
        }

        (eligible, reasons)
    }

    /// Decisions in the order they were made, optionally for one student.
    pub fn decision_history(&self, student_id: Option<&str>) -> Vec<Decision> {
        let history = self.history.read();
        match student_id {
            Some(id) => history.iter().filter(|d| d.student_id == id).cloned().collect(),
            None => history.clone(),
        }
    }

    fn record(
        &self,
        student_id: &str,
        eligible: bool,
        reasons: Vec<String>,
        now: DateTime<Utc>,
    ) -> Decision {
        let decision = Decision {
            student_id: student_id.to_string(),
            eligible,
            decision: if eligible {
                DecisionKind::Grant
            } else {
                DecisionKind::Deny
            },
            reasons,
            timestamp: now,
        };
        info!(student_id, decision = ?decision.decision, "eligibility decided");
        self.history.write().push(decision.clone());
        decision
    }
}
