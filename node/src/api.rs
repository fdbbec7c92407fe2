//! # REST API
//!
//! Builds the axum router for the issuer and verifier roles. All endpoints
//! share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                               | Description                              |
//! |--------|------------------------------------|------------------------------------------|
//! | GET    | `/health`                          | Liveness probe                           |
//! | POST   | `/issuer/students`                 | Add a student record                     |
//! | GET    | `/issuer/students`                 | List student records                     |
//! | POST   | `/issuer/verify-identity`          | Check a student id against a name        |
//! | POST   | `/issuer/credentials`              | Bind a key and issue a signed credential |
//! | GET    | `/issuer/credentials/:student_id`  | Latest credential issued to a student    |
//! | POST   | `/register-credential`             | Validate a credential, register its key  |
//! | POST   | `/request-challenge`               | Open a challenge session                 |
//! | POST   | `/verify-proof`                    | Verify an interactive proof              |
//! | POST   | `/verify-non-interactive`          | Verify a Fiat-Shamir proof               |
//! | POST   | `/check-eligibility`               | Verify a proof, then decide eligibility  |
//! | GET    | `/registry/:student_id`            | Registry entry                           |
//! | GET    | `/decisions`                       | Decision history (`?student_id=`)        |
//!
//! Errors are `{"error": "..."}` with a matching status code. A proof that
//! fails to verify is not an error: it is a `200` with `verified: false`.

use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use scholarship_zkp::config::SessionConfig;
use scholarship_zkp::credential::{
    Credential, CredentialError, CredentialIssuer, SignedCredential, StudentRecord,
};
use scholarship_zkp::eligibility::{Criteria, Decision, EligibilityEngine};
use scholarship_zkp::session::{ChallengeSessionManager, SessionVerdict};
use scholarship_zkp::storage::{DbError, KeyDirectory, RegistryEntry, ScholarDB};
use scholarship_zkp::zkp::{ProofEnvelope, ProofVerifier};
use scholarship_zkp::{DomainParameters, KeyManager, PublicKey, SchnorrEngine, ZkpError};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone: every field is an `Arc` or a shared handle.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// Students, registry and sessions.
    pub db: ScholarDB,
    pub sessions: Arc<ChallengeSessionManager<ScholarDB>>,
    pub issuer: Arc<CredentialIssuer>,
    pub keys: Arc<KeyManager>,
    pub verifier: Arc<ProofVerifier>,
    pub eligibility: Arc<EligibilityEngine>,
    pub metrics: SharedMetrics,
}

impl AppState {
    /// Wire every component to the standard group and the given store.
    pub fn new(
        version: String,
        db: ScholarDB,
        issuer: CredentialIssuer,
        session_config: SessionConfig,
        metrics: SharedMetrics,
    ) -> Self {
        let params = DomainParameters::standard();
        let engine = SchnorrEngine::new(params.clone());
        Self {
            version,
            sessions: Arc::new(ChallengeSessionManager::new(
                db.clone(),
                engine.clone(),
                session_config,
            )),
            db,
            issuer: Arc::new(issuer),
            keys: Arc::new(KeyManager::new(params)),
            verifier: Arc::new(ProofVerifier::new(engine)),
            eligibility: Arc::new(EligibilityEngine::default()),
            metrics,
        }
    }
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/issuer/students",
            get(list_students_handler).post(add_student_handler),
        )
        .route("/issuer/verify-identity", post(verify_identity_handler))
        .route("/issuer/credentials", post(issue_credential_handler))
        .route("/issuer/credentials/:student_id", get(get_credential_handler))
        .route("/register-credential", post(register_credential_handler))
        .route("/request-challenge", post(request_challenge_handler))
        .route("/verify-proof", post(verify_proof_handler))
        .route("/verify-non-interactive", post(verify_non_interactive_handler))
        .route("/check-eligibility", post(check_eligibility_handler))
        .route("/registry/:student_id", get(registry_handler))
        .route("/decisions", get(decisions_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error body for all non-2xx responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A status code plus a message, rendered as [`ErrorResponse`].
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "request failed");
        }
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(what) => Self::not_found(format!("Not found: {what}")),
            DbError::AlreadyExists(what) => {
                Self::new(StatusCode::CONFLICT, format!("Already exists: {what}"))
            }
            other => Self::internal(format!("Database error: {other}")),
        }
    }
}

impl From<ZkpError> for ApiError {
    fn from(err: ZkpError) -> Self {
        match err {
            ZkpError::Storage(msg) => Self::internal(format!("Storage error: {msg}")),
            other => Self::bad_request(other.to_string()),
        }
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::BadSignature => Self::unauthorized("Invalid credential or signature"),
            CredentialError::Expired(_) => Self::unauthorized("Credential expired"),
            CredentialError::MalformedPublicKey => {
                Self::bad_request("No valid public key in credential")
            }
            other => Self::internal(other.to_string()),
        }
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Body of `POST /issuer/students`.
#[derive(Debug, Deserialize)]
pub struct AddStudentRequest {
    pub student_id: String,
    pub name: String,
    pub email: String,
    pub department: String,
    pub admission_year: i32,
}

/// Body of `POST /issuer/verify-identity`.
#[derive(Debug, Deserialize)]
pub struct VerifyIdentityRequest {
    pub student_id: String,
    pub name: String,
}

/// Body of `POST /issuer/credentials`.
#[derive(Debug, Deserialize)]
pub struct IssueCredentialRequest {
    pub student_id: String,
    /// Must match the enrolled name before any key is bound.
    pub name: String,
    /// Decimal public key the student wants bound.
    pub public_key: String,
}

/// Response of `POST /issuer/credentials`.
#[derive(Debug, Serialize, Deserialize)]
pub struct IssueCredentialResponse {
    pub success: bool,
    pub credential: Credential,
    pub signature: String,
}

/// Response of `GET /issuer/credentials/:student_id`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoredCredentialResponse {
    pub success: bool,
    pub credential: Credential,
    pub signature: String,
    pub issued_at: DateTime<Utc>,
}

/// Body of `POST /register-credential`.
#[derive(Debug, Deserialize)]
pub struct RegisterCredentialRequest {
    pub student_id: String,
    pub credential: Credential,
    pub signature: String,
}

#[derive(Debug, Deserialize)]
pub struct ChallengeRequest {
    pub student_id: String,
}

/// Response of `POST /request-challenge`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChallengeResponse {
    pub session_id: String,
    /// Decimal challenge `c`.
    pub challenge: String,
    pub expires_at: DateTime<Utc>,
}

/// Body of `POST /verify-proof` and `POST /check-eligibility`.
#[derive(Debug, Deserialize)]
pub struct ProofRequest {
    pub session_id: String,
    pub student_id: String,
    /// `{commitment|t, response|s}`; parsed by [`ProofEnvelope`].
    pub proof: serde_json::Value,
    /// Extra rules, only honoured by `/check-eligibility`.
    #[serde(default)]
    pub criteria: Option<Criteria>,
}

/// Body of `POST /verify-non-interactive`.
#[derive(Debug, Deserialize)]
pub struct NonInteractiveRequest {
    pub student_id: String,
    pub message: String,
    pub proof: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub verified: bool,
    pub message: String,
}

impl VerifyResponse {
    fn from_outcome(verified: bool) -> Self {
        Self {
            verified,
            message: if verified {
                "Proof verified successfully".into()
            } else {
                "Proof verification failed".into()
            },
        }
    }
}

/// Outcome of the optional custom criteria on `/check-eligibility`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CriteriaOutcome {
    pub met: bool,
    pub reasons: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EligibilityResponse {
    #[serde(flatten)]
    pub decision: Decision,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub criteria: Option<CriteriaOutcome>,
}

#[derive(Debug, Deserialize)]
pub struct DecisionQuery {
    pub student_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`: returns 200 if the node is alive.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok", "version": state.version }))
}

/// `POST /issuer/students`: add a student. 409 if the id is taken.
async fn add_student_handler(
    State(state): State<AppState>,
    Json(req): Json<AddStudentRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.student_id.trim().is_empty() {
        return Err(ApiError::bad_request("student_id must not be empty"));
    }
    let record = StudentRecord {
        student_id: req.student_id,
        name: req.name,
        email: req.email,
        department: req.department,
        admission_year: req.admission_year,
        public_key: None,
    };
    state.db.insert_student(&record)?;
    tracing::info!(student_id = %record.student_id, "student added");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true, "message": "Student added successfully" })),
    ))
}

/// `GET /issuer/students`: every student record.
async fn list_students_handler(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let students = state.db.list_students()?;
    Ok(Json(serde_json::json!({ "students": students })))
}

/// `POST /issuer/verify-identity`: 200 with the record if the name matches
/// the enrolled student, 401 otherwise. Unknown ids are a 401 too.
async fn verify_identity_handler(
    State(state): State<AppState>,
    Json(req): Json<VerifyIdentityRequest>,
) -> ApiResult<Response> {
    match state.db.get_student(&req.student_id)? {
        Some(student) if student.matches_identity(&req.name) => Ok(Json(
            serde_json::json!({ "verified": true, "student": student }),
        )
        .into_response()),
        _ => {
            tracing::debug!(student_id = %req.student_id, "identity check failed");
            Ok((
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "verified": false })),
            )
                .into_response())
        }
    }
}

/// `POST /issuer/credentials`: bind a public key to a student and sign a
/// credential over it.
///
/// The caller must name the student. The first key a student presents is
/// bound for good; presenting a different one later is a 409.
async fn issue_credential_handler(
    State(state): State<AppState>,
    Json(req): Json<IssueCredentialRequest>,
) -> ApiResult<Json<IssueCredentialResponse>> {
    let mut student = state
        .db
        .get_student(&req.student_id)?
        .ok_or_else(|| ApiError::not_found("Student not found"))?;
    if !student.matches_identity(&req.name) {
        tracing::warn!(student_id = %req.student_id, "credential request with wrong name");
        return Err(ApiError::unauthorized("Identity verification failed"));
    }

    let public_key = PublicKey::from_decimal(&req.public_key)
        .map_err(|_| ApiError::bad_request("public_key must be a decimal integer"))?;
    if !state.keys.validate_public_key(&public_key) {
        return Err(ApiError::bad_request(
            "public_key is not a valid group element",
        ));
    }
    let canonical = public_key.to_decimal();

    match student.public_key.as_deref() {
        Some(bound) if bound != canonical => {
            return Err(ApiError::new(
                StatusCode::CONFLICT,
                "A different public key is already bound to this student",
            ));
        }
        Some(_) => {}
        None => {
            student.public_key = Some(canonical.clone());
            state.db.update_student(&student)?;
            tracing::info!(student_id = %student.student_id, "public key bound");
        }
    }

    let signed = state.issuer.issue(&student, &canonical, Utc::now())?;
    state.db.store_credential(&signed)?;
    tracing::info!(student_id = %student.student_id, "credential issued");
    Ok(Json(IssueCredentialResponse {
        success: true,
        credential: signed.credential,
        signature: signed.signature,
    }))
}

/// `GET /issuer/credentials/:student_id`: the latest issued credential.
async fn get_credential_handler(
    Path(student_id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<StoredCredentialResponse>> {
    let signed = state
        .db
        .get_credential(&student_id)?
        .ok_or_else(|| ApiError::not_found("Credential not found"))?;
    Ok(Json(StoredCredentialResponse {
        success: true,
        issued_at: signed.credential.issued_at,
        credential: signed.credential,
        signature: signed.signature,
    }))
}

/// `POST /register-credential`: validate a credential and bind its key in
/// the verifier's registry.
async fn register_credential_handler(
    State(state): State<AppState>,
    Json(req): Json<RegisterCredentialRequest>,
) -> ApiResult<impl IntoResponse> {
    let now = Utc::now();
    let signed = SignedCredential {
        credential: req.credential,
        signature: req.signature,
    };
    state.issuer.validate(&signed, now)?;

    if signed.credential.student_id != req.student_id {
        return Err(ApiError::bad_request(
            "Credential does not belong to this student",
        ));
    }
    let public_key = signed.public_key()?;
    if !state.keys.validate_public_key(&public_key) {
        return Err(ApiError::bad_request(
            "Credential public key is not a valid group element",
        ));
    }

    state
        .db
        .upsert_registry_entry(&RegistryEntry::new(signed, now))?;
    state.metrics.credentials_registered_total.inc();
    tracing::info!(student_id = %req.student_id, "credential registered");

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Credential registered successfully",
    })))
}

/// `POST /request-challenge`: open a session bound to a registered student.
async fn request_challenge_handler(
    State(state): State<AppState>,
    Json(req): Json<ChallengeRequest>,
) -> ApiResult<Json<ChallengeResponse>> {
    if state.db.bound_public_key(&req.student_id)?.is_none() {
        return Err(ApiError::not_found("Student not registered"));
    }
    let session = state.sessions.issue_session(Some(&req.student_id))?;
    state.metrics.challenges_issued_total.inc();

    Ok(Json(ChallengeResponse {
        session_id: session.session_id,
        challenge: session.challenge.to_str_radix(10),
        expires_at: session.expires_at,
    }))
}

/// Verify `req.proof` against the session and settle it. Returns the verdict
/// together with the student's registry entry.
///
/// A dead session (missing, expired, used, or bound to someone else) is a 401.
fn settle_proof(state: &AppState, req: &ProofRequest) -> ApiResult<(bool, RegistryEntry)> {
    let entry = state
        .db
        .get_registry_entry(&req.student_id)?
        .ok_or_else(|| ApiError::not_found("Student not registered"))?;
    let public_key = entry
        .credential
        .public_key()
        .map_err(|_| ApiError::internal("Registered public key is corrupt"))?;
    let envelope = ProofEnvelope::from_json(&req.proof)?;

    let verdict =
        state
            .sessions
            .verify_with_session(&req.session_id, Some(&req.student_id), |challenge| {
                let _timer = state.metrics.verification_latency_seconds.start_timer();
                state
                    .verifier
                    .verify_envelope(&envelope, challenge, &public_key)
            })?;

    match verdict {
        SessionVerdict::Accepted => {
            state.metrics.proofs_accepted_total.inc();
            Ok((true, entry))
        }
        SessionVerdict::Rejected => {
            state.metrics.proofs_rejected_total.inc();
            Ok((false, entry))
        }
        SessionVerdict::Unavailable => {
            state.metrics.proofs_rejected_total.inc();
            Err(ApiError::unauthorized("Invalid or expired session"))
        }
    }
}

/// Run [`settle_proof`] on the blocking pool: it does sled I/O and two
/// 2048-bit exponentiations.
async fn settle_proof_blocking(
    state: AppState,
    req: Arc<ProofRequest>,
) -> ApiResult<(bool, RegistryEntry)> {
    tokio::task::spawn_blocking(move || settle_proof(&state, &req))
        .await
        .map_err(|e| ApiError::internal(format!("verification task failed: {e}")))?
}

/// `POST /verify-proof`: answer whether an interactive proof verifies.
async fn verify_proof_handler(
    State(state): State<AppState>,
    Json(req): Json<ProofRequest>,
) -> ApiResult<Json<VerifyResponse>> {
    let req = Arc::new(req);
    let (verified, _) = settle_proof_blocking(state, Arc::clone(&req)).await?;
    tracing::debug!(student_id = %req.student_id, verified, "interactive proof settled");
    Ok(Json(VerifyResponse::from_outcome(verified)))
}

/// `POST /check-eligibility`: verify, then decide. A failed proof still
/// yields a (DENY) decision.
async fn check_eligibility_handler(
    State(state): State<AppState>,
    Json(req): Json<ProofRequest>,
) -> ApiResult<Json<EligibilityResponse>> {
    let req = Arc::new(req);
    let (verified, entry) = settle_proof_blocking(state.clone(), Arc::clone(&req)).await?;
    let credential = &entry.credential.credential;

    let decision =
        state
            .eligibility
            .check_eligibility(&req.student_id, credential, verified, Utc::now());
    let criteria = req.criteria.as_ref().map(|criteria| {
        let (met, reasons) = state.eligibility.apply_custom_criteria(credential, criteria);
        CriteriaOutcome { met, reasons }
    });

    Ok(Json(EligibilityResponse { decision, criteria }))
}

/// `POST /verify-non-interactive`: check a Fiat-Shamir proof bound to
/// `message`. No session is involved.
async fn verify_non_interactive_handler(
    State(state): State<AppState>,
    Json(req): Json<NonInteractiveRequest>,
) -> ApiResult<Json<VerifyResponse>> {
    let public_key = state
        .db
        .bound_public_key(&req.student_id)?
        .ok_or_else(|| ApiError::not_found("Student not registered"))?;
    let envelope = ProofEnvelope::from_json(&req.proof)?;

    let verifier = Arc::clone(&state.verifier);
    let metrics = Arc::clone(&state.metrics);
    let verified = tokio::task::spawn_blocking(move || {
        let _timer = metrics.verification_latency_seconds.start_timer();
        verifier.verify_non_interactive_envelope(&envelope, &public_key, &req.message)
    })
    .await
    .map_err(|e| ApiError::internal(format!("verification task failed: {e}")))?;
    if verified {
        state.metrics.proofs_accepted_total.inc();
    } else {
        state.metrics.proofs_rejected_total.inc();
    }
    Ok(Json(VerifyResponse::from_outcome(verified)))
}

/// `GET /registry/:student_id`: the registered credential, or 404.
async fn registry_handler(
    Path(student_id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<RegistryEntry>> {
    state
        .db
        .get_registry_entry(&student_id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Student not found in registry"))
}

/// `GET /decisions`: decision history, optionally filtered by student.
async fn decisions_handler(
    Query(query): Query<DecisionQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let decisions = state
        .eligibility
        .decision_history(query.student_id.as_deref());
    Json(serde_json::json!({ "decisions": decisions }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
