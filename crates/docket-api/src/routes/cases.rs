//! # Case API
//!
//! Case intake, conversational fact updates, the generation trigger, and
//! the read views the client polls while documents are produced.
//!
//! Every route is scoped to the owner named in `X-Owner-Id`. A case that
//! exists but belongs to someone else answers 404, the same as a case that
//! does not exist.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

use docket_core::{CaseId, JobId, Timestamp};
use docket_pipeline::{CaseStatusView, TriggerOutcome};
use docket_routing::{
    CaseStrategy, EvidenceRef, GateResult, ProceduralStep, RoutingDecision, StepRecord,
    StrategyUpdate,
};
use docket_state::{BatchSummary, Case, CasePhase, CaseStatus, DocumentJob};

use crate::error::AppError;
use crate::extractors::{
    extract_json, extract_validated_json, owner_from_headers, FieldError, Validate,
};
use crate::state::AppState;

// ── DTOs ─────────────────────────────────────────────────────────────

/// A case with its current fact snapshot.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CaseResponse {
    pub id: Uuid,
    pub owner: Uuid,
    #[schema(value_type = String)]
    pub phase: CasePhase,
    #[schema(value_type = String)]
    pub status: CaseStatus,
    pub locked: bool,
    pub lock_reason: Option<String>,
    pub generation_attempt: u64,
    #[schema(value_type = String)]
    pub created_at: Timestamp,
    #[schema(value_type = String)]
    pub updated_at: Timestamp,
    #[schema(value_type = Object)]
    pub facts: CaseStrategy,
}

impl CaseResponse {
    fn new(case: &Case, facts: CaseStrategy) -> Self {
        Self {
            id: case.id.0,
            owner: case.owner.0,
            phase: case.phase(),
            status: case.status(),
            locked: case.is_locked(),
            lock_reason: case.lock_reason().map(str::to_string),
            generation_attempt: case.generation_attempt(),
            created_at: case.created_at,
            updated_at: case.updated_at,
            facts,
        }
    }
}

/// One conversational turn's extracted facts.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateStrategyRequest {
    pub domain: Option<String>,
    pub key_facts: Vec<String>,
    pub desired_outcome: Option<String>,
    #[schema(value_type = Vec<Object>)]
    pub evidence: Vec<EvidenceRef>,
    pub counterparty: Option<String>,
    pub jurisdiction: Option<String>,
    pub relationship: Option<String>,
    pub chosen_forum: Option<String>,
    pub incident_date: Option<NaiveDate>,
    pub claimed_amount: Option<u64>,
    #[schema(value_type = Object)]
    pub procedural_steps: BTreeMap<ProceduralStep, StepRecord>,
}

impl Validate for UpdateStrategyRequest {
    fn validate(&self) -> Result<(), FieldError> {
        if self.evidence.iter().any(|e| e.id.trim().is_empty()) {
            return Err(FieldError::new(
                "evidence",
                "evidence items must have a non-empty id",
            ));
        }
        if self.claimed_amount == Some(0) {
            return Err(FieldError::new(
                "claimed_amount",
                "claimed_amount must be greater than 0",
            ));
        }
        Ok(())
    }
}

impl From<UpdateStrategyRequest> for StrategyUpdate {
    fn from(req: UpdateStrategyRequest) -> Self {
        Self {
            domain: req.domain,
            key_facts: req.key_facts,
            desired_outcome: req.desired_outcome,
            evidence: req.evidence,
            counterparty: req.counterparty,
            jurisdiction: req.jurisdiction,
            relationship: req.relationship,
            chosen_forum: req.chosen_forum,
            incident_date: req.incident_date,
            claimed_amount: req.claimed_amount,
            procedural_steps: req.procedural_steps,
        }
    }
}

/// Answer to a generation trigger.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TriggerResponse {
    /// `accepted`, `already_in_progress` or `insufficient`.
    pub outcome: String,
    pub attempt: Option<u64>,
    #[schema(value_type = Option<String>)]
    pub phase: Option<CasePhase>,
    /// Questions to put to the user when facts are insufficient.
    pub missing: Vec<String>,
}

/// Phase, canonical message, and batch progress.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub case_id: Uuid,
    #[schema(value_type = String)]
    pub phase: CasePhase,
    #[schema(value_type = String)]
    pub status: CaseStatus,
    pub message: String,
    pub locked: bool,
    pub lock_reason: Option<String>,
    pub generation_attempt: u64,
    /// The gate that blocked the case, if any.
    pub gate: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub progress: Option<BatchSummary>,
    pub headline: Option<String>,
}

impl From<CaseStatusView> for StatusResponse {
    fn from(v: CaseStatusView) -> Self {
        Self {
            case_id: v.case_id.0,
            phase: v.phase,
            status: v.status,
            message: v.message,
            locked: v.locked,
            lock_reason: v.lock_reason,
            generation_attempt: v.generation_attempt,
            gate: v.gate.map(|g| g.as_str().to_string()),
            progress: v.progress,
            headline: v.headline,
        }
    }
}

/// The stored routing decision and the gate verdict on it.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DecisionResponse {
    #[schema(value_type = Object)]
    pub decision: RoutingDecision,
    #[schema(value_type = Option<Object>)]
    pub gate: Option<GateResult>,
}

/// Document jobs of the current batch, in ordinal order.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentsResponse {
    pub case_id: Uuid,
    #[schema(value_type = Option<Object>)]
    pub summary: Option<BatchSummary>,
    #[schema(value_type = Vec<Object>)]
    pub jobs: Vec<DocumentJob>,
}

/// One document job after a manual retry.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JobResponse {
    #[schema(value_type = Object)]
    pub job: DocumentJob,
}

/// Request to return a finished case to GATHERING. The body is optional;
/// when sent it must be valid JSON.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct ResetRequest {
    pub reason: Option<String>,
}

/// Request to move the user-facing status.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusTransitionRequest {
    #[schema(value_type = String)]
    pub to: CaseStatus,
}

// ── Router ───────────────────────────────────────────────────────────

/// Build the cases router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/cases", post(create_case))
        .route("/v1/cases/{id}", get(get_case))
        .route("/v1/cases/{id}/strategy", put(update_strategy))
        .route("/v1/cases/{id}/generation", post(trigger_generation))
        .route("/v1/cases/{id}/status", get(get_status))
        .route("/v1/cases/{id}/decision", get(get_decision))
        .route("/v1/cases/{id}/documents", get(list_documents))
        .route(
            "/v1/cases/{id}/documents/{job_id}/retry",
            post(retry_document),
        )
        .route("/v1/cases/{id}/reset", post(reset_case))
        .route("/v1/cases/{id}/status-transitions", post(transition_status))
}

/// Load a case, answering 404 when it is missing or owned by someone else.
fn owned_case(state: &AppState, headers: &HeaderMap, id: Uuid) -> Result<Case, AppError> {
    let owner = owner_from_headers(headers)?;
    let case_id = CaseId::from_uuid(id);
    match state.controller.case(&case_id) {
        Ok(case) if case.owner == owner => Ok(case),
        _ => Err(AppError::NotFound(format!("case {case_id} not found"))),
    }
}

// ── Handlers ─────────────────────────────────────────────────────────

/// POST /v1/cases: Open a case.
#[utoipa::path(
    post,
    path = "/v1/cases",
    params(("X-Owner-Id" = Uuid, Header, description = "Case owner")),
    responses(
        (status = 201, description = "Case opened in GATHERING / DRAFT", body = CaseResponse),
        (status = 401, description = "Missing owner", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub(crate) async fn create_case(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<CaseResponse>), AppError> {
    let owner = owner_from_headers(&headers)?;
    let case = state.controller.open_case(owner);
    Ok((
        StatusCode::CREATED,
        Json(CaseResponse::new(&case, CaseStrategy::default())),
    ))
}

/// GET /v1/cases/{id}: Case record and fact snapshot.
#[utoipa::path(
    get,
    path = "/v1/cases/{id}",
    params(
        ("id" = Uuid, Path, description = "Case ID"),
        ("X-Owner-Id" = Uuid, Header, description = "Case owner"),
    ),
    responses(
        (status = 200, description = "Case found", body = CaseResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub(crate) async fn get_case(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<CaseResponse>, AppError> {
    let case = owned_case(&state, &headers, id)?;
    let facts = state.controller.snapshot(&case.id).await?;
    Ok(Json(CaseResponse::new(&case, facts)))
}

/// PUT /v1/cases/{id}/strategy: Merge one turn's facts.
#[utoipa::path(
    put,
    path = "/v1/cases/{id}/strategy",
    params(
        ("id" = Uuid, Path, description = "Case ID"),
        ("X-Owner-Id" = Uuid, Header, description = "Case owner"),
    ),
    request_body = UpdateStrategyRequest,
    responses(
        (status = 200, description = "Facts merged", body = CaseResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Case is locked", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub(crate) async fn update_strategy(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateStrategyRequest>, JsonRejection>,
) -> Result<Json<CaseResponse>, AppError> {
    let case = owned_case(&state, &headers, id)?;
    let req = extract_validated_json(body)?;
    let facts = state.controller.update_facts(&case.id, req.into()).await?;
    let case = state.controller.case(&case.id)?;
    Ok(Json(CaseResponse::new(&case, facts)))
}

/// POST /v1/cases/{id}/generation: Fire-and-forget generation trigger.
#[utoipa::path(
    post,
    path = "/v1/cases/{id}/generation",
    params(
        ("id" = Uuid, Path, description = "Case ID"),
        ("X-Owner-Id" = Uuid, Header, description = "Case owner"),
    ),
    responses(
        (status = 202, description = "Generation accepted", body = TriggerResponse),
        (status = 200, description = "Already triggered; nothing queued", body = TriggerResponse),
        (status = 422, description = "Facts are insufficient", body = TriggerResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub(crate) async fn trigger_generation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<TriggerResponse>), AppError> {
    let case = owned_case(&state, &headers, id)?;
    let outcome = state.controller.start_generation(case.id).await?;
    let (status, body) = match outcome {
        TriggerOutcome::Accepted { attempt } => (
            StatusCode::ACCEPTED,
            TriggerResponse {
                outcome: "accepted".to_string(),
                attempt: Some(attempt),
                phase: Some(CasePhase::Routing),
                missing: Vec::new(),
            },
        ),
        TriggerOutcome::AlreadyInProgress { phase } => (
            StatusCode::OK,
            TriggerResponse {
                outcome: "already_in_progress".to_string(),
                attempt: None,
                phase: Some(phase),
                missing: Vec::new(),
            },
        ),
        TriggerOutcome::Insufficient { report } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            TriggerResponse {
                outcome: "insufficient".to_string(),
                attempt: None,
                phase: Some(CasePhase::Gathering),
                missing: report.missing.iter().map(|m| m.prompt()).collect(),
            },
        ),
    };
    Ok((status, Json(body)))
}

/// GET /v1/cases/{id}/status: Phase, message, and progress.
#[utoipa::path(
    get,
    path = "/v1/cases/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Case ID"),
        ("X-Owner-Id" = Uuid, Header, description = "Case owner"),
    ),
    responses(
        (status = 200, description = "Current status", body = StatusResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub(crate) async fn get_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusResponse>, AppError> {
    let case = owned_case(&state, &headers, id)?;
    Ok(Json(state.controller.status(&case.id)?.into()))
}

/// GET /v1/cases/{id}/decision: Stored routing decision.
#[utoipa::path(
    get,
    path = "/v1/cases/{id}/decision",
    params(
        ("id" = Uuid, Path, description = "Case ID"),
        ("X-Owner-Id" = Uuid, Header, description = "Case owner"),
    ),
    responses(
        (status = 200, description = "Decision found", body = DecisionResponse),
        (status = 404, description = "No decision yet", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub(crate) async fn get_decision(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<DecisionResponse>, AppError> {
    let case = owned_case(&state, &headers, id)?;
    let store = state.controller.store();
    let decision = store
        .decisions
        .get(&case.id)
        .ok_or_else(|| AppError::NotFound(format!("no routing decision for {}", case.id)))?;
    Ok(Json(DecisionResponse {
        decision,
        gate: store.gates.get(&case.id),
    }))
}

/// GET /v1/cases/{id}/documents: Jobs of the current batch.
#[utoipa::path(
    get,
    path = "/v1/cases/{id}/documents",
    params(
        ("id" = Uuid, Path, description = "Case ID"),
        ("X-Owner-Id" = Uuid, Header, description = "Case owner"),
    ),
    responses(
        (status = 200, description = "Document jobs", body = DocumentsResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub(crate) async fn list_documents(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentsResponse>, AppError> {
    let case = owned_case(&state, &headers, id)?;
    let jobs = state.controller.documents(&case.id)?;
    let summary = state.controller.status(&case.id)?.progress;
    Ok(Json(DocumentsResponse {
        case_id: case.id.0,
        summary,
        jobs,
    }))
}

/// POST /v1/cases/{id}/documents/{job_id}/retry: Retry one failed document.
#[utoipa::path(
    post,
    path = "/v1/cases/{id}/documents/{job_id}/retry",
    params(
        ("id" = Uuid, Path, description = "Case ID"),
        ("job_id" = Uuid, Path, description = "Document job ID"),
        ("X-Owner-Id" = Uuid, Header, description = "Case owner"),
    ),
    responses(
        (status = 200, description = "Retry finished; see job status", body = JobResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Not retryable", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub(crate) async fn retry_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, job_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<JobResponse>, AppError> {
    let case = owned_case(&state, &headers, id)?;
    let job = state
        .controller
        .retry_document(case.id, JobId::from_uuid(job_id))
        .await?;
    Ok(Json(JobResponse { job }))
}

/// POST /v1/cases/{id}/reset: Return a finished case to GATHERING.
#[utoipa::path(
    post,
    path = "/v1/cases/{id}/reset",
    params(
        ("id" = Uuid, Path, description = "Case ID"),
        ("X-Owner-Id" = Uuid, Header, description = "Case owner"),
    ),
    request_body = ResetRequest,
    responses(
        (status = 200, description = "Case reset", body = CaseResponse),
        (status = 400, description = "Malformed body", body = crate::error::ErrorBody),
        (status = 409, description = "Case is not COMPLETED or BLOCKED", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub(crate) async fn reset_case(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    body: Result<Json<ResetRequest>, JsonRejection>,
) -> Result<Json<CaseResponse>, AppError> {
    let case = owned_case(&state, &headers, id)?;
    let req = match body {
        Err(JsonRejection::MissingJsonContentType(_)) => ResetRequest::default(),
        other => extract_json(other)?,
    };
    let reason = req
        .reason
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| "reset by user".to_string());
    let case = state.controller.reset_to_gathering(case.id, reason)?;
    let facts = state.controller.snapshot(&case.id).await?;
    Ok(Json(CaseResponse::new(&case, facts)))
}

/// POST /v1/cases/{id}/status-transitions: Move the user-facing status.
#[utoipa::path(
    post,
    path = "/v1/cases/{id}/status-transitions",
    params(
        ("id" = Uuid, Path, description = "Case ID"),
        ("X-Owner-Id" = Uuid, Header, description = "Case owner"),
    ),
    request_body = StatusTransitionRequest,
    responses(
        (status = 200, description = "Status changed", body = CaseResponse),
        (status = 409, description = "Transition not allowed", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub(crate) async fn transition_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    body: Result<Json<StatusTransitionRequest>, JsonRejection>,
) -> Result<Json<CaseResponse>, AppError> {
    let case = owned_case(&state, &headers, id)?;
    let req = extract_json(body)?;
    let case = state.controller.set_status(case.id, req.to)?;
    let facts = state.controller.snapshot(&case.id).await?;
    Ok(Json(CaseResponse::new(&case, facts)))
}
