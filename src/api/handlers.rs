use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::auth::AuthActor;
use crate::api::response::{ApiResponse, ApiResult};
use crate::api::AppState;
use crate::appointments::{
    BackfillReport, BankingPacket, ExecutionOutcome, GeneratedDocument, NewAppointment, Proposal,
};
use crate::authorization::Capability;
use crate::database::models::{
    Appointment, DocumentRecord, DocumentType, Resolution, StatusChange, VoteChoice,
};
use crate::error::GovernanceError;
use crate::governance::{ExecutedResolution, VoteOutcome, VoteTally};

type Body<T> = Result<Json<T>, JsonRejection>;

fn parse_document_type(raw: &str) -> Result<DocumentType, GovernanceError> {
    DocumentType::from_str(raw.trim()).ok_or_else(|| {
        GovernanceError::ValidationError(format!("Unknown document type: {}", raw))
    })
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "board-governance",
        "timestamp": chrono::Utc::now()
    }))
}

// Appointments

pub async fn propose_appointment(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    body: Body<NewAppointment>,
) -> ApiResult<Proposal> {
    let Json(input) = body?;
    let proposal = state.appointments.propose_appointment(&actor, input).await?;
    Ok(ApiResponse(proposal))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    AuthActor(_actor): AuthActor,
    Path(id): Path<String>,
) -> ApiResult<Appointment> {
    Ok(ApiResponse(state.appointments.get(&id).await?))
}

#[derive(Debug, Deserialize)]
pub struct GenerateDocumentRequest {
    pub document_type: String,
}

pub async fn generate_document(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(id): Path<String>,
    body: Body<GenerateDocumentRequest>,
) -> ApiResult<GeneratedDocument> {
    let Json(request) = body?;
    actor.require(Capability::GenerateDocuments)?;
    let document_type = parse_document_type(&request.document_type)?;

    let generated = state.pipeline.generate_one(&id, document_type).await?;
    Ok(ApiResponse(generated))
}

#[derive(Debug, Deserialize)]
pub struct SignatureRequest {
    pub document_type: String,
    pub signed_url: String,
}

pub async fn record_signature(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(id): Path<String>,
    body: Body<SignatureRequest>,
) -> ApiResult<DocumentRecord> {
    let Json(request) = body?;
    let document_type = parse_document_type(&request.document_type)?;

    let record = state
        .appointments
        .record_signature(&actor, &id, document_type, &request.signed_url)
        .await?;
    Ok(ApiResponse(record))
}

pub async fn generate_banking_packet(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(id): Path<String>,
) -> ApiResult<BankingPacket> {
    Ok(ApiResponse(state.banking.generate_banking_packet(&actor, &id).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct BackfillRequest {
    #[serde(default)]
    pub appointment_id: Option<String>,
    #[serde(default)]
    pub force_regenerate: bool,
}

pub async fn backfill_documents(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    body: Body<BackfillRequest>,
) -> ApiResult<BackfillReport> {
    let Json(request) = body?;
    actor.require(Capability::GenerateDocuments)?;

    let appointment_id = request
        .appointment_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());
    info!(
        "Backfill requested by {} for {} (force={})",
        actor.user_id,
        appointment_id.unwrap_or("all appointments"),
        request.force_regenerate
    );

    let report = state
        .pipeline
        .backfill(appointment_id, request.force_regenerate)
        .await?;
    Ok(ApiResponse(report))
}

// Resolutions

#[derive(Debug, Serialize)]
pub struct ResolutionView {
    pub resolution: Resolution,
    pub tally: VoteTally,
    pub history: Vec<StatusChange>,
}

pub async fn get_resolution(
    State(state): State<AppState>,
    AuthActor(_actor): AuthActor,
    Path(id): Path<String>,
) -> ApiResult<ResolutionView> {
    let resolution = state.resolutions.get(&id).await?;
    let tally = state.resolutions.ledger().tally(&id).await?;
    let history = state.resolutions.history(&id).await?;
    Ok(ApiResponse(ResolutionView {
        resolution,
        tally,
        history,
    }))
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub vote: String,
    #[serde(default)]
    pub comment: Option<String>,
}

pub async fn cast_vote(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(id): Path<String>,
    body: Body<VoteRequest>,
) -> ApiResult<VoteOutcome> {
    let Json(request) = body?;
    let vote = VoteChoice::from_str(&request.vote).ok_or_else(|| {
        GovernanceError::ValidationError(format!(
            "Vote must be YES, NO or ABSTAIN, got {}",
            request.vote
        ))
    })?;

    let outcome = state
        .resolutions
        .record_vote(&actor, &id, vote, request.comment.as_deref())
        .await?;
    Ok(ApiResponse(outcome))
}

pub async fn tally(
    State(state): State<AppState>,
    AuthActor(_actor): AuthActor,
    Path(id): Path<String>,
) -> ApiResult<VoteTally> {
    state.resolutions.get(&id).await?;
    Ok(ApiResponse(state.resolutions.ledger().tally(&id).await?))
}

pub async fn manual_adopt(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(id): Path<String>,
) -> ApiResult<Resolution> {
    Ok(ApiResponse(state.resolutions.manual_adopt(&actor, &id).await?))
}

pub async fn manual_reject(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(id): Path<String>,
) -> ApiResult<Resolution> {
    Ok(ApiResponse(state.resolutions.manual_reject(&actor, &id).await?))
}

pub async fn execute_resolution(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(id): Path<String>,
) -> ApiResult<ExecutedResolution<ExecutionOutcome>> {
    let executed = state
        .resolutions
        .execute(&actor, &id, state.orchestrator.as_ref())
        .await?;
    Ok(ApiResponse(executed))
}
