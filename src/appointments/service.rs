use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::audit::{record_best_effort, AuditLogger};
use crate::authorization::{Actor, Capability};
use crate::database::models::{
    Appointment, AppointmentStatus, DocumentRecord, DocumentType, DocumentUrls, Resolution,
    ResolutionType,
};
use crate::database::queries::Queries;
use crate::database::Database;
use crate::error::GovernanceError;
use crate::governance::{NewResolution, ResolutionManager};

#[derive(Debug, Clone, Deserialize)]
pub struct NewAppointment {
    pub proposed_officer_name: String,
    #[serde(default)]
    pub proposed_officer_email: Option<String>,
    pub proposed_title: String,
    #[serde(default)]
    pub appointment_type: Option<String>,
    #[serde(default)]
    pub board_meeting_date: Option<NaiveDate>,
    pub effective_date: NaiveDate,
    #[serde(default)]
    pub term_length_months: Option<i64>,
    #[serde(default)]
    pub authority_granted: Option<String>,
    #[serde(default)]
    pub compensation_structure: Option<String>,
    #[serde(default)]
    pub equity_included: bool,
    #[serde(default)]
    pub equity_details: Option<String>,
    #[serde(default)]
    pub formation_mode: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Proposal {
    pub appointment: Appointment,
    pub resolution: Resolution,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Creates appointments and routes them to the board.
#[derive(Clone)]
pub struct AppointmentService {
    database: Database,
    resolutions: ResolutionManager,
    audit: Option<AuditLogger>,
}

impl AppointmentService {
    pub fn new(
        database: Database,
        resolutions: ResolutionManager,
        audit: Option<AuditLogger>,
    ) -> Self {
        Self {
            database,
            resolutions,
            audit,
        }
    }

    pub async fn get(&self, appointment_id: &str) -> Result<Appointment, GovernanceError> {
        Queries::get_appointment(self.database.pool(), appointment_id)
            .await?
            .ok_or_else(|| GovernanceError::appointment_not_found(appointment_id))
    }

    pub async fn create_appointment(
        &self,
        actor: &Actor,
        input: NewAppointment,
    ) -> Result<Appointment, GovernanceError> {
        actor.require(Capability::ManageGovernance)?;

        let name = input.proposed_officer_name.trim();
        let title = input.proposed_title.trim();
        if name.is_empty() {
            return Err(GovernanceError::ValidationError(
                "proposed_officer_name is required".to_string(),
            ));
        }
        if title.is_empty() {
            return Err(GovernanceError::ValidationError(
                "proposed_title is required".to_string(),
            ));
        }
        let email = non_blank(input.proposed_officer_email);
        if let Some(email) = &email {
            if !email.contains('@') {
                return Err(GovernanceError::ValidationError(format!(
                    "Invalid officer email: {}",
                    email
                )));
            }
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: uuid::Uuid::new_v4().to_string(),
            proposed_officer_name: name.to_string(),
            proposed_officer_email: email,
            proposed_title: title.to_string(),
            appointment_type: non_blank(input.appointment_type)
                .unwrap_or_else(|| "NEW".to_string()),
            board_meeting_date: input.board_meeting_date,
            effective_date: input.effective_date,
            term_length_months: input.term_length_months,
            authority_granted: non_blank(input.authority_granted),
            compensation_structure: non_blank(input.compensation_structure),
            equity_included: input.equity_included,
            equity_details: non_blank(input.equity_details),
            formation_mode: non_blank(input.formation_mode),
            notes: non_blank(input.notes),
            status: AppointmentStatus::Draft,
            board_resolution_id: None,
            document_urls: DocumentUrls::default(),
            approved_at: None,
            created_by: Some(actor.user_id.clone()),
            created_at: now,
            updated_at: now,
        };

        Queries::insert_appointment(self.database.pool(), &appointment).await?;
        info!(
            "Created appointment {} ({} as {})",
            appointment.id, appointment.proposed_officer_name, appointment.proposed_title
        );
        record_best_effort(
            self.audit.as_ref(),
            "appointment_created",
            &appointment.id,
            Some(&actor.user_id),
            serde_json::json!({
                "officer_name": appointment.proposed_officer_name,
                "title": appointment.proposed_title,
            }),
        )
        .await;

        Ok(appointment)
    }

    /// Creates the linked EXECUTIVE_APPOINTMENT resolution, opens it for
    /// voting and moves the appointment to SENT_TO_BOARD.
    pub async fn send_to_board(
        &self,
        actor: &Actor,
        appointment_id: &str,
    ) -> Result<Proposal, GovernanceError> {
        actor.require(Capability::ManageGovernance)?;

        let appointment = self.get(appointment_id).await?;
        if appointment.status != AppointmentStatus::Draft {
            return Err(GovernanceError::invalid_transition(
                &format!("Appointment {}", appointment.id),
                appointment.status.as_str(),
                AppointmentStatus::SentToBoard.as_str(),
            ));
        }

        let resolution = self
            .resolutions
            .create_resolution(
                actor,
                NewResolution {
                    title: format!(
                        "Appointment of {} as {}",
                        appointment.proposed_officer_name, appointment.proposed_title
                    ),
                    description: format!(
                        "RESOLVED, that {} is hereby appointed to the office of {}, effective {}.",
                        appointment.proposed_officer_name,
                        appointment.proposed_title,
                        appointment.effective_date.format("%B %-d, %Y")
                    ),
                    resolution_type: ResolutionType::ExecutiveAppointment,
                    meeting_date: appointment.board_meeting_date,
                    effective_date: Some(appointment.effective_date),
                    metadata: serde_json::json!({
                        "appointment_id": appointment.id,
                        "title": appointment.proposed_title,
                        "officer_name": appointment.proposed_officer_name,
                    }),
                },
            )
            .await?;

        let pool = self.database.pool();
        Queries::link_resolution(pool, &appointment.id, &resolution.id).await?;
        let resolution = self.resolutions.open_voting(actor, &resolution.id).await?;

        if !Queries::transition_appointment(
            pool,
            &appointment.id,
            AppointmentStatus::Draft,
            AppointmentStatus::SentToBoard,
            Utc::now(),
        )
        .await?
        {
            return Err(GovernanceError::StateError(format!(
                "Appointment {} changed while being sent to the board",
                appointment.id
            )));
        }

        info!(
            "Appointment {} sent to board as {}",
            appointment.id, resolution.resolution_number
        );
        Ok(Proposal {
            appointment: self.get(&appointment.id).await?,
            resolution,
        })
    }

    pub async fn propose_appointment(
        &self,
        actor: &Actor,
        input: NewAppointment,
    ) -> Result<Proposal, GovernanceError> {
        let appointment = self.create_appointment(actor, input).await?;
        self.send_to_board(actor, &appointment.id).await
    }

    /// Marks one document signed. Only generated documents can be signed.
    pub async fn record_signature(
        &self,
        actor: &Actor,
        appointment_id: &str,
        document_type: DocumentType,
        signed_url: &str,
    ) -> Result<DocumentRecord, GovernanceError> {
        actor.require(Capability::GenerateDocuments)?;

        let signed_url = signed_url.trim();
        if signed_url.is_empty() {
            return Err(GovernanceError::ValidationError(
                "signed_url is required".to_string(),
            ));
        }

        let appointment = self.get(appointment_id).await?;
        let file_url = appointment.document_urls.get(document_type).ok_or_else(|| {
            GovernanceError::StateError(format!(
                "{} has not been generated for appointment {}",
                document_type, appointment_id
            ))
        })?;

        let record = Queries::mark_document_signed(
            self.database.pool(),
            appointment_id,
            document_type,
            file_url,
            signed_url,
        )
        .await?;

        info!("{} signed for appointment {}", document_type, appointment_id);
        record_best_effort(
            self.audit.as_ref(),
            "document_signed",
            appointment_id,
            Some(&actor.user_id),
            serde_json::json!({"document_type": document_type.as_str()}),
        )
        .await;
        Ok(record)
    }
}
