use async_trait::async_trait;
use chrono::{Datelike, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::audit::{record_best_effort, AuditLogger};
use crate::authorization::{Actor, Capability};
use crate::database::models::{
    Appointment, AppointmentStatus, CorporateOfficer, OfficerStatus, Resolution, ResolutionStatus,
    ResolutionType, VoteChoice,
};
use crate::database::queries::Queries;
use crate::database::Database;
use crate::error::GovernanceError;
use crate::governance::quorum::{Decision, QuorumRule};
use crate::governance::types::{NewResolution, VoteOutcome, VoteTally};
use crate::governance::votes::VoteLedger;

/// Runs the side effects of an adopted resolution.
#[async_trait]
pub trait ResolutionExecutor: Send + Sync {
    type Outcome: Serialize + Send;

    async fn execute_resolution(
        &self,
        resolution: &Resolution,
    ) -> Result<Self::Outcome, GovernanceError>;
}

#[derive(Debug, Serialize)]
pub struct ExecutedResolution<T> {
    pub resolution: Resolution,
    pub execution: T,
}

/// Owns resolution status. Every change is a conditional update recorded in
/// the status history, so a lost race surfaces as a StateError.
#[derive(Clone)]
pub struct ResolutionManager {
    database: Database,
    ledger: VoteLedger,
    quorum: Arc<dyn QuorumRule>,
    audit: Option<AuditLogger>,
}

impl ResolutionManager {
    pub fn new(
        database: Database,
        quorum: Arc<dyn QuorumRule>,
        audit: Option<AuditLogger>,
    ) -> Self {
        let ledger = VoteLedger::new(database.clone(), audit.clone());
        Self {
            database,
            ledger,
            quorum,
            audit,
        }
    }

    pub fn ledger(&self) -> &VoteLedger {
        &self.ledger
    }

    pub async fn get(&self, resolution_id: &str) -> Result<Resolution, GovernanceError> {
        Queries::get_resolution(self.database.pool(), resolution_id)
            .await?
            .ok_or_else(|| GovernanceError::resolution_not_found(resolution_id))
    }

    pub async fn create_resolution(
        &self,
        actor: &Actor,
        input: NewResolution,
    ) -> Result<Resolution, GovernanceError> {
        actor.require(Capability::ManageGovernance)?;

        if input.title.trim().is_empty() {
            return Err(GovernanceError::ValidationError(
                "Resolution title is required".to_string(),
            ));
        }

        let pool = self.database.pool();
        let now = Utc::now();
        let sequence_number = Queries::next_resolution_sequence(pool).await?;
        let metadata = if input.metadata.is_null() {
            serde_json::json!({})
        } else {
            input.metadata
        };

        let resolution = Resolution {
            id: uuid::Uuid::new_v4().to_string(),
            sequence_number,
            resolution_number: format!("RES-{}-{:03}", now.year(), sequence_number),
            title: input.title.trim().to_string(),
            description: input.description,
            resolution_type: input.resolution_type,
            status: ResolutionStatus::Draft,
            meeting_date: input.meeting_date,
            effective_date: input.effective_date,
            metadata,
            decided_by: None,
            decided_at: None,
            executed_at: None,
            created_at: now,
            updated_at: now,
        };

        Queries::insert_resolution(pool, &resolution).await?;
        info!("Created resolution {}", resolution.resolution_number);
        record_best_effort(
            self.audit.as_ref(),
            "resolution_created",
            &resolution.id,
            Some(&actor.user_id),
            serde_json::json!({
                "resolution_number": resolution.resolution_number,
                "resolution_type": resolution.resolution_type.as_str(),
            }),
        )
        .await;

        Ok(resolution)
    }

    pub async fn open_voting(
        &self,
        actor: &Actor,
        resolution_id: &str,
    ) -> Result<Resolution, GovernanceError> {
        actor.require(Capability::ManageGovernance)?;
        let resolution = self
            .transition(
                resolution_id,
                ResolutionStatus::Draft,
                ResolutionStatus::PendingVote,
                Some(&actor.user_id),
            )
            .await?;

        record_best_effort(
            self.audit.as_ref(),
            "resolution_opened",
            resolution_id,
            Some(&actor.user_id),
            serde_json::json!({}),
        )
        .await;
        Ok(resolution)
    }

    /// Casts the actor's vote, then lets the configured quorum rule decide.
    pub async fn record_vote(
        &self,
        actor: &Actor,
        resolution_id: &str,
        vote: VoteChoice,
        comment: Option<&str>,
    ) -> Result<VoteOutcome, GovernanceError> {
        actor.require(Capability::CastVote)?;
        let vote = self
            .ledger
            .cast_vote(resolution_id, &actor.user_id, vote, comment)
            .await?;
        let (tally, status) = self.evaluate_tally(resolution_id).await?;
        Ok(VoteOutcome { vote, tally, status })
    }

    /// Applies the quorum rule to a PENDING_VOTE resolution. Returns the
    /// current tally and the status afterwards.
    pub async fn evaluate_tally(
        &self,
        resolution_id: &str,
    ) -> Result<(VoteTally, ResolutionStatus), GovernanceError> {
        let resolution = self.get(resolution_id).await?;
        let tally = self.ledger.tally(resolution_id).await?;

        if resolution.status != ResolutionStatus::PendingVote {
            return Ok((tally, resolution.status));
        }

        let active = Queries::count_active_board_members(self.database.pool()).await?;
        let decision = self.quorum.decide(&tally, active.max(0) as u32);

        let (to, action) = match decision {
            Some(Decision::Adopt) => (ResolutionStatus::Adopted, "resolution_adopted"),
            Some(Decision::Reject) => (ResolutionStatus::Rejected, "resolution_rejected"),
            None => return Ok((tally, resolution.status)),
        };

        info!(
            "Quorum rule {} decided {} as {}",
            self.quorum.name(),
            resolution.resolution_number,
            to
        );
        let decided = self
            .decide(&resolution, to, Some(self.quorum.name()))
            .await?;
        record_best_effort(
            self.audit.as_ref(),
            action,
            resolution_id,
            None,
            serde_json::json!({"rule": self.quorum.name(), "tally": tally}),
        )
        .await;

        Ok((tally, decided.status))
    }

    /// Forces PENDING_VOTE -> ADOPTED regardless of the tally.
    pub async fn manual_adopt(
        &self,
        actor: &Actor,
        resolution_id: &str,
    ) -> Result<Resolution, GovernanceError> {
        self.manual_decision(actor, resolution_id, ResolutionStatus::Adopted)
            .await
    }

    /// Forces PENDING_VOTE -> REJECTED regardless of the tally.
    pub async fn manual_reject(
        &self,
        actor: &Actor,
        resolution_id: &str,
    ) -> Result<Resolution, GovernanceError> {
        self.manual_decision(actor, resolution_id, ResolutionStatus::Rejected)
            .await
    }

    async fn manual_decision(
        &self,
        actor: &Actor,
        resolution_id: &str,
        to: ResolutionStatus,
    ) -> Result<Resolution, GovernanceError> {
        actor.require(Capability::ManageGovernance)?;

        let resolution = self.get(resolution_id).await?;
        let tally = self.ledger.tally(resolution_id).await?;
        let decided = self.decide(&resolution, to, Some(&actor.user_id)).await?;

        let action = if to == ResolutionStatus::Adopted {
            "resolution_manually_adopted"
        } else {
            "resolution_manually_rejected"
        };
        warn!(
            "{} {} by manual override ({})",
            resolution.resolution_number, to, actor.user_id
        );
        record_best_effort(
            self.audit.as_ref(),
            action,
            resolution_id,
            Some(&actor.user_id),
            serde_json::json!({"tally_at_decision": tally}),
        )
        .await;

        Ok(decided)
    }

    /// Runs `executor` for an ADOPTED resolution and marks it EXECUTED.
    /// Any other status, or an execution already in flight, is a StateError
    /// before anything runs. If the executor fails the claim is released and
    /// the resolution stays ADOPTED so it may be re-run.
    pub async fn execute<E: ResolutionExecutor>(
        &self,
        actor: &Actor,
        resolution_id: &str,
        executor: &E,
    ) -> Result<ExecutedResolution<E::Outcome>, GovernanceError> {
        actor.require(Capability::ManageGovernance)?;

        let resolution = self.get(resolution_id).await?;
        if resolution.status != ResolutionStatus::Adopted {
            return Err(GovernanceError::StateError(format!(
                "Resolution {} is {}, only ADOPTED resolutions can be executed",
                resolution.resolution_number, resolution.status
            )));
        }

        let pool = self.database.pool();
        if !Queries::claim_execution(pool, resolution_id, Utc::now()).await? {
            let latest = self.get(resolution_id).await?;
            return Err(GovernanceError::StateError(format!(
                "Resolution {} is already being executed or is {}",
                latest.resolution_number, latest.status
            )));
        }

        info!("Executing resolution {}", resolution.resolution_number);
        let result = self.run_claimed(actor, &resolution, executor).await;
        if result.is_err() {
            if let Err(e) = Queries::release_execution(pool, resolution_id).await {
                warn!(
                    "Failed to release execution claim on {}: {}",
                    resolution.resolution_number, e
                );
            }
        }
        result
    }

    async fn run_claimed<E: ResolutionExecutor>(
        &self,
        actor: &Actor,
        resolution: &Resolution,
        executor: &E,
    ) -> Result<ExecutedResolution<E::Outcome>, GovernanceError> {
        let execution = executor.execute_resolution(resolution).await?;

        let executed = self
            .transition(
                &resolution.id,
                ResolutionStatus::Adopted,
                ResolutionStatus::Executed,
                Some(&actor.user_id),
            )
            .await?;
        self.move_linked_appointment(
            &executed,
            AppointmentStatus::Approved,
            AppointmentStatus::Executed,
        )
        .await?;

        let metadata = serde_json::to_value(&execution)?;
        record_best_effort(
            self.audit.as_ref(),
            "resolution_executed",
            &resolution.id,
            Some(&actor.user_id),
            metadata,
        )
        .await;

        Ok(ExecutedResolution {
            resolution: executed,
            execution,
        })
    }

    pub async fn history(
        &self,
        resolution_id: &str,
    ) -> Result<Vec<crate::database::models::StatusChange>, GovernanceError> {
        Queries::resolution_history(self.database.pool(), resolution_id).await
    }

    async fn decide(
        &self,
        resolution: &Resolution,
        to: ResolutionStatus,
        decided_by: Option<&str>,
    ) -> Result<Resolution, GovernanceError> {
        let decided = self
            .transition(&resolution.id, ResolutionStatus::PendingVote, to, decided_by)
            .await?;

        let appointment_status = if to == ResolutionStatus::Adopted {
            AppointmentStatus::Approved
        } else {
            AppointmentStatus::Rejected
        };
        self.move_linked_appointment(&decided, AppointmentStatus::SentToBoard, appointment_status)
            .await?;
        if to == ResolutionStatus::Adopted {
            self.register_officer(&decided, decided_by).await?;
        }

        Ok(decided)
    }

    /// Adds the appointee of an adopted EXECUTIVE_APPOINTMENT resolution to
    /// the officer registry. An ACTIVE officer with the same email is kept
    /// as is, and an appointment without an email is skipped.
    async fn register_officer(
        &self,
        resolution: &Resolution,
        decided_by: Option<&str>,
    ) -> Result<(), GovernanceError> {
        let Some(appointment) = self.linked_appointment(resolution).await? else {
            return Ok(());
        };
        let Some(email) = appointment
            .proposed_officer_email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
        else {
            return Ok(());
        };

        let term_end = appointment
            .term_length_months
            .filter(|months| *months > 0)
            .map(|months| appointment.effective_date + chrono::Duration::days(months * 30));
        let officer = CorporateOfficer {
            id: uuid::Uuid::new_v4().to_string(),
            full_name: appointment.proposed_officer_name.clone(),
            email: email.to_string(),
            title: appointment.proposed_title.clone(),
            appointed_by: Some(resolution.id.clone()),
            appointment_id: Some(appointment.id.clone()),
            effective_date: appointment.effective_date,
            term_end,
            status: OfficerStatus::Active,
            created_at: Utc::now(),
        };

        if !Queries::insert_officer_if_absent(self.database.pool(), &officer).await? {
            info!("{} is already an active officer", email);
            return Ok(());
        }

        info!("Officer {} appointed as {}", officer.full_name, officer.title);
        record_best_effort(
            self.audit.as_ref(),
            "officer_appointed",
            &appointment.id,
            decided_by,
            serde_json::json!({
                "resolution_id": resolution.id,
                "title": officer.title,
                "term_end": officer.term_end,
            }),
        )
        .await;
        Ok(())
    }

    async fn linked_appointment(
        &self,
        resolution: &Resolution,
    ) -> Result<Option<Appointment>, GovernanceError> {
        if resolution.resolution_type != ResolutionType::ExecutiveAppointment {
            return Ok(None);
        }

        let pool = self.database.pool();
        match resolution.appointment_id() {
            Some(id) => Queries::get_appointment(pool, id).await,
            None => Queries::get_appointment_by_resolution(pool, &resolution.id).await,
        }
    }

    async fn transition(
        &self,
        resolution_id: &str,
        from: ResolutionStatus,
        to: ResolutionStatus,
        actor: Option<&str>,
    ) -> Result<Resolution, GovernanceError> {
        let current = self.get(resolution_id).await?;
        if current.status != from || !from.can_transition_to(to) {
            return Err(GovernanceError::invalid_transition(
                &format!("Resolution {}", current.resolution_number),
                current.status.as_str(),
                to.as_str(),
            ));
        }

        let moved = Queries::transition_resolution(
            self.database.pool(),
            resolution_id,
            from,
            to,
            actor,
            Utc::now(),
        )
        .await?;

        if !moved {
            let latest = self.get(resolution_id).await?;
            return Err(GovernanceError::invalid_transition(
                &format!("Resolution {}", latest.resolution_number),
                latest.status.as_str(),
                to.as_str(),
            ));
        }

        info!("Resolution {} moved {} -> {}", current.resolution_number, from, to);
        self.get(resolution_id).await
    }

    /// Keeps the appointment behind an EXECUTIVE_APPOINTMENT resolution in
    /// step. An appointment in an unexpected status is left alone.
    async fn move_linked_appointment(
        &self,
        resolution: &Resolution,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<(), GovernanceError> {
        let Some(appointment) = self.linked_appointment(resolution).await? else {
            return Ok(());
        };

        let pool = self.database.pool();
        if Queries::transition_appointment(pool, &appointment.id, from, to, Utc::now()).await? {
            info!("Appointment {} moved {} -> {}", appointment.id, from, to);
        } else {
            warn!(
                "Appointment {} is {}, expected {}; status left unchanged",
                appointment.id, appointment.status, from
            );
        }
        Ok(())
    }
}
