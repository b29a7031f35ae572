//! Side effects of an adopted appointment resolution.
//!
//! Steps run in order: documents, account provisioning, document sync,
//! notification. Documents, provisioning and sync abort the run on failure
//! and leave the resolution ADOPTED for a re-run; every step tolerates
//! being repeated. Notification is best-effort and reported per step.

use async_trait::async_trait;
use rand::Rng;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::appointments::generator::DEFAULT_COMPANY_NAME;
use crate::appointments::pipeline::{DocumentPipeline, EnsureReport};
use crate::appointments::templates::escape_html;
use crate::database::models::{
    Appointment, DocumentType, LegacyDocument, OnboardingStatus, Resolution,
};
use crate::database::queries::Queries;
use crate::database::Database;
use crate::error::GovernanceError;
use crate::governance::ResolutionExecutor;
use crate::services::{EmailMessage, IdentityService, Notifier, UserAccount};

const PASSWORD_ALPHABET: &[u8] =
    b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnpqrstuvwxyz23456789!@#$%&*";
const PASSWORD_LENGTH: usize = 16;

pub fn generate_temporary_password() -> String {
    let mut rng = rand::thread_rng();
    (0..PASSWORD_LENGTH)
        .map(|_| PASSWORD_ALPHABET[rng.gen_range(0..PASSWORD_ALPHABET.len())] as char)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStep {
    Documents,
    AccountProvisioning,
    DocumentSync,
    Notification,
    OnboardingStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Completed { detail: String },
    /// The step went on past failures of individual items.
    Partial { detail: String, errors: Vec<String> },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    pub step: ExecutionStep,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

impl StepReport {
    fn completed(step: ExecutionStep, detail: impl Into<String>) -> Self {
        Self {
            step,
            outcome: StepOutcome::Completed {
                detail: detail.into(),
            },
        }
    }

    fn failed(step: ExecutionStep, error: impl ToString) -> Self {
        Self {
            step,
            outcome: StepOutcome::Failed {
                error: error.to_string(),
            },
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, StepOutcome::Completed { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionSummary {
    pub appointment_id: String,
    pub executive_name: String,
    pub executive_email: String,
    pub user_id: String,
    pub user_created: bool,
    pub documents_synced: usize,
    pub email_sent: bool,
    pub documents: EnsureReport,
    pub steps: Vec<StepReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LegacyExecutionSummary {
    pub legacy_appointment_id: String,
    pub executive_name: String,
    pub executive_email: String,
    pub document_ids: Vec<String>,
    pub email_sent: bool,
    pub steps: Vec<StepReport>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    Appointment(ExecutionSummary),
    Legacy(LegacyExecutionSummary),
    NoLinkedAppointment,
}

pub struct ExecutionOrchestrator {
    database: Database,
    pipeline: DocumentPipeline,
    identity: Arc<dyn IdentityService>,
    notifier: Arc<dyn Notifier>,
    portal_url: String,
    call_timeout: Duration,
}

impl ExecutionOrchestrator {
    pub fn new(
        database: Database,
        pipeline: DocumentPipeline,
        identity: Arc<dyn IdentityService>,
        notifier: Arc<dyn Notifier>,
        portal_url: String,
        call_timeout: Duration,
    ) -> Self {
        Self {
            database,
            pipeline,
            identity,
            notifier,
            portal_url,
            call_timeout,
        }
    }

    async fn bounded<T, F>(&self, what: &str, call: F) -> Result<T, GovernanceError>
    where
        F: Future<Output = Result<T, GovernanceError>>,
    {
        tokio::time::timeout(self.call_timeout, call)
            .await
            .map_err(|_| {
                GovernanceError::ExternalServiceError(format!(
                    "{} timed out after {}s",
                    what,
                    self.call_timeout.as_secs()
                ))
            })?
    }

    async fn company_name(&self) -> Result<String, GovernanceError> {
        let settings = Queries::company_settings(self.database.pool()).await?;
        Ok(settings
            .get("company_name")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_COMPANY_NAME.to_string()))
    }

    /// Finds the account for `email` or creates one. Returns the account,
    /// whether it was created, and the temporary password if so.
    async fn provision_account(
        &self,
        email: &str,
        full_name: &str,
    ) -> Result<(UserAccount, Option<String>), GovernanceError> {
        if let Some(account) = self
            .bounded("account lookup", self.identity.find_by_email(email))
            .await?
        {
            info!("Reusing account {} for {}", account.id, email);
            return Ok((account, None));
        }

        let password = generate_temporary_password();
        let account = self
            .bounded(
                "account creation",
                self.identity.create_user(email, &password, full_name),
            )
            .await?;
        Ok((account, Some(password)))
    }

    async fn notify(&self, message: EmailMessage) -> StepReport {
        match self.bounded("email", self.notifier.send(&message)).await {
            Ok(id) => StepReport::completed(ExecutionStep::Notification, format!("sent {}", id)),
            Err(e) => {
                error!("Failed to notify {}: {}", message.to, e);
                StepReport::failed(ExecutionStep::Notification, e)
            }
        }
    }

    async fn execute_appointment(
        &self,
        appointment: Appointment,
    ) -> Result<ExecutionSummary, GovernanceError> {
        let email = appointment
            .proposed_officer_email
            .clone()
            .ok_or_else(|| {
                GovernanceError::ValidationError(format!(
                    "Appointment {} has no officer email",
                    appointment.id
                ))
            })?;
        let mut steps = Vec::new();

        let documents = self.pipeline.ensure_documents(&appointment.id, false).await?;
        steps.push(documents_step(&documents));

        let (account, temporary_password) = self
            .provision_account(&email, &appointment.proposed_officer_name)
            .await?;
        let user_created = temporary_password.is_some();
        steps.push(StepReport::completed(
            ExecutionStep::AccountProvisioning,
            if user_created { "created" } else { "existing account reused" },
        ));

        // Reload: ensure_documents has written new URLs.
        let appointment = Queries::get_appointment(self.database.pool(), &appointment.id)
            .await?
            .ok_or_else(|| GovernanceError::appointment_not_found(&appointment.id))?;

        let mut documents_synced = 0;
        for (document_type, url) in appointment.document_urls.iter() {
            Queries::upsert_document_record(
                self.database.pool(),
                &appointment.id,
                document_type,
                url,
            )
            .await?;
            documents_synced += 1;
        }
        steps.push(StepReport::completed(
            ExecutionStep::DocumentSync,
            format!("{} documents", documents_synced),
        ));

        let company = self.company_name().await?;
        let links: Vec<(DocumentType, String)> = appointment
            .document_urls
            .iter()
            .map(|(t, u)| (t, u.to_string()))
            .collect();
        let message = EmailMessage {
            to: email.clone(),
            subject: format!("Your appointment documents - {}", company),
            html: appointment_email_html(
                &appointment,
                &company,
                &links,
                &self.portal_url,
                temporary_password.as_deref(),
            ),
        };
        let notification = self.notify(message).await;
        let email_sent = notification.is_completed();
        steps.push(notification);

        info!(
            "Executed appointment {}: user_created={}, documents_synced={}, email_sent={}",
            appointment.id, user_created, documents_synced, email_sent
        );

        Ok(ExecutionSummary {
            appointment_id: appointment.id,
            executive_name: appointment.proposed_officer_name,
            executive_email: email,
            user_id: account.id,
            user_created,
            documents_synced,
            email_sent,
            documents,
            steps,
        })
    }

    async fn execute_legacy(
        &self,
        legacy_id: &str,
    ) -> Result<LegacyExecutionSummary, GovernanceError> {
        let pool = self.database.pool();
        let legacy = Queries::get_legacy_appointment(pool, legacy_id)
            .await?
            .ok_or_else(|| {
                GovernanceError::NotFound(format!("Legacy appointment {} not found", legacy_id))
            })?;

        let documents = Queries::list_legacy_documents(pool, legacy_id).await?;
        if documents.is_empty() {
            return Err(GovernanceError::StateError(format!(
                "Legacy appointment {} has no generated documents",
                legacy_id
            )));
        }
        let mut steps = Vec::new();

        Queries::set_onboarding_status(pool, legacy_id, OnboardingStatus::DocumentsSent).await?;
        steps.push(StepReport::completed(
            ExecutionStep::OnboardingStatus,
            OnboardingStatus::DocumentsSent.as_str(),
        ));

        let company = self.company_name().await?;
        let message = EmailMessage {
            to: legacy.officer_email.clone(),
            subject: format!("Your appointment documents - {}", company),
            html: legacy_email_html(&legacy.officer_name, &company, &documents, &self.portal_url),
        };
        let notification = self.notify(message).await;
        let email_sent = notification.is_completed();
        steps.push(notification);

        Ok(LegacyExecutionSummary {
            legacy_appointment_id: legacy.id,
            executive_name: legacy.officer_name,
            executive_email: legacy.officer_email,
            document_ids: documents.into_iter().map(|d| d.id).collect(),
            email_sent,
            steps,
        })
    }
}

#[async_trait]
impl ResolutionExecutor for ExecutionOrchestrator {
    type Outcome = ExecutionOutcome;

    async fn execute_resolution(
        &self,
        resolution: &Resolution,
    ) -> Result<ExecutionOutcome, GovernanceError> {
        let pool = self.database.pool();

        let appointment = match resolution.appointment_id() {
            Some(id) => Some(
                Queries::get_appointment(pool, id)
                    .await?
                    .ok_or_else(|| GovernanceError::appointment_not_found(id))?,
            ),
            None => Queries::get_appointment_by_resolution(pool, &resolution.id).await?,
        };

        if let Some(appointment) = appointment {
            return Ok(ExecutionOutcome::Appointment(
                self.execute_appointment(appointment).await?,
            ));
        }

        if let Some(legacy_id) = resolution.legacy_appointment_id() {
            info!(
                "Resolution {} uses legacy appointment {}",
                resolution.resolution_number, legacy_id
            );
            return Ok(ExecutionOutcome::Legacy(self.execute_legacy(legacy_id).await?));
        }

        warn!(
            "Resolution {} references no appointment; nothing to execute",
            resolution.resolution_number
        );
        Ok(ExecutionOutcome::NoLinkedAppointment)
    }
}

fn documents_step(report: &EnsureReport) -> StepReport {
    let detail = format!(
        "{} generated, {} failed",
        report.documents_generated.len(),
        report.error_count()
    );
    match report.errors.as_deref() {
        Some(errors) if !errors.is_empty() => StepReport {
            step: ExecutionStep::Documents,
            outcome: StepOutcome::Partial {
                detail,
                errors: errors.iter().map(ToString::to_string).collect(),
            },
        },
        _ => StepReport::completed(ExecutionStep::Documents, detail),
    }
}

fn appointment_email_html(
    appointment: &Appointment,
    company: &str,
    links: &[(DocumentType, String)],
    portal_url: &str,
    temporary_password: Option<&str>,
) -> String {
    let items: String = links
        .iter()
        .map(|(t, url)| {
            format!(
                r#"<li><a href="{}">{}</a></li>"#,
                escape_html(url),
                escape_html(t.display_name())
            )
        })
        .collect();

    let credentials = match temporary_password {
        Some(password) => format!(
            "<p>An account has been created for you. Sign in with <strong>{}</strong> and the temporary password <code>{}</code>, then change it.</p>",
            escape_html(appointment.proposed_officer_email.as_deref().unwrap_or("")),
            escape_html(password)
        ),
        None => "<p>Sign in with your existing account to review and sign.</p>".to_string(),
    };

    format!(
        r#"<h2>Welcome to {company}</h2>
<p>Dear {name},</p>
<p>The Board of Directors has approved your appointment as {title}. Your appointment documents are ready:</p>
<ul>{items}</ul>
{credentials}
<p><a href="{portal}">Open the executive portal</a></p>"#,
        company = escape_html(company),
        name = escape_html(&appointment.proposed_officer_name),
        title = escape_html(&appointment.proposed_title),
        items = items,
        credentials = credentials,
        portal = escape_html(portal_url),
    )
}

fn legacy_email_html(
    name: &str,
    company: &str,
    documents: &[LegacyDocument],
    portal_url: &str,
) -> String {
    let items: String = documents
        .iter()
        .map(|d| match &d.file_url {
            Some(url) => format!(
                r#"<li><a href="{}">{}</a> ({})</li>"#,
                escape_html(url),
                escape_html(&d.title),
                d.id
            ),
            None => format!("<li>{} ({})</li>", escape_html(&d.title), d.id),
        })
        .collect();

    format!(
        r#"<h2>{company}</h2>
<p>Dear {name},</p>
<p>Your onboarding documents are ready for signature:</p>
<ul>{items}</ul>
<p><a href="{portal}">Open the executive portal</a></p>"#,
        company = escape_html(company),
        name = escape_html(name),
        items = items,
        portal = escape_html(portal_url),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary_password_shape() {
        let password = generate_temporary_password();
        assert_eq!(password.len(), PASSWORD_LENGTH);
        assert!(password.bytes().all(|b| PASSWORD_ALPHABET.contains(&b)));
        assert_ne!(password, generate_temporary_password());
    }

    #[test]
    fn test_step_report_serialization() {
        let report = StepReport::failed(ExecutionStep::Notification, "smtp down");
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"step": "notification", "status": "failed", "error": "smtp down"})
        );
    }
}
