//! Drives the document generator over an appointment's required set.
//!
//! Each generator call is isolated and bounded by a timeout. One failing
//! type is recorded in the report and never stops the others.

use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::appointments::generator::DocumentGenerator;
use crate::appointments::rules::required_documents;
use crate::database::models::{Appointment, AppointmentStatus, DocumentType};
use crate::database::queries::Queries;
use crate::database::Database;
use crate::error::GovernanceError;

/// A generation failure attributed to its document type.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentFailure {
    pub document_type: DocumentType,
    pub message: String,
}

impl fmt::Display for DocumentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.document_type, self.message)
    }
}

impl Serialize for DocumentFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnsureReport {
    pub appointment_id: String,
    pub appointment_name: String,
    pub status: AppointmentStatus,
    pub documents_generated: Vec<DocumentType>,
    pub documents_queued: Vec<DocumentType>,
    pub errors: Option<Vec<DocumentFailure>>,
    pub reason_no_docs: Option<String>,
}

impl EnsureReport {
    pub fn error_count(&self) -> usize {
        self.errors.as_ref().map_or(0, Vec::len)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BackfillReport {
    pub processed: usize,
    pub documents_generated: usize,
    pub errors_count: usize,
    pub all_errors: Vec<String>,
    pub results: Vec<EnsureReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedDocument {
    pub appointment_id: String,
    pub document_type: DocumentType,
    pub url: String,
}

#[derive(Clone)]
pub struct DocumentPipeline {
    database: Database,
    generator: Arc<dyn DocumentGenerator>,
    call_timeout: Duration,
}

impl DocumentPipeline {
    pub fn new(
        database: Database,
        generator: Arc<dyn DocumentGenerator>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            database,
            generator,
            call_timeout,
        }
    }

    async fn load(&self, appointment_id: &str) -> Result<Appointment, GovernanceError> {
        Queries::get_appointment(self.database.pool(), appointment_id)
            .await?
            .ok_or_else(|| GovernanceError::appointment_not_found(appointment_id))
    }

    /// One bounded generator call; the URL is persisted on success.
    async fn run_generator(
        &self,
        appointment: &Appointment,
        document_type: DocumentType,
    ) -> Result<String, GovernanceError> {
        let url = match tokio::time::timeout(
            self.call_timeout,
            self.generator.generate(appointment, document_type),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(GovernanceError::ExternalServiceError(format!(
                    "timed out after {}s",
                    self.call_timeout.as_secs()
                )))
            }
        };

        if url.trim().is_empty() {
            return Err(GovernanceError::ExternalServiceError(
                "generator returned an empty URL".to_string(),
            ));
        }

        Queries::set_document_url(self.database.pool(), &appointment.id, document_type, Some(&url))
            .await?;
        Ok(url)
    }

    /// Generates a single document on request, replacing any existing one.
    pub async fn generate_one(
        &self,
        appointment_id: &str,
        document_type: DocumentType,
    ) -> Result<GeneratedDocument, GovernanceError> {
        let appointment = self.load(appointment_id).await?;
        let url = self.run_generator(&appointment, document_type).await?;
        info!("Generated {} for appointment {}", document_type, appointment_id);

        Ok(GeneratedDocument {
            appointment_id: appointment_id.to_string(),
            document_type,
            url,
        })
    }

    /// Generates whichever required documents are missing, or all of them
    /// when `force_regenerate` is set.
    pub async fn ensure_documents(
        &self,
        appointment_id: &str,
        force_regenerate: bool,
    ) -> Result<EnsureReport, GovernanceError> {
        let appointment = self.load(appointment_id).await?;
        let required = required_documents(&appointment);

        let queued: Vec<DocumentType> = required
            .iter()
            .copied()
            .filter(|t| force_regenerate || !appointment.document_urls.has(*t))
            .collect();

        let reason_no_docs = if required.is_empty() {
            Some(format!("no documents required for status {}", appointment.status))
        } else if queued.is_empty() {
            Some("all required documents already exist".to_string())
        } else {
            None
        };

        let mut generated = Vec::new();
        let mut failures = Vec::new();
        for document_type in &queued {
            match self.run_generator(&appointment, *document_type).await {
                Ok(_) => generated.push(*document_type),
                Err(e) => {
                    warn!(
                        "Failed to generate {} for appointment {}: {}",
                        document_type, appointment.id, e
                    );
                    failures.push(DocumentFailure {
                        document_type: *document_type,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Appointment {}: {} queued, {} generated, {} failed",
            appointment.id,
            queued.len(),
            generated.len(),
            failures.len()
        );

        Ok(EnsureReport {
            appointment_id: appointment.id,
            appointment_name: appointment.proposed_officer_name,
            status: appointment.status,
            documents_generated: generated,
            documents_queued: queued,
            errors: if failures.is_empty() { None } else { Some(failures) },
            reason_no_docs,
        })
    }

    /// Runs [`ensure_documents`](Self::ensure_documents) for one appointment,
    /// or for every stored appointment when `appointment_id` is `None`.
    pub async fn backfill(
        &self,
        appointment_id: Option<&str>,
        force_regenerate: bool,
    ) -> Result<BackfillReport, GovernanceError> {
        let ids = match appointment_id {
            Some(id) => vec![id.to_string()],
            None => Queries::list_appointment_ids(self.database.pool()).await?,
        };

        let mut results = Vec::new();
        let mut all_errors = BTreeSet::new();
        let mut errors_count = 0;

        for id in &ids {
            match self.ensure_documents(id, force_regenerate).await {
                Ok(report) => {
                    if let Some(errors) = &report.errors {
                        errors_count += errors.len();
                        all_errors.extend(errors.iter().map(|e| e.to_string()));
                    }
                    results.push(report);
                }
                // A single requested appointment must exist.
                Err(e) if appointment_id.is_some() => return Err(e),
                Err(e) => {
                    error!("Backfill failed for appointment {}: {}", id, e);
                    errors_count += 1;
                    all_errors.insert(format!("{}: {}", id, e));
                }
            }
        }

        let documents_generated = results.iter().map(|r| r.documents_generated.len()).sum();
        info!(
            "Backfill processed {} appointments, generated {} documents, {} errors",
            results.len(),
            documents_generated,
            errors_count
        );

        Ok(BackfillReport {
            processed: results.len(),
            documents_generated,
            errors_count,
            all_errors: all_errors.into_iter().collect(),
            results,
        })
    }
}
