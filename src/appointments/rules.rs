//! Which documents an appointment needs, by status and flags.
//!
//! This table is the only place the document set is decided. The pipeline
//! asks it what is required and compares that against what exists.

use crate::database::models::{Appointment, AppointmentStatus, DocumentType};

/// Condition under which a listed document is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Always,
    /// A board resolution is linked.
    ResolutionLinked,
    /// Equity is included or the compensation mentions deferral.
    EquityOrDeferredComp,
    /// A formation mode is recorded (pre-incorporation appointments).
    FormationMode,
}

impl Requirement {
    pub fn applies(&self, appointment: &Appointment) -> bool {
        match self {
            Requirement::Always => true,
            Requirement::ResolutionLinked => appointment
                .board_resolution_id
                .as_deref()
                .is_some_and(|id| !id.trim().is_empty()),
            Requirement::EquityOrDeferredComp => {
                appointment.equity_included
                    || appointment
                        .compensation_structure
                        .as_deref()
                        .is_some_and(|c| c.to_lowercase().contains("deferred"))
            }
            Requirement::FormationMode => appointment
                .formation_mode
                .as_deref()
                .is_some_and(|m| !m.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DocumentRule {
    pub document_type: DocumentType,
    pub requirement: Requirement,
}

const fn rule(document_type: DocumentType, requirement: Requirement) -> DocumentRule {
    DocumentRule {
        document_type,
        requirement,
    }
}

const LETTER_ONLY: &[DocumentRule] = &[rule(DocumentType::AppointmentLetter, Requirement::Always)];

const SENT_TO_BOARD: &[DocumentRule] = &[
    rule(DocumentType::AppointmentLetter, Requirement::Always),
    rule(DocumentType::BoardResolution, Requirement::ResolutionLinked),
];

const APPROVED: &[DocumentRule] = &[
    rule(DocumentType::AppointmentLetter, Requirement::Always),
    rule(DocumentType::BoardResolution, Requirement::ResolutionLinked),
    rule(DocumentType::Certificate, Requirement::Always),
    rule(DocumentType::EmploymentAgreement, Requirement::Always),
    rule(DocumentType::ConfidentialityIp, Requirement::Always),
    rule(DocumentType::StockSubscription, Requirement::Always),
    rule(DocumentType::DeferredCompensation, Requirement::EquityOrDeferredComp),
    rule(DocumentType::PreIncorporationConsent, Requirement::FormationMode),
];

pub fn rules_for(status: AppointmentStatus) -> &'static [DocumentRule] {
    match status {
        AppointmentStatus::Draft => LETTER_ONLY,
        AppointmentStatus::SentToBoard => SENT_TO_BOARD,
        AppointmentStatus::Approved => APPROVED,
        AppointmentStatus::Rejected | AppointmentStatus::Executed => LETTER_ONLY,
    }
}

/// Documents the appointment must have, whether or not they exist yet.
pub fn required_documents(appointment: &Appointment) -> Vec<DocumentType> {
    rules_for(appointment.status)
        .iter()
        .filter(|r| r.requirement.applies(appointment))
        .map(|r| r.document_type)
        .collect()
}
