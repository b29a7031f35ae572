//! Officer appointments: proposal, required documents, generation,
//! execution and the banking packet.

pub mod banking;
pub mod generator;
pub mod orchestrator;
pub mod pipeline;
pub mod rules;
pub mod service;
pub mod templates;

pub use banking::{AuthorityFlags, BankingPacket, BankingPacketAssembler};
pub use generator::{DocumentGenerator, TemplateDocumentGenerator};
pub use orchestrator::{
    ExecutionOrchestrator, ExecutionOutcome, ExecutionStep, ExecutionSummary,
    LegacyExecutionSummary, StepOutcome, StepReport,
};
pub use pipeline::{
    BackfillReport, DocumentFailure, DocumentPipeline, EnsureReport, GeneratedDocument,
};
pub use rules::{required_documents, rules_for, DocumentRule, Requirement};
pub use service::{AppointmentService, NewAppointment, Proposal};
