//! Document generation pipeline tests

mod common;

use std::collections::BTreeSet;

use board_governance::appointments::required_documents;
use board_governance::database::models::{AppointmentStatus, DocumentType};
use board_governance::database::queries::Queries;
use board_governance::GovernanceError;
use common::*;

fn set(types: &[DocumentType]) -> BTreeSet<DocumentType> {
    types.iter().copied().collect()
}

#[tokio::test]
async fn test_backfill_follows_appointment_through_approval(
) -> Result<(), Box<dyn std::error::Error>> {
    let h = Harness::new().await;
    let appointments = &h.state.appointments;
    let pipeline = &h.state.pipeline;

    let draft = appointments
        .create_appointment(&secretary(), new_appointment("Jane Doe", "jane@example.com", "CFO"))
        .await?;
    assert_eq!(draft.status, AppointmentStatus::Draft);

    let first = pipeline.backfill(Some(&draft.id), false).await?;
    assert_eq!(first.processed, 1);
    assert_eq!(first.results[0].documents_generated, vec![DocumentType::AppointmentLetter]);

    appointments.send_to_board(&secretary(), &draft.id).await?;
    let resolution_id = h.appointment(&draft.id).await.board_resolution_id.unwrap();
    h.state.resolutions.manual_adopt(&secretary(), &resolution_id).await?;
    Queries::update_appointment_terms(h.database.pool(), &draft.id, true, None, None).await?;

    let approved = pipeline.backfill(Some(&draft.id), false).await?;
    let generated = set(&approved.results[0].documents_generated);
    assert_eq!(
        generated,
        set(&[
            DocumentType::BoardResolution,
            DocumentType::Certificate,
            DocumentType::EmploymentAgreement,
            DocumentType::ConfidentialityIp,
            DocumentType::StockSubscription,
            DocumentType::DeferredCompensation,
        ])
    );
    assert!(!generated.contains(&DocumentType::AppointmentLetter));
    assert!(!generated.contains(&DocumentType::PreIncorporationConsent));
    assert_eq!(approved.documents_generated, 6);
    assert_eq!(approved.errors_count, 0);

    Ok(())
}

#[tokio::test]
async fn test_second_backfill_generates_nothing() {
    let h = Harness::new().await;
    let (id, _) = h
        .approved_appointment(new_appointment("Jane Doe", "jane@example.com", "CEO"))
        .await;

    let first = h.state.pipeline.backfill(Some(&id), false).await.unwrap();
    assert!(first.documents_generated > 0);

    let calls_before = h.generator.calls().len();
    let second = h.state.pipeline.backfill(Some(&id), false).await.unwrap();
    assert_eq!(second.documents_generated, 0);
    assert!(second.results[0].documents_generated.is_empty());
    assert!(second.results[0].documents_queued.is_empty());
    assert_eq!(
        second.results[0].reason_no_docs.as_deref(),
        Some("all required documents already exist")
    );
    assert_eq!(h.generator.calls().len(), calls_before);
}

#[tokio::test]
async fn test_force_regenerates_full_required_set() {
    let h = Harness::new().await;
    let mut input = new_appointment("Jane Doe", "jane@example.com", "CFO");
    input.compensation_structure = Some("Base plus Deferred bonus".to_string());
    input.formation_mode = Some("pre_incorporation".to_string());
    let (id, _) = h.approved_appointment(input).await;

    h.state.pipeline.backfill(Some(&id), false).await.unwrap();
    let before = h.appointment(&id).await;

    let forced = h.state.pipeline.backfill(Some(&id), true).await.unwrap();
    let expected = required_documents(&before);
    assert_eq!(expected.len(), DocumentType::ALL.len());
    assert_eq!(set(&forced.results[0].documents_generated), set(&expected));

    let after = h.appointment(&id).await;
    for document_type in expected {
        assert_ne!(
            before.document_urls.get(document_type),
            after.document_urls.get(document_type),
            "{} should have a fresh URL",
            document_type
        );
    }
}

#[tokio::test]
async fn test_one_failing_type_does_not_stop_others() {
    let h = Harness::new().await;
    let (id, _) = h
        .approved_appointment(new_appointment("Jane Doe", "jane@example.com", "CFO"))
        .await;
    h.generator.fail_on(DocumentType::Certificate);

    let report = h.state.pipeline.ensure_documents(&id, false).await.unwrap();
    let errors = report.errors.clone().expect("errors reported");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].document_type, DocumentType::Certificate);
    assert!(errors[0].to_string().starts_with("certificate: "));
    assert_eq!(report.documents_generated.len(), report.documents_queued.len() - 1);

    let appointment = h.appointment(&id).await;
    assert!(!appointment.document_urls.has(DocumentType::Certificate));
    assert!(appointment.document_urls.has(DocumentType::EmploymentAgreement));

    // Retrying after the outage only generates the missing document.
    h.generator.heal();
    let retry = h.state.pipeline.ensure_documents(&id, false).await.unwrap();
    assert_eq!(retry.documents_generated, vec![DocumentType::Certificate]);
    assert!(retry.errors.is_none());
}

#[tokio::test]
async fn test_hung_generator_call_times_out_alone() {
    let h = Harness::new().await;
    let (id, _) = h
        .approved_appointment(new_appointment("Jane Doe", "jane@example.com", "CTO"))
        .await;
    h.generator.hang_on(DocumentType::StockSubscription);

    let report = h.state.pipeline.ensure_documents(&id, false).await.unwrap();
    let errors = report.errors.expect("timeout reported");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].document_type, DocumentType::StockSubscription);
    assert!(errors[0].message.contains("timed out"));
    assert!(report.documents_generated.contains(&DocumentType::ConfidentialityIp));
}

#[tokio::test]
async fn test_backfill_all_aggregates_errors() {
    let h = Harness::new().await;
    let (approved, _) = h
        .approved_appointment(new_appointment("Jane Doe", "jane@example.com", "CFO"))
        .await;
    let (other, _) = h
        .approved_appointment(new_appointment("Sam Roe", "sam@example.com", "COO"))
        .await;
    h.generator.fail_on(DocumentType::Certificate);

    let report = h.state.pipeline.backfill(None, false).await.unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.errors_count, 2);
    // Identical messages collapse.
    assert_eq!(report.all_errors.len(), 1);
    assert!(report.all_errors[0].starts_with("certificate: "));

    let ids: BTreeSet<&str> = report.results.iter().map(|r| r.appointment_id.as_str()).collect();
    assert!(ids.contains(approved.as_str()) && ids.contains(other.as_str()));
}

#[tokio::test]
async fn test_rejected_appointment_needs_only_letter() {
    let h = Harness::new().await;
    let proposal = h
        .state
        .appointments
        .propose_appointment(&secretary(), new_appointment("Sam Roe", "sam@example.com", "COO"))
        .await
        .unwrap();
    h.state
        .resolutions
        .manual_reject(&secretary(), &proposal.resolution.id)
        .await
        .unwrap();

    let report = h
        .state
        .pipeline
        .ensure_documents(&proposal.appointment.id, false)
        .await
        .unwrap();
    assert_eq!(report.status, AppointmentStatus::Rejected);
    assert_eq!(report.documents_generated, vec![DocumentType::AppointmentLetter]);
}

#[tokio::test]
async fn test_generate_one_replaces_url() {
    let h = Harness::new().await;
    let appointment = h
        .state
        .appointments
        .create_appointment(&secretary(), new_appointment("Jane Doe", "jane@example.com", "CFO"))
        .await
        .unwrap();

    let first = h
        .state
        .pipeline
        .generate_one(&appointment.id, DocumentType::AppointmentLetter)
        .await
        .unwrap();
    let second = h
        .state
        .pipeline
        .generate_one(&appointment.id, DocumentType::AppointmentLetter)
        .await
        .unwrap();
    assert_ne!(first.url, second.url);
    assert_eq!(
        h.appointment(&appointment.id).await.document_urls.get(DocumentType::AppointmentLetter),
        Some(second.url.as_str())
    );
}

#[tokio::test]
async fn test_unknown_appointment() {
    let h = Harness::new().await;
    let single = h.state.pipeline.backfill(Some("missing"), false).await;
    assert!(matches!(single, Err(GovernanceError::NotFound(_))));

    let empty = h.state.pipeline.backfill(None, false).await.unwrap();
    assert_eq!(empty.processed, 0);
    assert!(empty.all_errors.is_empty());
}
