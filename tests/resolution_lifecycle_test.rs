//! Resolution voting and adoption tests

mod common;

use chrono::NaiveDate;

use board_governance::config::QuorumRuleKind;
use board_governance::database::models::{
    AppointmentStatus, OfficerStatus, ResolutionStatus, ResolutionType, VoteChoice,
};
use board_governance::database::queries::Queries;
use board_governance::governance::NewResolution;
use board_governance::GovernanceError;
use common::*;

fn general_resolution(title: &str) -> NewResolution {
    NewResolution {
        title: title.to_string(),
        description: "RESOLVED, that the corporation opens an operating account.".to_string(),
        resolution_type: ResolutionType::General,
        meeting_date: None,
        effective_date: None,
        metadata: serde_json::Value::Null,
    }
}

#[tokio::test]
async fn test_proposal_opens_linked_resolution() -> Result<(), Box<dyn std::error::Error>> {
    let h = Harness::new().await;

    let proposal = h
        .state
        .appointments
        .propose_appointment(&secretary(), new_appointment("Jane Doe", "jane@example.com", "CFO"))
        .await?;

    assert_eq!(proposal.appointment.status, AppointmentStatus::SentToBoard);
    assert_eq!(
        proposal.appointment.board_resolution_id.as_deref(),
        Some(proposal.resolution.id.as_str())
    );
    assert_eq!(proposal.resolution.status, ResolutionStatus::PendingVote);
    assert_eq!(proposal.resolution.resolution_type, ResolutionType::ExecutiveAppointment);
    assert_eq!(proposal.resolution.appointment_id(), Some(proposal.appointment.id.as_str()));
    assert!(proposal.resolution.resolution_number.starts_with("RES-"));
    assert!(proposal.resolution.resolution_number.ends_with("-001"));

    Ok(())
}

#[tokio::test]
async fn test_repeat_vote_overwrites() -> Result<(), Box<dyn std::error::Error>> {
    let h = Harness::new().await;
    let member = board_member(&h.database, "director-a").await;
    let resolutions = &h.state.resolutions;

    let resolution = resolutions
        .create_resolution(&secretary(), general_resolution("Open bank account"))
        .await?;
    resolutions.open_voting(&secretary(), &resolution.id).await?;

    resolutions
        .record_vote(&member, &resolution.id, VoteChoice::Yes, Some("looks fine"))
        .await?;
    let outcome = resolutions
        .record_vote(&member, &resolution.id, VoteChoice::No, None)
        .await?;

    let votes = resolutions.ledger().votes(&resolution.id).await?;
    assert_eq!(votes.len(), 1);
    assert_eq!(votes[0].vote, VoteChoice::No);
    assert_eq!(outcome.tally.yes, 0);
    assert_eq!(outcome.tally.no, 1);
    // Manual rule: votes never decide on their own.
    assert_eq!(outcome.status, ResolutionStatus::PendingVote);

    Ok(())
}

#[tokio::test]
async fn test_vote_requires_pending_resolution_and_membership() {
    let h = Harness::new().await;
    let member = board_member(&h.database, "director-a").await;
    let resolutions = &h.state.resolutions;

    let resolution = resolutions
        .create_resolution(&secretary(), general_resolution("Draft only"))
        .await
        .unwrap();

    let draft_vote = resolutions
        .record_vote(&member, &resolution.id, VoteChoice::Yes, None)
        .await;
    assert!(matches!(draft_vote, Err(GovernanceError::StateError(_))));

    resolutions.open_voting(&secretary(), &resolution.id).await.unwrap();

    // Secretary holds the vote capability but has no board seat.
    let outsider = resolutions
        .record_vote(&secretary(), &resolution.id, VoteChoice::Yes, None)
        .await;
    assert!(matches!(outsider, Err(GovernanceError::PermissionError(_))));

    let executive_vote = resolutions
        .record_vote(&executive(), &resolution.id, VoteChoice::Yes, None)
        .await;
    assert!(matches!(executive_vote, Err(GovernanceError::PermissionError(_))));

    let missing = resolutions
        .record_vote(&member, "no-such-resolution", VoteChoice::Yes, None)
        .await;
    assert!(matches!(missing, Err(GovernanceError::NotFound(_))));
}

#[tokio::test]
async fn test_manual_adopt_moves_appointment_and_records_history() {
    let h = Harness::new().await;
    let (appointment_id, resolution_id) = h
        .approved_appointment(new_appointment("Jane Doe", "jane@example.com", "CFO"))
        .await;

    let resolution = h.state.resolutions.get(&resolution_id).await.unwrap();
    assert_eq!(resolution.status, ResolutionStatus::Adopted);
    assert_eq!(resolution.decided_by.as_deref(), Some("secretary-1"));
    assert!(resolution.decided_at.is_some());

    let appointment = h.appointment(&appointment_id).await;
    assert_eq!(appointment.status, AppointmentStatus::Approved);
    assert!(appointment.approved_at.is_some());

    let history = h.state.resolutions.history(&resolution_id).await.unwrap();
    let statuses: Vec<ResolutionStatus> = history.iter().map(|c| c.to_status).collect();
    assert_eq!(
        statuses,
        vec![
            ResolutionStatus::Draft,
            ResolutionStatus::PendingVote,
            ResolutionStatus::Adopted
        ]
    );
    assert_eq!(history[0].from_status, None);
    assert_eq!(history[2].from_status, Some(ResolutionStatus::PendingVote));
}

#[tokio::test]
async fn test_manual_reject_rejects_appointment() {
    let h = Harness::new().await;
    let proposal = h
        .state
        .appointments
        .propose_appointment(&secretary(), new_appointment("Sam Roe", "sam@example.com", "COO"))
        .await
        .unwrap();

    let rejected = h
        .state
        .resolutions
        .manual_reject(&secretary(), &proposal.resolution.id)
        .await
        .unwrap();
    assert_eq!(rejected.status, ResolutionStatus::Rejected);
    assert_eq!(
        h.appointment(&proposal.appointment.id).await.status,
        AppointmentStatus::Rejected
    );

    // A decided resolution cannot be decided again.
    let again = h
        .state
        .resolutions
        .manual_adopt(&secretary(), &proposal.resolution.id)
        .await;
    assert!(matches!(again, Err(GovernanceError::StateError(_))));
}

#[tokio::test]
async fn test_manual_override_requires_capability() {
    let h = Harness::new().await;
    let member = board_member(&h.database, "director-a").await;
    let proposal = h
        .state
        .appointments
        .propose_appointment(&secretary(), new_appointment("Jane Doe", "jane@example.com", "CFO"))
        .await
        .unwrap();

    let result = h
        .state
        .resolutions
        .manual_adopt(&member, &proposal.resolution.id)
        .await;
    assert!(matches!(result, Err(GovernanceError::PermissionError(_))));

    let resolution = h.state.resolutions.get(&proposal.resolution.id).await.unwrap();
    assert_eq!(resolution.status, ResolutionStatus::PendingVote);
}

#[tokio::test]
async fn test_majority_rule_adopts_from_tally() {
    let h = Harness::with_quorum(QuorumRuleKind::Majority).await;
    let a = board_member(&h.database, "director-a").await;
    let b = board_member(&h.database, "director-b").await;
    let _c = board_member(&h.database, "director-c").await;

    let proposal = h
        .state
        .appointments
        .propose_appointment(&secretary(), new_appointment("Jane Doe", "jane@example.com", "CEO"))
        .await
        .unwrap();
    let id = &proposal.resolution.id;

    // An abstention alone leaves YES and NO tied.
    let first = h.state.resolutions.record_vote(&a, id, VoteChoice::Abstain, None).await.unwrap();
    assert_eq!(first.status, ResolutionStatus::PendingVote);

    let second = h.state.resolutions.record_vote(&b, id, VoteChoice::Yes, None).await.unwrap();
    assert_eq!(second.status, ResolutionStatus::Adopted);
    assert_eq!(
        h.appointment(&proposal.appointment.id).await.status,
        AppointmentStatus::Approved
    );
}

#[tokio::test]
async fn test_majority_rule_rejects_from_tally() {
    let h = Harness::with_quorum(QuorumRuleKind::Majority).await;
    let a = board_member(&h.database, "director-a").await;
    let b = board_member(&h.database, "director-b").await;

    let resolution = h
        .state
        .resolutions
        .create_resolution(&secretary(), general_resolution("Lease office"))
        .await
        .unwrap();
    h.state.resolutions.open_voting(&secretary(), &resolution.id).await.unwrap();

    h.state.resolutions.record_vote(&a, &resolution.id, VoteChoice::Abstain, None).await.unwrap();
    let outcome = h
        .state
        .resolutions
        .record_vote(&b, &resolution.id, VoteChoice::No, None)
        .await
        .unwrap();
    assert_eq!(outcome.status, ResolutionStatus::Rejected);
}

#[tokio::test]
async fn test_blank_title_rejected() {
    let h = Harness::new().await;
    let result = h
        .state
        .resolutions
        .create_resolution(&secretary(), general_resolution("   "))
        .await;
    assert!(matches!(result, Err(GovernanceError::ValidationError(_))));
}

#[tokio::test]
async fn test_adoption_registers_officer_once() -> Result<(), Box<dyn std::error::Error>> {
    let h = Harness::new().await;
    let (appointment_id, resolution_id) = h
        .approved_appointment(new_appointment("Jane Doe", "jane@example.com", "CFO"))
        .await;

    let officers = Queries::list_active_officers(h.database.pool()).await?;
    assert_eq!(officers.len(), 1);
    let officer = &officers[0];
    assert_eq!(officer.full_name, "Jane Doe");
    assert_eq!(officer.title, "CFO");
    assert_eq!(officer.status, OfficerStatus::Active);
    assert_eq!(officer.appointed_by.as_deref(), Some(resolution_id.as_str()));
    assert_eq!(officer.appointment_id.as_deref(), Some(appointment_id.as_str()));
    assert_eq!(officer.effective_date, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
    // 24 months of 30 days
    assert_eq!(officer.term_end, NaiveDate::from_ymd_opt(2028, 1, 22));

    // Same person, new title: the active entry is kept.
    h.approved_appointment(new_appointment("Jane Doe", "JANE@example.com", "CEO"))
        .await;
    let officers = Queries::list_active_officers(h.database.pool()).await?;
    assert_eq!(officers.len(), 1);
    assert_eq!(officers[0].title, "CFO");

    Ok(())
}

#[tokio::test]
async fn test_rejection_registers_no_officer() {
    let h = Harness::new().await;
    let proposal = h
        .state
        .appointments
        .propose_appointment(&secretary(), new_appointment("Jane Doe", "jane@example.com", "CFO"))
        .await
        .unwrap();
    h.state
        .resolutions
        .manual_reject(&secretary(), &proposal.resolution.id)
        .await
        .unwrap();

    let officers = Queries::list_active_officers(h.database.pool()).await.unwrap();
    assert!(officers.is_empty());
}
