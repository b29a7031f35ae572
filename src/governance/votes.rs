use chrono::Utc;
use tracing::{debug, info};

use crate::audit::{record_best_effort, AuditLogger};
use crate::database::models::{ResolutionStatus, Vote, VoteChoice};
use crate::database::queries::Queries;
use crate::database::Database;
use crate::error::GovernanceError;
use crate::governance::types::VoteTally;

/// One current vote per (resolution, board member).
#[derive(Clone)]
pub struct VoteLedger {
    database: Database,
    audit: Option<AuditLogger>,
}

impl VoteLedger {
    pub fn new(database: Database, audit: Option<AuditLogger>) -> Self {
        Self { database, audit }
    }

    /// Records `member_user_id`'s vote. A repeat cast replaces the earlier one.
    pub async fn cast_vote(
        &self,
        resolution_id: &str,
        member_user_id: &str,
        vote: VoteChoice,
        comment: Option<&str>,
    ) -> Result<Vote, GovernanceError> {
        let pool = self.database.pool();

        let resolution = Queries::get_resolution(pool, resolution_id)
            .await?
            .ok_or_else(|| GovernanceError::resolution_not_found(resolution_id))?;

        if resolution.status != ResolutionStatus::PendingVote {
            return Err(GovernanceError::StateError(format!(
                "Resolution {} is {}, votes are only accepted while PENDING_VOTE",
                resolution.resolution_number, resolution.status
            )));
        }

        let member = Queries::get_board_member_by_user(pool, member_user_id)
            .await?
            .filter(|m| m.active)
            .ok_or_else(|| {
                GovernanceError::PermissionError(format!(
                    "{} is not an active board member",
                    member_user_id
                ))
            })?;

        let comment = comment.map(str::trim).filter(|c| !c.is_empty());
        let stored =
            Queries::upsert_vote(pool, resolution_id, &member.id, vote, comment, Utc::now()).await?;

        info!(
            "{} voted {} on {}",
            member.full_name,
            vote.as_str(),
            resolution.resolution_number
        );
        record_best_effort(
            self.audit.as_ref(),
            "vote_cast",
            resolution_id,
            Some(member_user_id),
            serde_json::json!({"vote": vote.as_str(), "board_member_id": member.id}),
        )
        .await;

        Ok(stored)
    }

    pub async fn tally(&self, resolution_id: &str) -> Result<VoteTally, GovernanceError> {
        let votes = self.votes(resolution_id).await?;
        let tally = VoteTally::from_votes(&votes);
        debug!(
            "Tally for {}: {} yes, {} no, {} abstain",
            resolution_id, tally.yes, tally.no, tally.abstain
        );
        Ok(tally)
    }

    pub async fn votes(&self, resolution_id: &str) -> Result<Vec<Vote>, GovernanceError> {
        Queries::list_votes(self.database.pool(), resolution_id).await
    }
}
