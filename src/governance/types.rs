use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::database::models::{ResolutionStatus, ResolutionType, Vote, VoteChoice};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub yes: u32,
    pub no: u32,
    pub abstain: u32,
}

impl VoteTally {
    pub fn from_votes(votes: &[Vote]) -> Self {
        votes.iter().fold(Self::default(), |mut tally, vote| {
            match vote.vote {
                VoteChoice::Yes => tally.yes += 1,
                VoteChoice::No => tally.no += 1,
                VoteChoice::Abstain => tally.abstain += 1,
            }
            tally
        })
    }

    pub fn total(&self) -> u32 {
        self.yes + self.no + self.abstain
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewResolution {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub resolution_type: ResolutionType,
    #[serde(default)]
    pub meeting_date: Option<NaiveDate>,
    #[serde(default)]
    pub effective_date: Option<NaiveDate>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Result of casting a vote: the stored vote, the tally after it, and the
/// resolution status once the quorum rule has been applied.
#[derive(Debug, Clone, Serialize)]
pub struct VoteOutcome {
    pub vote: Vote,
    pub tally: VoteTally,
    pub status: ResolutionStatus,
}
