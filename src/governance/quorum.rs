//! Rules for deciding a PENDING_VOTE resolution from its tally.

use std::sync::Arc;

use crate::config::QuorumRuleKind;
use crate::governance::types::VoteTally;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Adopt,
    Reject,
}

pub trait QuorumRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` leaves the resolution open.
    fn decide(&self, tally: &VoteTally, active_members: u32) -> Option<Decision>;
}

/// Never decides; adoption happens only through the privileged commands.
pub struct ManualOnly;

impl QuorumRule for ManualOnly {
    fn name(&self) -> &'static str {
        "manual"
    }

    fn decide(&self, _tally: &VoteTally, _active_members: u32) -> Option<Decision> {
        None
    }
}

/// Simple majority of the active board. A side that alone reaches
/// `active / 2 + 1` wins outright. Otherwise the larger of YES and NO wins
/// once `cast / 2 + 1` votes are in, abstentions included. Ties stay open.
pub struct MajorityRule;

impl QuorumRule for MajorityRule {
    fn name(&self) -> &'static str {
        "majority"
    }

    fn decide(&self, tally: &VoteTally, active_members: u32) -> Option<Decision> {
        if active_members == 0 {
            return None;
        }

        let board_majority = active_members / 2 + 1;
        if tally.yes >= board_majority {
            return Some(Decision::Adopt);
        }
        if tally.no >= board_majority {
            return Some(Decision::Reject);
        }

        let cast = tally.total();
        if cast == 0 || cast < cast / 2 + 1 {
            return None;
        }
        match tally.yes.cmp(&tally.no) {
            std::cmp::Ordering::Greater => Some(Decision::Adopt),
            std::cmp::Ordering::Less => Some(Decision::Reject),
            std::cmp::Ordering::Equal => None,
        }
    }
}

pub fn rule_for(kind: QuorumRuleKind) -> Arc<dyn QuorumRule> {
    match kind {
        QuorumRuleKind::Manual => Arc::new(ManualOnly),
        QuorumRuleKind::Majority => Arc::new(MajorityRule),
    }
}
