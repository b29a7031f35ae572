//! Board resolutions and voting.

pub mod quorum;
pub mod resolutions;
pub mod types;
pub mod votes;

pub use quorum::{rule_for, Decision, MajorityRule, ManualOnly, QuorumRule};
pub use resolutions::{ExecutedResolution, ResolutionExecutor, ResolutionManager};
pub use types::{NewResolution, VoteOutcome, VoteTally};
pub use votes::VoteLedger;
