use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::GovernanceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    CorporateSecretary,
    Founder,
    Ceo,
    BoardMember,
    Executive,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::CorporateSecretary => "corporate_secretary",
            Role::Founder => "founder",
            Role::Ceo => "ceo",
            Role::BoardMember => "board_member",
            Role::Executive => "executive",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "corporate_secretary" | "secretary" => Some(Role::CorporateSecretary),
            "founder" => Some(Role::Founder),
            "ceo" => Some(Role::Ceo),
            "board_member" => Some(Role::BoardMember),
            "executive" => Some(Role::Executive),
            _ => None,
        }
    }

    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Role::CorporateSecretary | Role::Founder | Role::Ceo => &[
                Capability::ManageGovernance,
                Capability::CastVote,
                Capability::GenerateDocuments,
            ],
            Role::BoardMember => &[Capability::CastVote],
            Role::Executive => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Adopt, reject and execute resolutions; propose appointments.
    ManageGovernance,
    CastVote,
    GenerateDocuments,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ManageGovernance => "manage_governance",
            Capability::CastVote => "cast_vote",
            Capability::GenerateDocuments => "generate_documents",
        }
    }
}

/// Authenticated caller of a governance command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub email: Option<String>,
    pub roles: BTreeSet<Role>,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
            roles: roles.into_iter().collect(),
        }
    }

    /// Internal caller used by operator binaries.
    pub fn system() -> Self {
        Self::new("system", [Role::CorporateSecretary])
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.roles
            .iter()
            .any(|role| role.capabilities().contains(&capability))
    }

    pub fn require(&self, capability: Capability) -> Result<(), GovernanceError> {
        if self.has(capability) {
            Ok(())
        } else {
            Err(GovernanceError::PermissionError(format!(
                "{} lacks the {} capability",
                self.user_id,
                capability.as_str()
            )))
        }
    }
}
