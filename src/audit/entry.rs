//! Audit Log Entry
//!
//! One governance action (vote, adoption, execution, ...) chained to the
//! previous entry by its SHA256 hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const GENESIS_HASH: &str =
    "sha256:0000000000000000000000000000000000000000000000000000000000000000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub entry_id: String,
    pub action: String,
    pub target: String,
    pub actor: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub server_id: String,
    pub metadata: serde_json::Value,
    pub previous_log_hash: String,
    pub this_log_hash: String,
}

impl AuditLogEntry {
    pub fn new(
        action: &str,
        target: &str,
        actor: Option<&str>,
        server_id: &str,
        metadata: serde_json::Value,
        previous_log_hash: String,
    ) -> Self {
        let mut entry = Self {
            entry_id: uuid::Uuid::new_v4().to_string(),
            action: action.to_string(),
            target: target.to_string(),
            actor: actor.map(str::to_string),
            timestamp: Utc::now(),
            server_id: server_id.to_string(),
            metadata,
            previous_log_hash,
            this_log_hash: String::new(),
        };
        entry.this_log_hash = entry.calculate_hash();
        entry
    }

    /// Canonical form used for hashing. Metadata keys serialize in sorted
    /// order, so the string is stable across reloads.
    pub fn canonical_string(&self) -> String {
        format!(
            "entry_id:{}|action:{}|target:{}|actor:{}|timestamp:{}|server_id:{}|previous_log_hash:{}|metadata:{}",
            self.entry_id,
            self.action,
            self.target,
            self.actor.as_deref().unwrap_or(""),
            self.timestamp.to_rfc3339(),
            self.server_id,
            self.previous_log_hash,
            self.metadata
        )
    }

    pub fn calculate_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_string().as_bytes());
        format!("sha256:{}", hex::encode(hasher.finalize()))
    }

    pub fn verify_hash(&self) -> bool {
        self.this_log_hash == self.calculate_hash()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} on {} by {}",
            self.action,
            self.target,
            self.actor.as_deref().unwrap_or("system")
        )
    }
}

/// First entry of every log.
pub fn create_genesis_entry(server_id: &str) -> AuditLogEntry {
    AuditLogEntry::new(
        "genesis",
        "audit-log",
        None,
        server_id,
        serde_json::json!({"description": "Genesis entry", "version": "1.0"}),
        GENESIS_HASH.to_string(),
    )
}
