//! Audit Log Verification

use anyhow::{anyhow, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::audit::entry::{AuditLogEntry, GENESIS_HASH};
use crate::audit::logger::load_entries;

/// Checks genesis, every entry hash, the chain links and timestamp order.
pub fn verify_audit_log(entries: &[AuditLogEntry]) -> Result<bool> {
    let first = entries.first().ok_or_else(|| anyhow!("Empty audit log"))?;
    if first.action != "genesis" || first.previous_log_hash != GENESIS_HASH {
        return Err(anyhow!("First entry must be genesis"));
    }

    for (i, entry) in entries.iter().enumerate() {
        if !entry.verify_hash() {
            return Err(anyhow!("Invalid hash in entry {}", i));
        }
    }

    for i in 1..entries.len() {
        let prev = &entries[i - 1];
        let curr = &entries[i];
        if curr.previous_log_hash != prev.this_log_hash {
            return Err(anyhow!(
                "Hash chain broken at entry {}: expected {}, got {}",
                i,
                prev.this_log_hash,
                curr.previous_log_hash
            ));
        }
        if curr.timestamp < prev.timestamp {
            return Err(anyhow!(
                "Non-monotonic timestamp at entry {}: {} < {}",
                i,
                curr.timestamp,
                prev.timestamp
            ));
        }
    }

    info!("Audit log verification successful: {} entries", entries.len());
    Ok(true)
}

pub fn load_audit_log_from_file(path: &str) -> Result<Vec<AuditLogEntry>> {
    if !Path::new(path).exists() {
        return Err(anyhow!("Audit log file does not exist: {}", path));
    }
    load_entries(path)
}

pub fn verify_audit_log_file(path: &str) -> Result<bool> {
    info!("Verifying audit log file: {}", path);
    let entries = load_audit_log_from_file(path)?;
    verify_audit_log(&entries)
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub entry_count: usize,
    pub head_hash: String,
    pub actions: BTreeMap<String, usize>,
}

/// Verifies the file and summarises what it contains.
pub fn verify_audit_log_detailed(path: &str) -> Result<VerificationReport> {
    let entries = load_audit_log_from_file(path)?;
    verify_audit_log(&entries)?;

    let mut actions = BTreeMap::new();
    for entry in &entries {
        *actions.entry(entry.action.clone()).or_insert(0) += 1;
    }

    Ok(VerificationReport {
        entry_count: entries.len(),
        head_hash: entries
            .last()
            .map(|e| e.this_log_hash.clone())
            .unwrap_or_default(),
        actions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::entry::create_genesis_entry;

    fn chain(len: usize) -> Vec<AuditLogEntry> {
        let mut entries = vec![create_genesis_entry("governance-01")];
        for i in 0..len {
            let prev = entries[entries.len() - 1].this_log_hash.clone();
            entries.push(AuditLogEntry::new(
                "vote_cast",
                &format!("res-{}", i),
                None,
                "governance-01",
                serde_json::json!({}),
                prev,
            ));
        }
        entries
    }

    #[test]
    fn test_valid_chain() {
        assert!(verify_audit_log(&chain(3)).unwrap());
    }

    #[test]
    fn test_broken_chain_detected() {
        let mut entries = chain(3);
        entries.remove(2);
        let err = verify_audit_log(&entries).unwrap_err();
        assert!(err.to_string().contains("Hash chain broken"));
    }

    #[test]
    fn test_missing_genesis_detected() {
        let entries = chain(2);
        assert!(verify_audit_log(&entries[1..]).is_err());
        assert!(verify_audit_log(&[]).is_err());
    }
}
