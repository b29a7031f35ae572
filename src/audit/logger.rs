//! Audit Logger
//!
//! Append-only JSONL file of hash-chained governance actions.

use anyhow::{anyhow, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::audit::entry::{create_genesis_entry, AuditLogEntry};

struct LogState {
    file: File,
    head_hash: String,
    entry_count: u64,
}

#[derive(Clone)]
pub struct AuditLogger {
    log_path: String,
    server_id: String,
    state: Arc<Mutex<LogState>>,
}

impl AuditLogger {
    /// Open (or start) the log at `log_path`. An existing log is replayed
    /// and its chain checked; a new one starts with a genesis entry.
    pub async fn new(log_path: String, server_id: String) -> Result<Self> {
        if let Some(parent) = Path::new(&log_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| anyhow!("Failed to create log directory: {}", e))?;
            }
        }

        let existing = load_entries(&log_path)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| anyhow!("Failed to open audit log file: {}", e))?;

        let mut state = LogState {
            file,
            head_hash: String::new(),
            entry_count: 0,
        };

        if existing.is_empty() {
            let genesis = create_genesis_entry(&server_id);
            write_entry(&mut state, &genesis)?;
        } else {
            crate::audit::verify::verify_audit_log(&existing)?;
            if let Some(last) = existing.last() {
                state.head_hash = last.this_log_hash.clone();
            }
            state.entry_count = existing.len() as u64;
            info!("Loaded {} existing audit entries", existing.len());
        }

        Ok(Self {
            log_path,
            server_id,
            state: Arc::new(Mutex::new(state)),
        })
    }

    /// Append an action. The state lock is held from reading the head hash
    /// to writing the line, so concurrent writers never fork the chain.
    pub async fn record(
        &self,
        action: &str,
        target: &str,
        actor: Option<&str>,
        metadata: serde_json::Value,
    ) -> Result<AuditLogEntry> {
        let mut state = self.state.lock().await;
        let entry = AuditLogEntry::new(
            action,
            target,
            actor,
            &self.server_id,
            metadata,
            state.head_hash.clone(),
        );
        write_entry(&mut state, &entry)?;
        debug!("Appended audit entry: {}", entry.summary());
        Ok(entry)
    }

    pub async fn get_head_hash(&self) -> String {
        self.state.lock().await.head_hash.clone()
    }

    pub async fn get_entry_count(&self) -> u64 {
        self.state.lock().await.entry_count
    }

    pub async fn get_all_entries(&self) -> Result<Vec<AuditLogEntry>> {
        let _guard = self.state.lock().await;
        load_entries(&self.log_path)
    }

    pub async fn get_entries_by_action(&self, action: &str) -> Result<Vec<AuditLogEntry>> {
        Ok(self
            .get_all_entries()
            .await?
            .into_iter()
            .filter(|entry| entry.action == action)
            .collect())
    }

    pub fn log_path(&self) -> &str {
        &self.log_path
    }
}

/// Records an action when auditing is enabled. A failed write is logged and
/// swallowed: the governance operation it describes has already committed.
pub async fn record_best_effort(
    logger: Option<&AuditLogger>,
    action: &str,
    target: &str,
    actor: Option<&str>,
    metadata: serde_json::Value,
) {
    if let Some(logger) = logger {
        if let Err(e) = logger.record(action, target, actor, metadata).await {
            warn!("Failed to write audit entry {} for {}: {}", action, target, e);
        }
    }
}

fn write_entry(state: &mut LogState, entry: &AuditLogEntry) -> Result<()> {
    if !entry.verify_hash() {
        return Err(anyhow!("Invalid entry hash"));
    }

    let json = serde_json::to_string(entry)
        .map_err(|e| anyhow!("Failed to serialize entry: {}", e))?;
    writeln!(state.file, "{}", json).map_err(|e| anyhow!("Failed to write to audit log: {}", e))?;
    state
        .file
        .flush()
        .map_err(|e| anyhow!("Failed to flush audit log: {}", e))?;

    state.head_hash = entry.this_log_hash.clone();
    state.entry_count += 1;
    Ok(())
}

pub(crate) fn load_entries(log_path: &str) -> Result<Vec<AuditLogEntry>> {
    let path = Path::new(log_path);
    if !path.exists() {
        return Ok(vec![]);
    }

    let file = File::open(path).map_err(|e| anyhow!("Failed to open log file: {}", e))?;
    let reader = BufReader::new(file);
    let mut entries = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| anyhow!("Failed to read line {}: {}", line_num + 1, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: AuditLogEntry = serde_json::from_str(&line)
            .map_err(|e| anyhow!("Failed to parse entry at line {}: {}", line_num + 1, e))?;
        entries.push(entry);
    }

    Ok(entries)
}
