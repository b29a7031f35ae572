//! Audit Log System
//!
//! Tamper-evident record of governance actions: each JSONL line carries the
//! hash of the line before it.

pub mod entry;
pub mod logger;
pub mod verify;

pub use entry::AuditLogEntry;
pub use logger::{record_best_effort, AuditLogger};
pub use verify::{
    load_audit_log_from_file, verify_audit_log, verify_audit_log_detailed, verify_audit_log_file,
};
