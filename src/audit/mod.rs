//! Audit logging for ledger mutations
//!
//! Every committed create, update and delete is appended to a JSONL audit
//! log with before/after snapshots of the entity.
//!
//! - `AuditEntry`: one logged operation on one entity.
//! - `AuditLogger`: appends entries to the log and reads them back.
//! - `generate_diff`: one-line summary of the fields an update changed.

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
