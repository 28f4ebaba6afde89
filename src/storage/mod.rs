//! Storage layer for Spendwise
//!
//! Provides JSON file storage with atomic writes and an append-only audit
//! log of every committed mutation.

pub mod file_io;
pub mod init;
pub mod ledger;
pub mod limits;
pub mod taxonomy;

pub use file_io::{read_json, write_json_atomic};
pub use init::initialize_storage;
pub use ledger::{Ledger, LedgerRepository};
pub use limits::SpendingLimitRepository;
pub use taxonomy::{TaxonomyData, TaxonomyRepository};

use serde::Serialize;
use tracing::warn;

use crate::audit::{AuditEntry, AuditLogger, EntityType};
use crate::config::paths::SpendwisePaths;
use crate::error::SpendwiseResult;

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: SpendwisePaths,
    audit: AuditLogger,
    pub ledger: LedgerRepository,
    pub taxonomy: TaxonomyRepository,
    pub limits: SpendingLimitRepository,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: SpendwisePaths) -> SpendwiseResult<Self> {
        paths.ensure_directories()?;

        Ok(Self {
            audit: AuditLogger::new(paths.audit_log()),
            ledger: LedgerRepository::new(paths.ledger_file()),
            taxonomy: TaxonomyRepository::new(paths.taxonomy_file()),
            limits: SpendingLimitRepository::new(paths.limits_file()),
            paths,
        })
    }

    pub fn paths(&self) -> &SpendwisePaths {
        &self.paths
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Load all data from disk
    pub fn load_all(&self) -> SpendwiseResult<()> {
        self.ledger.load()?;
        self.taxonomy.load()?;
        self.limits.load()?;
        Ok(())
    }

    /// Check if storage has been initialized
    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }

    /// Record audit entries for a mutation that has already committed
    ///
    /// The data write is durable at this point, so a failing audit append is
    /// reported in the log instead of failing the operation.
    pub fn audit_batch(&self, entries: &[AuditEntry]) {
        if let Err(e) = self.audit.log_batch(entries) {
            warn!(error = %e, "failed to append audit entries");
        }
    }

    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) {
        self.audit_batch(&[AuditEntry::create(
            entity_type,
            entity_id,
            entity_name,
            entity,
        )]);
    }

    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) {
        self.audit_batch(&[AuditEntry::update(
            entity_type,
            entity_id,
            entity_name,
            before,
            after,
        )]);
    }

    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) {
        self.audit_batch(&[AuditEntry::delete(
            entity_type,
            entity_id,
            entity_name,
            entity,
        )]);
    }
}
