//! Spending limit repository for JSON storage
//!
//! Manages loading and saving spending limits to limits.json. Each write
//! locks the document, re-reads it and persists before returning.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{SpendwiseError, SpendwiseResult};
use crate::models::{SpendingLimit, SpendingLimitId, UserId};

use super::file_io::{read_json, write_json_atomic, DocumentLock};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct LimitData {
    limits: Vec<SpendingLimit>,
}

/// Repository for spending limit persistence
pub struct SpendingLimitRepository {
    path: PathBuf,
    data: RwLock<HashMap<SpendingLimitId, SpendingLimit>>,
}

impl SpendingLimitRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load limits from disk
    pub fn load(&self) -> SpendwiseResult<()> {
        let file_data: LimitData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            SpendwiseError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        for limit in file_data.limits {
            data.insert(limit.id, limit);
        }

        Ok(())
    }

    pub fn get(&self, id: SpendingLimitId) -> SpendwiseResult<Option<SpendingLimit>> {
        let data = self.data.read().map_err(|e| {
            SpendwiseError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(&id).cloned())
    }

    /// The user's limits, most recent start first
    pub fn get_for_user(&self, user_id: UserId) -> SpendwiseResult<Vec<SpendingLimit>> {
        let data = self.data.read().map_err(|e| {
            SpendwiseError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut limits: Vec<_> = data
            .values()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        limits.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(a.name.cmp(&b.name)));
        Ok(limits)
    }

    /// Find one of the user's limits by name (case-insensitive)
    pub fn find_by_name(
        &self,
        user_id: UserId,
        name: &str,
    ) -> SpendwiseResult<Option<SpendingLimit>> {
        let needle = name.trim().to_lowercase();
        Ok(self
            .get_for_user(user_id)?
            .into_iter()
            .find(|l| l.name.to_lowercase() == needle))
    }

    /// Insert or update a limit
    pub fn upsert(&self, limit: SpendingLimit) -> SpendwiseResult<()> {
        self.modify(|data| {
            data.insert(limit.id, limit);
        })
    }

    /// Delete a limit
    pub fn delete(&self, id: SpendingLimitId) -> SpendwiseResult<bool> {
        self.modify(|data| data.remove(&id).is_some())
    }

    /// Apply a change to the on-disk limits under the document lock
    fn modify<T>(
        &self,
        change: impl FnOnce(&mut HashMap<SpendingLimitId, SpendingLimit>) -> T,
    ) -> SpendwiseResult<T> {
        let _lock = DocumentLock::acquire(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            SpendwiseError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        let file_data: LimitData = read_json(&self.path)?;
        let mut draft: HashMap<_, _> = file_data.limits.into_iter().map(|l| (l.id, l)).collect();
        let output = change(&mut draft);

        let mut limits: Vec<_> = draft.values().cloned().collect();
        limits.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        write_json_atomic(&self.path, &LimitData { limits })?;

        *data = draft;
        Ok(output)
    }
}
