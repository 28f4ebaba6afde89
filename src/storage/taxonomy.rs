//! Taxonomy repository for JSON storage
//!
//! Cash-flow categories, money account types and repeat policies are seeded
//! once by `init` and only read afterwards.

use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::{SpendwiseError, SpendwiseResult};
use crate::models::{
    CashFlowCategory, MoneyAccountType, MoneyAccountTypeId, RepeatId, SpendingLimitRepeat,
};

use super::file_io::{read_json, write_json_atomic};

/// Serializable taxonomy document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyData {
    pub categories: Vec<CashFlowCategory>,
    pub account_types: Vec<MoneyAccountType>,
    pub repeats: Vec<SpendingLimitRepeat>,
}

impl TaxonomyData {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.account_types.is_empty() && self.repeats.is_empty()
    }
}

/// Repository for taxonomy persistence
pub struct TaxonomyRepository {
    path: PathBuf,
    data: RwLock<TaxonomyData>,
}

impl TaxonomyRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(TaxonomyData::default()),
        }
    }

    /// Load the taxonomy from disk
    pub fn load(&self) -> SpendwiseResult<()> {
        let file_data: TaxonomyData = read_json(&self.path)?;
        for category in &file_data.categories {
            category
                .validate()
                .map_err(|e| SpendwiseError::Storage(format!("Invalid taxonomy: {}", e)))?;
        }

        *self.write_lock()? = file_data;
        Ok(())
    }

    /// Replace the whole taxonomy and persist it
    pub fn replace(&self, data: TaxonomyData) -> SpendwiseResult<()> {
        let mut current = self.write_lock()?;
        write_json_atomic(&self.path, &data)?;
        *current = data;
        Ok(())
    }

    fn write_lock(&self) -> SpendwiseResult<std::sync::RwLockWriteGuard<'_, TaxonomyData>> {
        self.data
            .write()
            .map_err(|e| SpendwiseError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    fn read<T>(&self, query: impl FnOnce(&TaxonomyData) -> T) -> SpendwiseResult<T> {
        let data = self
            .data
            .read()
            .map_err(|e| SpendwiseError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        Ok(query(&data))
    }

    pub fn is_empty(&self) -> SpendwiseResult<bool> {
        self.read(|data| data.is_empty())
    }

    pub fn categories(&self) -> SpendwiseResult<Vec<CashFlowCategory>> {
        self.read(|data| data.categories.clone())
    }

    pub fn account_types(&self) -> SpendwiseResult<Vec<MoneyAccountType>> {
        self.read(|data| data.account_types.clone())
    }

    pub fn get_account_type(
        &self,
        id: MoneyAccountTypeId,
    ) -> SpendwiseResult<Option<MoneyAccountType>> {
        self.read(|data| data.account_types.iter().find(|t| t.id == id).cloned())
    }

    /// Find an account type by name or kind label (case-insensitive)
    pub fn find_account_type(&self, name: &str) -> SpendwiseResult<Option<MoneyAccountType>> {
        let needle = name.trim().to_lowercase();
        self.read(|data| {
            data.account_types
                .iter()
                .find(|t| {
                    t.name.to_lowercase() == needle
                        || t.kind.to_string().to_lowercase() == needle
                })
                .cloned()
        })
    }

    pub fn repeats(&self) -> SpendwiseResult<Vec<SpendingLimitRepeat>> {
        self.read(|data| data.repeats.clone())
    }

    pub fn get_repeat(&self, id: RepeatId) -> SpendwiseResult<Option<SpendingLimitRepeat>> {
        self.read(|data| data.repeats.iter().find(|r| r.id == id).cloned())
    }

    /// Find a repeat policy by name or cadence (case-insensitive)
    pub fn find_repeat(&self, name: &str) -> SpendwiseResult<Option<SpendingLimitRepeat>> {
        let needle = name.trim().to_lowercase();
        self.read(|data| {
            data.repeats
                .iter()
                .find(|r| {
                    r.name.to_lowercase() == needle
                        || r.cadence.to_string().to_lowercase() == needle
                })
                .cloned()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountKind, CashFlowGroup, Direction, RepeatCadence};
    use tempfile::TempDir;

    fn sample() -> TaxonomyData {
        TaxonomyData {
            categories: vec![CashFlowCategory::new(
                "Food",
                "",
                Direction::Spending,
                CashFlowGroup::Spending,
            )
            .with_sub_category("Coffee", "")],
            account_types: vec![MoneyAccountType::new("Cash", "", AccountKind::Cash)],
            repeats: vec![SpendingLimitRepeat::new("Every month", RepeatCadence::Monthly)],
        }
    }

    #[test]
    fn test_replace_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("taxonomy.json");
        let repo = TaxonomyRepository::new(path.clone());
        assert!(repo.is_empty().unwrap());

        repo.replace(sample()).unwrap();

        let reloaded = TaxonomyRepository::new(path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.categories().unwrap()[0].sub_categories.len(), 1);
        assert!(!reloaded.is_empty().unwrap());
    }

    #[test]
    fn test_lookups() {
        let temp_dir = TempDir::new().unwrap();
        let repo = TaxonomyRepository::new(temp_dir.path().join("taxonomy.json"));
        repo.replace(sample()).unwrap();

        let cash = repo.find_account_type("cash").unwrap().unwrap();
        assert_eq!(repo.get_account_type(cash.id).unwrap(), Some(cash));
        assert!(repo.find_repeat("monthly").unwrap().is_some());
        assert!(repo.find_repeat("Every month").unwrap().is_some());
        assert!(repo.find_repeat("weekly").unwrap().is_none());
    }
}
