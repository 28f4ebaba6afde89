//! Ledger repository for JSON storage
//!
//! Money accounts and expense records live in one document (`ledger.json`)
//! so that a balance change and the record change that caused it are written
//! by the same atomic file replace. Mutations hold an exclusive lock on the
//! document and start from its on-disk state, so concurrent processes never
//! overwrite each other's changes.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SpendwiseError, SpendwiseResult};
use crate::models::{ExpenseRecord, ExpenseRecordId, MoneyAccount, MoneyAccountId, UserId};

use super::file_io::{read_json, write_json_atomic, DocumentLock};

/// Serializable ledger document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LedgerData {
    accounts: Vec<MoneyAccount>,
    records: Vec<ExpenseRecord>,
}

/// In-memory ledger state
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    accounts: HashMap<MoneyAccountId, MoneyAccount>,
    records: HashMap<ExpenseRecordId, ExpenseRecord>,
}

impl Ledger {
    fn from_data(data: LedgerData) -> Self {
        Self {
            accounts: data.accounts.into_iter().map(|a| (a.id, a)).collect(),
            records: data.records.into_iter().map(|r| (r.id, r)).collect(),
        }
    }

    fn to_data(&self) -> LedgerData {
        let mut accounts: Vec<_> = self.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));

        let mut records: Vec<_> = self.records.values().cloned().collect();
        records.sort_by(|a, b| {
            a.occur_date
                .cmp(&b.occur_date)
                .then(a.created_at.cmp(&b.created_at))
        });

        LedgerData { accounts, records }
    }

    pub fn account(&self, id: MoneyAccountId) -> Option<&MoneyAccount> {
        self.accounts.get(&id)
    }

    /// An account, only if `user_id` owns it
    pub fn owned_account(&self, user_id: UserId, id: MoneyAccountId) -> Option<&MoneyAccount> {
        self.accounts.get(&id).filter(|a| a.user_id == user_id)
    }

    pub fn owned_account_mut(
        &mut self,
        user_id: UserId,
        id: MoneyAccountId,
    ) -> Option<&mut MoneyAccount> {
        self.accounts.get_mut(&id).filter(|a| a.user_id == user_id)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &MoneyAccount> {
        self.accounts.values()
    }

    pub fn insert_account(&mut self, account: MoneyAccount) {
        self.accounts.insert(account.id, account);
    }

    pub fn remove_account(&mut self, id: MoneyAccountId) -> Option<MoneyAccount> {
        self.accounts.remove(&id)
    }

    /// A record, only if `user_id` owns it
    pub fn owned_record(&self, user_id: UserId, id: ExpenseRecordId) -> Option<&ExpenseRecord> {
        self.records.get(&id).filter(|r| r.user_id == user_id)
    }

    pub fn records(&self) -> impl Iterator<Item = &ExpenseRecord> {
        self.records.values()
    }

    pub fn records_for_account(
        &self,
        account_id: MoneyAccountId,
    ) -> impl Iterator<Item = &ExpenseRecord> {
        self.records
            .values()
            .filter(move |r| r.money_account_id == account_id)
    }

    pub fn insert_record(&mut self, record: ExpenseRecord) {
        self.records.insert(record.id, record);
    }

    pub fn remove_record(&mut self, id: ExpenseRecordId) -> Option<ExpenseRecord> {
        self.records.remove(&id)
    }
}

/// Repository for ledger persistence
pub struct LedgerRepository {
    path: PathBuf,
    state: RwLock<Ledger>,
}

impl LedgerRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            state: RwLock::new(Ledger::default()),
        }
    }

    /// Load the ledger from disk
    pub fn load(&self) -> SpendwiseResult<()> {
        let file_data: LedgerData = read_json(&self.path)?;
        debug!(
            accounts = file_data.accounts.len(),
            records = file_data.records.len(),
            "ledger loaded"
        );

        let mut state = self.state.write().map_err(|e| {
            SpendwiseError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        *state = Ledger::from_data(file_data);
        Ok(())
    }

    /// Run a read-only query against the current ledger
    pub fn read<T>(&self, query: impl FnOnce(&Ledger) -> T) -> SpendwiseResult<T> {
        let state = self.state.read().map_err(|e| {
            SpendwiseError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(query(&state))
    }

    /// Run a mutation as one unit of work
    ///
    /// The document lock and the in-memory write lock are held throughout.
    /// The ledger is re-read from disk, the closure edits a draft copy of it,
    /// and the draft is written and published only if both the closure and
    /// the write succeed; otherwise the disk is untouched and memory holds the
    /// re-read state.
    pub fn transact<T>(
        &self,
        mutation: impl FnOnce(&mut Ledger) -> SpendwiseResult<T>,
    ) -> SpendwiseResult<T> {
        let _lock = DocumentLock::acquire(&self.path)?;

        let mut state = self.state.write().map_err(|e| {
            SpendwiseError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        let current: LedgerData = read_json(&self.path)?;
        *state = Ledger::from_data(current);

        let mut draft = state.clone();
        let output = mutation(&mut draft)?;

        write_json_atomic(&self.path, &draft.to_data())?;
        *state = draft;
        Ok(output)
    }

    pub fn get_account(&self, id: MoneyAccountId) -> SpendwiseResult<Option<MoneyAccount>> {
        self.read(|ledger| ledger.account(id).cloned())
    }

    /// The user's accounts sorted by name
    pub fn accounts_for_user(&self, user_id: UserId) -> SpendwiseResult<Vec<MoneyAccount>> {
        self.read(|ledger| {
            let mut accounts: Vec<_> = ledger
                .accounts()
                .filter(|a| a.user_id == user_id)
                .cloned()
                .collect();
            accounts.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
            accounts
        })
    }

    pub fn get_record(&self, id: ExpenseRecordId) -> SpendwiseResult<Option<ExpenseRecord>> {
        self.read(|ledger| ledger.records.get(&id).cloned())
    }

    /// The user's records, oldest first
    pub fn records_for_user(&self, user_id: UserId) -> SpendwiseResult<Vec<ExpenseRecord>> {
        self.read(|ledger| {
            let mut records: Vec<_> = ledger
                .records()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect();
            records.sort_by(|a, b| a.occur_date.cmp(&b.occur_date));
            records
        })
    }

    pub fn records_for_account(
        &self,
        account_id: MoneyAccountId,
    ) -> SpendwiseResult<Vec<ExpenseRecord>> {
        self.read(|ledger| {
            let mut records: Vec<_> = ledger.records_for_account(account_id).cloned().collect();
            records.sort_by(|a, b| a.occur_date.cmp(&b.occur_date));
            records
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryId, Money, MoneyAccountTypeId};
    use chrono::Utc;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, LedgerRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = LedgerRepository::new(temp_dir.path().join("ledger.json"));
        (temp_dir, repo)
    }

    fn account(user_id: UserId) -> MoneyAccount {
        MoneyAccount::new(
            user_id,
            "Wallet",
            MoneyAccountTypeId::new(),
            Money::from_major(1000),
        )
    }

    #[test]
    fn test_transact_persists_both_documents_parts() {
        let (temp_dir, repo) = create_test_repo();
        let user = UserId::new();
        let account = account(user);
        let account_id = account.id;

        repo.transact(|ledger| {
            ledger.insert_account(account);
            let record = ExpenseRecord::new(
                user,
                account_id,
                CategoryId::new(),
                Money::from_major(200),
                Utc::now(),
            );
            ledger
                .owned_account_mut(user, account_id)
                .unwrap()
                .apply_delta(-record.amount_of_money)
                .unwrap();
            ledger.insert_record(record);
            Ok(())
        })
        .unwrap();

        let reloaded = LedgerRepository::new(temp_dir.path().join("ledger.json"));
        reloaded.load().unwrap();
        let stored = reloaded.get_account(account_id).unwrap().unwrap();
        assert_eq!(stored.account_balance, Money::from_major(800));
        assert_eq!(reloaded.records_for_account(account_id).unwrap().len(), 1);
    }

    #[test]
    fn test_failed_transact_changes_nothing() {
        let (temp_dir, repo) = create_test_repo();
        let user = UserId::new();
        let account = account(user);
        let account_id = account.id;
        repo.transact(|ledger| {
            ledger.insert_account(account);
            Ok(())
        })
        .unwrap();
        let on_disk = std::fs::read_to_string(temp_dir.path().join("ledger.json")).unwrap();

        let result: SpendwiseResult<()> = repo.transact(|ledger| {
            ledger
                .owned_account_mut(user, account_id)
                .unwrap()
                .apply_delta(Money::from_major(-500))
                .unwrap();
            Err(SpendwiseError::category_not_found("missing"))
        });

        assert!(result.unwrap_err().is_not_found());
        let stored = repo.get_account(account_id).unwrap().unwrap();
        assert_eq!(stored.account_balance, Money::from_major(1000));
        assert_eq!(
            std::fs::read_to_string(temp_dir.path().join("ledger.json")).unwrap(),
            on_disk
        );
    }

    #[test]
    fn test_ownership_filters() {
        let (_temp_dir, repo) = create_test_repo();
        let owner = UserId::new();
        let account = account(owner);
        let account_id = account.id;
        repo.transact(|ledger| {
            ledger.insert_account(account);
            Ok(())
        })
        .unwrap();

        let stranger = UserId::new();
        assert!(repo
            .read(|l| l.owned_account(stranger, account_id).is_none())
            .unwrap());
        assert!(repo.accounts_for_user(stranger).unwrap().is_empty());
        assert_eq!(repo.accounts_for_user(owner).unwrap().len(), 1);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();
        assert!(repo.read(|l| l.accounts().count() == 0).unwrap());
    }

    #[test]
    fn test_transact_starts_from_disk_state() {
        let (temp_dir, first) = create_test_repo();
        let second = LedgerRepository::new(temp_dir.path().join("ledger.json"));
        let user = UserId::new();
        let account = account(user);
        let account_id = account.id;

        first
            .transact(|ledger| {
                ledger.insert_account(account);
                Ok(())
            })
            .unwrap();
        second.load().unwrap();

        // Both repositories now hold the same snapshot; each debits once.
        first
            .transact(|ledger| {
                ledger
                    .owned_account_mut(user, account_id)
                    .unwrap()
                    .apply_delta(Money::from_major(-100))
                    .unwrap();
                Ok(())
            })
            .unwrap();
        second
            .transact(|ledger| {
                ledger
                    .owned_account_mut(user, account_id)
                    .unwrap()
                    .apply_delta(Money::from_major(-200))
                    .unwrap();
                Ok(())
            })
            .unwrap();

        let fresh = LedgerRepository::new(temp_dir.path().join("ledger.json"));
        fresh.load().unwrap();
        let stored = fresh.get_account(account_id).unwrap().unwrap();
        assert_eq!(stored.account_balance, Money::from_major(700));
    }
}
