//! Account service
//!
//! Provides business logic for money account management including CRUD
//! operations, explicit balance edits and balance consistency checks.

use tracing::{info, warn};

use crate::audit::{AuditEntry, EntityType};
use crate::error::{SpendwiseError, SpendwiseResult};
use crate::models::{Money, MoneyAccount, MoneyAccountId, MoneyAccountType, MoneyAccountTypeId, UserId};
use crate::storage::{Ledger, Storage};

use super::category::CategoryService;
use super::ledger::derive_balance;

/// Input for a new money account
#[derive(Debug, Clone)]
pub struct NewMoneyAccount {
    pub name: String,
    pub money_account_type_id: MoneyAccountTypeId,
    pub opening_balance: Money,
    pub description: String,
    pub report: bool,
    pub select_bank: Option<String>,
    pub credit_limit_number: Option<Money>,
}

impl NewMoneyAccount {
    pub fn new(
        name: impl Into<String>,
        money_account_type_id: MoneyAccountTypeId,
        opening_balance: Money,
    ) -> Self {
        Self {
            name: name.into(),
            money_account_type_id,
            opening_balance,
            description: String::new(),
            report: true,
            select_bank: None,
            credit_limit_number: None,
        }
    }
}

/// Partial update of a money account's descriptive fields
#[derive(Debug, Clone, Default)]
pub struct MoneyAccountPatch {
    pub name: Option<String>,
    pub money_account_type_id: Option<MoneyAccountTypeId>,
    pub description: Option<String>,
    pub report: Option<bool>,
    pub select_bank: Option<Option<String>>,
    pub credit_limit_number: Option<Option<Money>>,
}

/// An account with its resolved type
#[derive(Debug, Clone)]
pub struct AccountSummary {
    pub account: MoneyAccount,
    /// None when the referenced type no longer exists
    pub account_type: Option<MoneyAccountType>,
}

/// Materialized balance compared with the balance replayed from records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceCheck {
    pub account_id: MoneyAccountId,
    pub materialized: Money,
    pub derived: Money,
    pub record_count: usize,
}

impl BalanceCheck {
    pub fn is_consistent(&self) -> bool {
        self.materialized == self.derived
    }

    /// Derived minus materialized, None on overflow
    pub fn drift(&self) -> Option<Money> {
        self.derived.checked_sub(self.materialized)
    }
}

/// Service for money account management
pub struct AccountService<'a> {
    storage: &'a Storage,
}

impl<'a> AccountService<'a> {
    /// Create a new account service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a new account
    pub fn create(&self, user_id: UserId, input: NewMoneyAccount) -> SpendwiseResult<MoneyAccount> {
        let account_type = self.account_type(input.money_account_type_id)?;

        let mut account = MoneyAccount::new(
            user_id,
            input.name.trim(),
            input.money_account_type_id,
            input.opening_balance,
        );
        account.description = input.description;
        account.report = input.report;
        account.select_bank = input.select_bank;
        account.credit_limit_number = input.credit_limit_number;
        account.conform_to_kind(account_type.kind);

        account
            .validate()
            .map_err(|e| SpendwiseError::Validation(e.to_string()))?;

        self.storage.ledger.transact(|ledger| {
            ensure_unique_name(ledger, user_id, &account.name, None)?;
            ledger.insert_account(account.clone());
            Ok(())
        })?;

        info!(account = %account.id, name = %account.name, balance = %account.account_balance, "money account created");
        self.storage.log_create(
            EntityType::MoneyAccount,
            account.id.to_string(),
            Some(account.name.clone()),
            &account,
        );

        Ok(account)
    }

    /// Get one of the user's accounts
    pub fn get(&self, user_id: UserId, id: MoneyAccountId) -> SpendwiseResult<MoneyAccount> {
        self.storage
            .ledger
            .read(|ledger| ledger.owned_account(user_id, id).cloned())?
            .ok_or_else(|| SpendwiseError::account_not_found(id.to_string()))
    }

    /// Find an account by name or ID string
    pub fn find(&self, user_id: UserId, identifier: &str) -> SpendwiseResult<Option<MoneyAccount>> {
        let accounts = self.storage.ledger.accounts_for_user(user_id)?;

        let needle = identifier.trim().to_lowercase();
        if let Some(account) = accounts.iter().find(|a| a.name.to_lowercase() == needle) {
            return Ok(Some(account.clone()));
        }

        if let Ok(id) = identifier.parse::<MoneyAccountId>() {
            return Ok(accounts.into_iter().find(|a| a.id == id));
        }

        Ok(None)
    }

    /// All of the user's accounts with their types, sorted by name
    pub fn list(&self, user_id: UserId) -> SpendwiseResult<Vec<AccountSummary>> {
        let types = self.storage.taxonomy.account_types()?;
        let accounts = self.storage.ledger.accounts_for_user(user_id)?;

        Ok(accounts
            .into_iter()
            .map(|account| AccountSummary {
                account_type: types
                    .iter()
                    .find(|t| t.id == account.money_account_type_id)
                    .cloned(),
                account,
            })
            .collect())
    }

    /// Update an account's descriptive fields
    ///
    /// Changing the account type drops the optional fields the new kind does
    /// not carry. The balance is never touched here.
    pub fn update(
        &self,
        user_id: UserId,
        id: MoneyAccountId,
        patch: MoneyAccountPatch,
    ) -> SpendwiseResult<MoneyAccount> {
        let new_type = match patch.money_account_type_id {
            Some(type_id) => Some(self.account_type(type_id)?),
            None => None,
        };

        let (before, after) = self.storage.ledger.transact(|ledger| {
            let account = ledger
                .owned_account_mut(user_id, id)
                .ok_or_else(|| SpendwiseError::account_not_found(id.to_string()))?;
            let before = account.clone();

            if let Some(name) = patch.name {
                account.name = name.trim().to_string();
            }
            if let Some(description) = patch.description {
                account.description = description;
            }
            if let Some(report) = patch.report {
                account.report = report;
            }
            if let Some(select_bank) = patch.select_bank {
                account.select_bank = select_bank;
            }
            if let Some(credit_limit) = patch.credit_limit_number {
                account.credit_limit_number = credit_limit;
            }
            if let Some(account_type) = &new_type {
                account.money_account_type_id = account_type.id;
                account.conform_to_kind(account_type.kind);
            }
            account.updated_at = chrono::Utc::now();

            account
                .validate()
                .map_err(|e| SpendwiseError::Validation(e.to_string()))?;
            let after = account.clone();

            ensure_unique_name(ledger, user_id, &after.name, Some(id))?;
            Ok((before, after))
        })?;

        info!(account = %id, "money account updated");
        self.storage.log_update(
            EntityType::MoneyAccount,
            id.to_string(),
            Some(after.name.clone()),
            &before,
            &after,
        );

        Ok(after)
    }

    /// Explicitly set an account's balance
    pub fn set_balance(
        &self,
        user_id: UserId,
        id: MoneyAccountId,
        balance: Money,
    ) -> SpendwiseResult<MoneyAccount> {
        let (before, after) = self.storage.ledger.transact(|ledger| {
            let account = ledger
                .owned_account_mut(user_id, id)
                .ok_or_else(|| SpendwiseError::account_not_found(id.to_string()))?;
            let before = account.clone();
            account.set_balance(balance).ok_or_else(|| {
                SpendwiseError::ArithmeticInvariantViolation(format!(
                    "opening balance of account {} overflows",
                    id
                ))
            })?;
            Ok((before, account.clone()))
        })?;

        info!(account = %id, from = %before.account_balance, to = %balance, "balance set");
        self.storage.log_update(
            EntityType::MoneyAccount,
            id.to_string(),
            Some(after.name.clone()),
            &before,
            &after,
        );

        Ok(after)
    }

    /// Delete an account together with its records
    ///
    /// Returns the removed account and how many records went with it.
    pub fn delete(&self, user_id: UserId, id: MoneyAccountId) -> SpendwiseResult<(MoneyAccount, usize)> {
        let (account, records) = self.storage.ledger.transact(|ledger| {
            let account = ledger
                .owned_account(user_id, id)
                .cloned()
                .ok_or_else(|| SpendwiseError::account_not_found(id.to_string()))?;

            let records: Vec<_> = ledger.records_for_account(id).cloned().collect();
            for record in &records {
                ledger.remove_record(record.id);
            }
            ledger.remove_account(id);

            Ok((account, records))
        })?;

        info!(account = %id, records = records.len(), "money account deleted");

        let mut entries = vec![AuditEntry::delete(
            EntityType::MoneyAccount,
            id.to_string(),
            Some(account.name.clone()),
            &account,
        )];
        entries.extend(records.iter().map(|r| {
            AuditEntry::delete(EntityType::ExpenseRecord, r.id.to_string(), None, r)
        }));
        self.storage.audit_batch(&entries);

        Ok((account, records.len()))
    }

    /// Compare the stored balance with the balance replayed from records
    pub fn check_balance(&self, user_id: UserId, id: MoneyAccountId) -> SpendwiseResult<BalanceCheck> {
        let resolver = CategoryService::new(self.storage).resolver()?;
        let account = self.get(user_id, id)?;
        let records = self.storage.ledger.records_for_account(id)?;

        Ok(BalanceCheck {
            account_id: id,
            materialized: account.account_balance,
            derived: derive_balance(&account, &records, &resolver)?,
            record_count: records.len(),
        })
    }

    /// Repair a drifted balance from the replayed value
    pub fn reconcile(&self, user_id: UserId, id: MoneyAccountId) -> SpendwiseResult<BalanceCheck> {
        let resolver = CategoryService::new(self.storage).resolver()?;

        let (check, snapshots) = self.storage.ledger.transact(|ledger| {
            let account = ledger
                .owned_account(user_id, id)
                .cloned()
                .ok_or_else(|| SpendwiseError::account_not_found(id.to_string()))?;
            let records: Vec<_> = ledger.records_for_account(id).cloned().collect();

            let check = BalanceCheck {
                account_id: id,
                materialized: account.account_balance,
                derived: derive_balance(&account, &records, &resolver)?,
                record_count: records.len(),
            };
            if check.is_consistent() {
                return Ok((check, None));
            }

            let stored = ledger
                .owned_account_mut(user_id, id)
                .ok_or_else(|| SpendwiseError::account_not_found(id.to_string()))?;
            stored.account_balance = check.derived;
            stored.updated_at = chrono::Utc::now();
            Ok((check, Some((account, stored.clone()))))
        })?;

        if let Some((before, after)) = snapshots {
            warn!(
                account = %id,
                stored = %check.materialized,
                derived = %check.derived,
                "repaired balance drift"
            );
            self.storage.log_update(
                EntityType::MoneyAccount,
                id.to_string(),
                Some(after.name.clone()),
                &before,
                &after,
            );
        }

        Ok(check)
    }

    fn account_type(&self, id: MoneyAccountTypeId) -> SpendwiseResult<MoneyAccountType> {
        self.storage
            .taxonomy
            .get_account_type(id)?
            .ok_or_else(|| SpendwiseError::account_type_not_found(id.to_string()))
    }
}

fn ensure_unique_name(
    ledger: &Ledger,
    user_id: UserId,
    name: &str,
    exclude: Option<MoneyAccountId>,
) -> SpendwiseResult<()> {
    let taken = ledger.accounts().any(|a| {
        a.user_id == user_id
            && Some(a.id) != exclude
            && a.name.to_lowercase() == name.to_lowercase()
    });

    if taken {
        return Err(SpendwiseError::Duplicate {
            entity_type: "Money account",
            identifier: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountKind;
    use crate::services::ledger::{LedgerService, NewExpenseRecord};
    use crate::services::testing::{account_type, category, create_test_storage, open_account};
    use chrono::Utc;

    #[test]
    fn test_create_account() {
        let (_temp, storage, user) = create_test_storage();
        let service = AccountService::new(&storage);
        let cash = account_type(&storage, AccountKind::Cash);

        let mut input = NewMoneyAccount::new("  Wallet ", cash, Money::from_major(250));
        input.select_bank = Some("ACME Bank".into());
        let account = service.create(user, input).unwrap();

        assert_eq!(account.name, "Wallet");
        assert_eq!(account.account_balance, Money::from_major(250));
        assert_eq!(account.opening_balance, Money::from_major(250));
        // cash accounts carry no bank
        assert!(account.select_bank.is_none());

        let listed = service.list(user).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].account_type.as_ref().unwrap().kind, AccountKind::Cash);
    }

    #[test]
    fn test_create_rejects_unknown_type_and_duplicates() {
        let (_temp, storage, user) = create_test_storage();
        let service = AccountService::new(&storage);

        let err = service
            .create(user, NewMoneyAccount::new("Wallet", MoneyAccountTypeId::new(), Money::zero()))
            .unwrap_err();
        assert!(err.is_not_found());

        open_account(&storage, user, "Wallet", 0);
        let cash = account_type(&storage, AccountKind::Cash);
        let err = service
            .create(user, NewMoneyAccount::new("wallet", cash, Money::zero()))
            .unwrap_err();
        assert!(matches!(err, SpendwiseError::Duplicate { .. }));

        // another user may reuse the name
        assert!(service
            .create(UserId::new(), NewMoneyAccount::new("Wallet", cash, Money::zero()))
            .is_ok());
    }

    #[test]
    fn test_find_by_name_or_id() {
        let (_temp, storage, user) = create_test_storage();
        let service = AccountService::new(&storage);
        let account = open_account(&storage, user, "Checking", 0);

        assert_eq!(service.find(user, "checking").unwrap().unwrap().id, account.id);
        assert_eq!(
            service.find(user, &account.id.to_string()).unwrap().unwrap().id,
            account.id
        );
        assert!(service.find(UserId::new(), "Checking").unwrap().is_none());
    }

    #[test]
    fn test_update_type_conforms_fields() {
        let (_temp, storage, user) = create_test_storage();
        let service = AccountService::new(&storage);
        let credit = account_type(&storage, AccountKind::CreditCard);
        let cash = account_type(&storage, AccountKind::Cash);

        let mut input = NewMoneyAccount::new("Visa", credit, Money::zero());
        input.select_bank = Some("ACME".into());
        input.credit_limit_number = Some(Money::from_major(5000));
        let account = service.create(user, input).unwrap();
        assert_eq!(account.credit_limit_number, Some(Money::from_major(5000)));

        let patch = MoneyAccountPatch {
            money_account_type_id: Some(cash),
            description: Some("now cash".into()),
            ..Default::default()
        };
        let updated = service.update(user, account.id, patch).unwrap();
        assert!(updated.select_bank.is_none());
        assert!(updated.credit_limit_number.is_none());
        assert_eq!(updated.description, "now cash");
        assert_eq!(updated.account_balance, account.account_balance);
    }

    #[test]
    fn test_set_balance_keeps_replay_consistent() {
        let (_temp, storage, user) = create_test_storage();
        let service = AccountService::new(&storage);
        let account = open_account(&storage, user, "Wallet", 1000);
        let food = category(&storage, "Food & Drink");

        LedgerService::new(&storage)
            .add_record(
                user,
                NewExpenseRecord::new(account.id, food, Money::from_major(100), Utc::now()),
            )
            .unwrap();

        let updated = service.set_balance(user, account.id, Money::from_major(2000)).unwrap();
        assert_eq!(updated.account_balance, Money::from_major(2000));
        assert_eq!(updated.opening_balance, Money::from_major(2100));
        assert!(service.check_balance(user, account.id).unwrap().is_consistent());
    }

    #[test]
    fn test_delete_removes_records() {
        let (_temp, storage, user) = create_test_storage();
        let service = AccountService::new(&storage);
        let account = open_account(&storage, user, "Wallet", 1000);
        let food = category(&storage, "Food & Drink");
        let ledger = LedgerService::new(&storage);
        for amount in [10, 20] {
            ledger
                .add_record(
                    user,
                    NewExpenseRecord::new(account.id, food, Money::from_major(amount), Utc::now()),
                )
                .unwrap();
        }

        let (deleted, removed) = service.delete(user, account.id).unwrap();
        assert_eq!(deleted.id, account.id);
        assert_eq!(removed, 2);
        assert!(storage.ledger.records_for_user(user).unwrap().is_empty());
        assert!(service.get(user, account.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_reconcile_repairs_drift() {
        let (_temp, storage, user) = create_test_storage();
        let service = AccountService::new(&storage);
        let account = open_account(&storage, user, "Wallet", 1000);

        storage
            .ledger
            .transact(|ledger| {
                ledger
                    .owned_account_mut(user, account.id)
                    .unwrap()
                    .account_balance = Money::from_major(999);
                Ok(())
            })
            .unwrap();

        let check = service.check_balance(user, account.id).unwrap();
        assert!(!check.is_consistent());
        assert_eq!(check.drift(), Some(Money::from_major(1)));

        let repaired = service.reconcile(user, account.id).unwrap();
        assert_eq!(repaired.derived, Money::from_major(1000));
        assert!(service.check_balance(user, account.id).unwrap().is_consistent());
    }
}
