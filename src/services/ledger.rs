//! Ledger balance engine
//!
//! Adds, updates and deletes expense records while keeping every money
//! account's balance equal to its opening balance plus the signed effect of
//! its records. Each operation reads, checks and writes inside one
//! `LedgerRepository::transact` call, so the record change and the balance
//! change commit together.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::audit::{AuditEntry, EntityType};
use crate::error::{SpendwiseError, SpendwiseResult};
use crate::models::{
    CategoryId, Direction, ExpenseRecord, ExpenseRecordId, MoneyAccount, MoneyAccountId, Money,
    UserId,
};
use crate::storage::{Ledger, Storage};

use super::category::{CategoryResolver, CategoryService};

/// Input for a new expense record
#[derive(Debug, Clone)]
pub struct NewExpenseRecord {
    pub money_account_id: MoneyAccountId,
    pub cash_flow_category_id: CategoryId,
    pub amount_of_money: Money,
    pub cost_incurred: Money,
    pub cost_incurred_category_id: Option<CategoryId>,
    pub occur_date: DateTime<Utc>,
    pub report: bool,
    pub description: String,
    pub trip_or_event: String,
    pub location: String,
    pub pay_for_who: String,
    pub collect_from_who: String,
    pub repayment_date: Option<DateTime<Utc>>,
    pub debt_collection_date: Option<DateTime<Utc>>,
    pub proof_image: Option<String>,
}

impl NewExpenseRecord {
    /// Required fields only; everything else takes its default
    pub fn new(
        money_account_id: MoneyAccountId,
        cash_flow_category_id: CategoryId,
        amount_of_money: Money,
        occur_date: DateTime<Utc>,
    ) -> Self {
        Self {
            money_account_id,
            cash_flow_category_id,
            amount_of_money,
            cost_incurred: Money::zero(),
            cost_incurred_category_id: None,
            occur_date,
            report: true,
            description: String::new(),
            trip_or_event: String::new(),
            location: String::new(),
            pay_for_who: String::new(),
            collect_from_who: String::new(),
            repayment_date: None,
            debt_collection_date: None,
            proof_image: None,
        }
    }

    fn into_record(self, user_id: UserId) -> ExpenseRecord {
        let mut record = ExpenseRecord::new(
            user_id,
            self.money_account_id,
            self.cash_flow_category_id,
            self.amount_of_money,
            self.occur_date,
        );
        record.cost_incurred = self.cost_incurred;
        record.cost_incurred_category_id = self.cost_incurred_category_id;
        record.report = self.report;
        record.description = self.description;
        record.trip_or_event = self.trip_or_event;
        record.location = self.location;
        record.pay_for_who = self.pay_for_who;
        record.collect_from_who = self.collect_from_who;
        record.repayment_date = self.repayment_date;
        record.debt_collection_date = self.debt_collection_date;
        record.proof_image = self.proof_image;
        record
    }
}

/// Partial update of an expense record
///
/// `None` keeps the stored value. Nested options clear a field with
/// `Some(None)`.
#[derive(Debug, Clone, Default)]
pub struct ExpenseRecordPatch {
    pub money_account_id: Option<MoneyAccountId>,
    pub cash_flow_category_id: Option<CategoryId>,
    pub amount_of_money: Option<Money>,
    pub cost_incurred: Option<Money>,
    pub cost_incurred_category_id: Option<Option<CategoryId>>,
    pub occur_date: Option<DateTime<Utc>>,
    pub report: Option<bool>,
    pub description: Option<String>,
    pub trip_or_event: Option<String>,
    pub location: Option<String>,
    pub pay_for_who: Option<String>,
    pub collect_from_who: Option<String>,
    pub repayment_date: Option<Option<DateTime<Utc>>>,
    pub debt_collection_date: Option<Option<DateTime<Utc>>>,
    pub proof_image: Option<Option<String>>,
}

impl ExpenseRecordPatch {
    fn apply_to(self, record: &mut ExpenseRecord) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }

        set(&mut record.money_account_id, self.money_account_id);
        set(&mut record.cash_flow_category_id, self.cash_flow_category_id);
        set(&mut record.amount_of_money, self.amount_of_money);
        set(&mut record.cost_incurred, self.cost_incurred);
        set(
            &mut record.cost_incurred_category_id,
            self.cost_incurred_category_id,
        );
        set(&mut record.occur_date, self.occur_date);
        set(&mut record.report, self.report);
        set(&mut record.description, self.description);
        set(&mut record.trip_or_event, self.trip_or_event);
        set(&mut record.location, self.location);
        set(&mut record.pay_for_who, self.pay_for_who);
        set(&mut record.collect_from_who, self.collect_from_who);
        set(&mut record.repayment_date, self.repayment_date);
        set(&mut record.debt_collection_date, self.debt_collection_date);
        set(&mut record.proof_image, self.proof_image);
    }
}

/// Balance of one account before and after a ledger operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChange {
    pub account_id: MoneyAccountId,
    pub before: Money,
    pub after: Money,
}

/// Result of a ledger operation
#[derive(Debug, Clone)]
pub struct LedgerOutcome {
    /// The record as stored (or as it was, for deletes)
    pub record: ExpenseRecord,
    /// New balance of the record's account
    pub balance: Money,
    /// Every account whose balance the operation touched
    pub changes: Vec<BalanceChange>,
}

/// Balance an account should have, replayed from its records
pub fn derive_balance(
    account: &MoneyAccount,
    records: &[ExpenseRecord],
    resolver: &CategoryResolver,
) -> SpendwiseResult<Money> {
    let mut balance = account.opening_balance;
    for record in records.iter().filter(|r| r.money_account_id == account.id) {
        let effect = record.effect(resolver.direction(record.cash_flow_category_id)?)?;
        balance = balance
            .checked_add(effect)
            .ok_or_else(|| balance_overflow(account.id))?;
    }
    Ok(balance)
}

/// Service for expense record mutations
pub struct LedgerService<'a> {
    storage: &'a Storage,
}

impl<'a> LedgerService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    fn resolver(&self) -> SpendwiseResult<CategoryResolver> {
        CategoryService::new(self.storage).resolver()
    }

    /// Get one of the user's records
    pub fn get_record(&self, user_id: UserId, id: ExpenseRecordId) -> SpendwiseResult<ExpenseRecord> {
        self.storage
            .ledger
            .read(|ledger| ledger.owned_record(user_id, id).cloned())?
            .ok_or_else(|| SpendwiseError::record_not_found(id.to_string()))
    }

    /// Insert a record and apply its effect to its account
    pub fn add_record(
        &self,
        user_id: UserId,
        input: NewExpenseRecord,
    ) -> SpendwiseResult<LedgerOutcome> {
        let resolver = self.resolver()?;
        let mut record = input.into_record(user_id);

        let direction = prepare_record(&mut record, &resolver)?;
        let effect = record.effect(direction)?;

        let touched = self.storage.ledger.transact(|ledger| {
            let mut tracker = BalanceTracker::default();
            tracker.apply(ledger, user_id, record.money_account_id, effect)?;
            ledger.insert_record(record.clone());
            tracker.finish_single(ledger)
        })?;
        let change = touched.change.clone();

        info!(
            record = %record.id,
            account = %record.money_account_id,
            %direction,
            effect = %effect,
            balance = %change.after,
            "expense record added"
        );

        let mut entries = vec![AuditEntry::create(
            EntityType::ExpenseRecord,
            record.id.to_string(),
            record_label(&record),
            &record,
        )];
        entries.push(touched.audit_entry());
        self.storage.audit_batch(&entries);

        Ok(LedgerOutcome {
            balance: change.after,
            changes: vec![change],
            record,
        })
    }

    /// Change a record, reversing its old effect and applying the new one
    ///
    /// The old effect is computed under the stored category's direction and
    /// the new effect under the new category's direction, so reclassifying
    /// between spending and revenue moves the balance by both effects. When
    /// the record moves to another account, the old account is reversed and
    /// the new account receives the new effect.
    pub fn update_record(
        &self,
        user_id: UserId,
        id: ExpenseRecordId,
        patch: ExpenseRecordPatch,
    ) -> SpendwiseResult<LedgerOutcome> {
        let resolver = self.resolver()?;

        let (old, new, touched) = self.storage.ledger.transact(|ledger| {
            let old = ledger
                .owned_record(user_id, id)
                .cloned()
                .ok_or_else(|| SpendwiseError::record_not_found(id.to_string()))?;
            let old_effect = old.effect(resolver.direction(old.cash_flow_category_id)?)?;

            let mut new = old.clone();
            patch.apply_to(&mut new);
            let new_direction = prepare_record(&mut new, &resolver)?;
            let new_effect = new.effect(new_direction)?;
            new.touch();

            debug!(
                record = %id,
                old_effect = %old_effect,
                new_effect = %new_effect,
                "re-applying record effect"
            );

            let mut tracker = BalanceTracker::default();
            tracker.apply(ledger, user_id, old.money_account_id, -old_effect)?;
            tracker.apply(ledger, user_id, new.money_account_id, new_effect)?;
            ledger.insert_record(new.clone());

            Ok((old, new, tracker.finish(ledger)))
        })?;

        let balance = touched
            .iter()
            .find(|t| t.change.account_id == new.money_account_id)
            .map(|t| t.change.after)
            .unwrap_or_default();
        info!(record = %id, balance = %balance, accounts = touched.len(), "expense record updated");

        let mut entries = vec![AuditEntry::update(
            EntityType::ExpenseRecord,
            id.to_string(),
            record_label(&new),
            &old,
            &new,
        )];
        entries.extend(touched.iter().map(Touched::audit_entry));
        self.storage.audit_batch(&entries);

        Ok(LedgerOutcome {
            record: new,
            balance,
            changes: touched.into_iter().map(|t| t.change).collect(),
        })
    }

    /// Remove a record and reverse its effect
    pub fn delete_record(
        &self,
        user_id: UserId,
        id: ExpenseRecordId,
    ) -> SpendwiseResult<LedgerOutcome> {
        let resolver = self.resolver()?;

        let (record, touched) = self.storage.ledger.transact(|ledger| {
            let record = ledger
                .owned_record(user_id, id)
                .cloned()
                .ok_or_else(|| SpendwiseError::record_not_found(id.to_string()))?;
            let effect = record.effect(resolver.direction(record.cash_flow_category_id)?)?;

            let mut tracker = BalanceTracker::default();
            tracker.apply(ledger, user_id, record.money_account_id, -effect)?;
            ledger.remove_record(id);

            Ok((record, tracker.finish_single(ledger)?))
        })?;
        let change = touched.change.clone();

        info!(record = %id, balance = %change.after, "expense record deleted");

        let mut entries = vec![AuditEntry::delete(
            EntityType::ExpenseRecord,
            id.to_string(),
            record_label(&record),
            &record,
        )];
        entries.push(touched.audit_entry());
        self.storage.audit_batch(&entries);

        Ok(LedgerOutcome {
            record,
            balance: change.after,
            changes: vec![change],
        })
    }
}

/// Resolve the record's categories, drop cost fields revenue does not carry,
/// and check its amounts. Returns the record's direction.
fn prepare_record(
    record: &mut ExpenseRecord,
    resolver: &CategoryResolver,
) -> SpendwiseResult<Direction> {
    let direction = resolver.direction(record.cash_flow_category_id)?;
    record.conform_to_direction(direction);

    if let Some(cost_category) = record.cost_incurred_category_id {
        resolver.resolve(cost_category)?;
    }

    record.validate()?;

    Ok(direction)
}

fn balance_overflow(account_id: MoneyAccountId) -> SpendwiseError {
    SpendwiseError::ArithmeticInvariantViolation(format!(
        "balance of account {} overflows",
        account_id
    ))
}

/// Accounts touched inside one transaction, with their first-seen balance
#[derive(Default)]
struct BalanceTracker {
    touched: Vec<(MoneyAccountId, Money, MoneyAccount)>,
}

impl BalanceTracker {
    fn apply(
        &mut self,
        ledger: &mut Ledger,
        user_id: UserId,
        account_id: MoneyAccountId,
        delta: Money,
    ) -> SpendwiseResult<()> {
        let account = ledger
            .owned_account_mut(user_id, account_id)
            .ok_or_else(|| SpendwiseError::account_not_found(account_id.to_string()))?;

        if !self.touched.iter().any(|(id, _, _)| *id == account_id) {
            self.touched
                .push((account_id, account.account_balance, account.clone()));
        }
        account
            .apply_delta(delta)
            .ok_or_else(|| balance_overflow(account_id))?;
        Ok(())
    }

    /// Balance changes plus before/after account snapshots
    fn finish(self, ledger: &Ledger) -> Vec<Touched> {
        self.touched
            .into_iter()
            .filter_map(|(id, before, snapshot)| {
                let after = ledger.account(id)?.clone();
                Some(Touched {
                    change: BalanceChange {
                        account_id: id,
                        before,
                        after: after.account_balance,
                    },
                    before: snapshot,
                    after,
                })
            })
            .collect()
    }

    /// Finish an operation that touched exactly one account
    fn finish_single(self, ledger: &Ledger) -> SpendwiseResult<Touched> {
        self.finish(ledger).into_iter().next().ok_or_else(|| {
            SpendwiseError::Storage("ledger operation touched no account".into())
        })
    }
}

struct Touched {
    change: BalanceChange,
    before: MoneyAccount,
    after: MoneyAccount,
}

impl Touched {
    fn audit_entry(&self) -> AuditEntry {
        AuditEntry::update(
            EntityType::MoneyAccount,
            self.after.id.to_string(),
            Some(self.after.name.clone()),
            &self.before,
            &self.after,
        )
    }
}

fn record_label(record: &ExpenseRecord) -> Option<String> {
    if record.description.is_empty() {
        None
    } else {
        Some(record.description.clone())
    }
}
