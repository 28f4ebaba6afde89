//! Spending limit service
//!
//! CRUD for spending limits. Every write checks the limit's scope: its
//! accounts must belong to the user, its categories and repeat policy must
//! exist.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::audit::EntityType;
use crate::error::{SpendwiseError, SpendwiseResult};
use crate::models::{
    CategoryId, Money, MoneyAccountId, RepeatId, SpendingLimit, SpendingLimitId, UserId,
};
use crate::storage::Storage;

use super::category::CategoryService;

/// Input for a new spending limit
#[derive(Debug, Clone)]
pub struct NewSpendingLimit {
    pub name: String,
    pub amount_of_money: Money,
    pub repeat: RepeatId,
    pub money_account_ids: Vec<MoneyAccountId>,
    pub cash_flow_category_ids: Vec<CategoryId>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Partial update of a spending limit
#[derive(Debug, Clone, Default)]
pub struct SpendingLimitPatch {
    pub name: Option<String>,
    pub amount_of_money: Option<Money>,
    pub repeat: Option<RepeatId>,
    pub money_account_ids: Option<Vec<MoneyAccountId>>,
    pub cash_flow_category_ids: Option<Vec<CategoryId>>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<Option<DateTime<Utc>>>,
}

/// Service for spending limit management
pub struct SpendingLimitService<'a> {
    storage: &'a Storage,
}

impl<'a> SpendingLimitService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a limit
    pub fn add(&self, user_id: UserId, input: NewSpendingLimit) -> SpendwiseResult<SpendingLimit> {
        let mut limit = SpendingLimit::new(
            user_id,
            input.name.trim(),
            input.amount_of_money,
            input.repeat,
            input.start_time,
        );
        limit.money_account_ids = dedup(input.money_account_ids);
        limit.cash_flow_category_ids = dedup(input.cash_flow_category_ids);
        limit.end_time = input.end_time;

        self.check(&limit)?;

        self.storage.limits.upsert(limit.clone())?;

        info!(limit = %limit.id, name = %limit.name, amount = %limit.amount_of_money, "spending limit created");
        self.storage.log_create(
            EntityType::SpendingLimit,
            limit.id.to_string(),
            Some(limit.name.clone()),
            &limit,
        );

        Ok(limit)
    }

    /// Change a limit
    pub fn update(
        &self,
        user_id: UserId,
        id: SpendingLimitId,
        patch: SpendingLimitPatch,
    ) -> SpendwiseResult<SpendingLimit> {
        let before = self.get(user_id, id)?;
        let mut limit = before.clone();

        if let Some(name) = patch.name {
            limit.name = name.trim().to_string();
        }
        if let Some(amount) = patch.amount_of_money {
            limit.amount_of_money = amount;
        }
        if let Some(repeat) = patch.repeat {
            limit.repeat = repeat;
        }
        if let Some(accounts) = patch.money_account_ids {
            limit.money_account_ids = dedup(accounts);
        }
        if let Some(categories) = patch.cash_flow_category_ids {
            limit.cash_flow_category_ids = dedup(categories);
        }
        if let Some(start) = patch.start_time {
            limit.start_time = start;
        }
        if let Some(end) = patch.end_time {
            limit.end_time = end;
        }
        limit.updated_at = Utc::now();

        self.check(&limit)?;

        self.storage.limits.upsert(limit.clone())?;

        info!(limit = %id, "spending limit updated");
        self.storage.log_update(
            EntityType::SpendingLimit,
            id.to_string(),
            Some(limit.name.clone()),
            &before,
            &limit,
        );

        Ok(limit)
    }

    /// Delete a limit
    pub fn delete(&self, user_id: UserId, id: SpendingLimitId) -> SpendwiseResult<SpendingLimit> {
        let limit = self.get(user_id, id)?;

        self.storage.limits.delete(id)?;

        info!(limit = %id, "spending limit deleted");
        self.storage.log_delete(
            EntityType::SpendingLimit,
            id.to_string(),
            Some(limit.name.clone()),
            &limit,
        );

        Ok(limit)
    }

    /// Get one of the user's limits
    pub fn get(&self, user_id: UserId, id: SpendingLimitId) -> SpendwiseResult<SpendingLimit> {
        self.storage
            .limits
            .get(id)?
            .filter(|l| l.user_id == user_id)
            .ok_or_else(|| SpendwiseError::limit_not_found(id.to_string()))
    }

    /// Find a limit by name or ID string
    pub fn find(&self, user_id: UserId, identifier: &str) -> SpendwiseResult<Option<SpendingLimit>> {
        if let Some(limit) = self.storage.limits.find_by_name(user_id, identifier)? {
            return Ok(Some(limit));
        }

        if let Ok(id) = identifier.parse::<SpendingLimitId>() {
            return Ok(self
                .storage
                .limits
                .get(id)?
                .filter(|l| l.user_id == user_id));
        }

        Ok(None)
    }

    /// The user's limits, most recent start first
    pub fn list(&self, user_id: UserId) -> SpendwiseResult<Vec<SpendingLimit>> {
        self.storage.limits.get_for_user(user_id)
    }

    fn check(&self, limit: &SpendingLimit) -> SpendwiseResult<()> {
        limit.validate().map_err(|e| {
            if e.is_arithmetic() {
                SpendwiseError::ArithmeticInvariantViolation(e.to_string())
            } else {
                SpendwiseError::Validation(e.to_string())
            }
        })?;

        if self.storage.taxonomy.get_repeat(limit.repeat)?.is_none() {
            return Err(SpendwiseError::repeat_not_found(limit.repeat.to_string()));
        }

        for account_id in &limit.money_account_ids {
            let owned = self
                .storage
                .ledger
                .read(|ledger| ledger.owned_account(limit.user_id, *account_id).is_some())?;
            if !owned {
                return Err(SpendwiseError::InvalidScope(format!(
                    "money account {} does not belong to the user",
                    account_id
                )));
            }
        }

        let resolver = CategoryService::new(self.storage).resolver()?;
        for category_id in &limit.cash_flow_category_ids {
            if resolver.resolve(*category_id).is_err() {
                return Err(SpendwiseError::InvalidScope(format!(
                    "category {} does not exist",
                    category_id
                )));
            }
        }

        if let Some(other) = self.storage.limits.find_by_name(limit.user_id, &limit.name)? {
            if other.id != limit.id {
                return Err(SpendwiseError::Duplicate {
                    entity_type: "Spending limit",
                    identifier: limit.name.clone(),
                });
            }
        }

        Ok(())
    }
}

fn dedup<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut unique = Vec::with_capacity(items.len());
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{category, create_test_storage, open_account, repeat};
    use crate::models::RepeatCadence;
    use chrono::{Duration, TimeZone};

    fn input(storage: &Storage, accounts: Vec<MoneyAccountId>) -> NewSpendingLimit {
        let start = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        NewSpendingLimit {
            name: "February".into(),
            amount_of_money: Money::from_major(2000),
            repeat: repeat(storage, RepeatCadence::Monthly),
            money_account_ids: accounts,
            cash_flow_category_ids: Vec::new(),
            start_time: start,
            end_time: Some(start + Duration::days(28)),
        }
    }

    #[test]
    fn test_add_and_list() {
        let (_temp, storage, user) = create_test_storage();
        let wallet = open_account(&storage, user, "Wallet", 0);
        let service = SpendingLimitService::new(&storage);

        let limit = service
            .add(user, input(&storage, vec![wallet.id, wallet.id]))
            .unwrap();
        assert_eq!(limit.money_account_ids, vec![wallet.id]);
        assert_eq!(limit.window().unwrap().total_days(), 29);

        assert_eq!(service.list(user).unwrap().len(), 1);
        assert!(service.list(UserId::new()).unwrap().is_empty());
        assert_eq!(service.find(user, "february").unwrap().unwrap().id, limit.id);
    }

    #[test]
    fn test_scope_is_checked() {
        let (_temp, storage, user) = create_test_storage();
        let service = SpendingLimitService::new(&storage);
        let stranger_account = open_account(&storage, UserId::new(), "Theirs", 0);

        let err = service
            .add(user, input(&storage, vec![stranger_account.id]))
            .unwrap_err();
        assert!(err.is_invalid_scope());

        let wallet = open_account(&storage, user, "Wallet", 0);
        let mut bad_category = input(&storage, vec![wallet.id]);
        bad_category.cash_flow_category_ids = vec![CategoryId::new()];
        assert!(service.add(user, bad_category).unwrap_err().is_invalid_scope());

        let mut bad_repeat = input(&storage, vec![wallet.id]);
        bad_repeat.repeat = RepeatId::new();
        assert!(service.add(user, bad_repeat).unwrap_err().is_not_found());

        let err = service.add(user, input(&storage, vec![])).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_negative_amount_is_rejected() {
        let (_temp, storage, user) = create_test_storage();
        let wallet = open_account(&storage, user, "Wallet", 0);
        let mut negative = input(&storage, vec![wallet.id]);
        negative.amount_of_money = Money::from_major(-1);

        let err = SpendingLimitService::new(&storage)
            .add(user, negative)
            .unwrap_err();
        assert!(matches!(err, SpendwiseError::ArithmeticInvariantViolation(_)));
    }

    #[test]
    fn test_update_and_delete() {
        let (_temp, storage, user) = create_test_storage();
        let wallet = open_account(&storage, user, "Wallet", 0);
        let food = category(&storage, "Food & Drink");
        let service = SpendingLimitService::new(&storage);
        let limit = service.add(user, input(&storage, vec![wallet.id])).unwrap();

        let patch = SpendingLimitPatch {
            amount_of_money: Some(Money::from_major(1500)),
            cash_flow_category_ids: Some(vec![food]),
            end_time: Some(None),
            ..Default::default()
        };
        let updated = service.update(user, limit.id, patch).unwrap();
        assert_eq!(updated.amount_of_money, Money::from_major(1500));
        assert_eq!(updated.window().unwrap().total_days(), 1);

        let patch = SpendingLimitPatch {
            end_time: Some(Some(limit.start_time - Duration::days(1))),
            ..Default::default()
        };
        assert!(service.update(user, limit.id, patch).unwrap_err().is_validation());

        assert!(service.delete(UserId::new(), limit.id).unwrap_err().is_not_found());
        service.delete(user, limit.id).unwrap();
        assert!(service.get(user, limit.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_limits_persist() {
        let (_temp, storage, user) = create_test_storage();
        let wallet = open_account(&storage, user, "Wallet", 0);
        let limit = SpendingLimitService::new(&storage)
            .add(user, input(&storage, vec![wallet.id]))
            .unwrap();

        let reloaded = Storage::new(storage.paths().clone()).unwrap();
        reloaded.load_all().unwrap();
        assert!(reloaded.limits.get(limit.id).unwrap().is_some());
    }
}
