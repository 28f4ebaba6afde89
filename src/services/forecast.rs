//! Spending-limit forecaster
//!
//! Evaluates a spending limit against the spending records in its scope and
//! projects where the window will end at the current pace.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use tracing::debug;

use crate::error::{SpendwiseError, SpendwiseResult};
use crate::models::{
    DateWindow, Direction, Money, MoneyAccountId, SpendingLimit, SpendingLimitId, UserId,
};
use crate::storage::Storage;

use super::aggregate::{line_total, RecordLine};
use super::category::{CategoryResolver, CategoryService};

/// Forecast figures for one limit on one day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forecast {
    pub limit_amount: Money,
    pub total_days: i64,
    /// Days from the window's first day through today, within `0..=total_days`
    pub elapsed_days: i64,
    pub remaining_days: i64,
    pub total_spent: Money,
    /// Negative when over budget
    pub remaining_amount: Money,
    /// Spent per elapsed day
    pub actual_rate: Money,
    /// Per-day spend that would land exactly on the limit, never negative
    pub should_rate: Money,
    /// Projected spend at the end of the window
    pub expected_total: Money,
}

impl Forecast {
    /// Compute forecast figures
    ///
    /// `elapsed_days` may fall outside the window; it is clamped to
    /// `0..=total_days` first. Figures that overflow are an arithmetic
    /// invariant violation.
    pub fn compute(
        limit_amount: Money,
        total_spent: Money,
        total_days: i64,
        elapsed_days: i64,
    ) -> SpendwiseResult<Self> {
        let total_days = total_days.max(0);
        let elapsed_days = elapsed_days.clamp(0, total_days);
        let remaining_days = total_days - elapsed_days;
        let remaining_amount = limit_amount
            .checked_sub(total_spent)
            .ok_or_else(forecast_overflow)?;

        let exact_rate = if elapsed_days == 0 {
            Money::zero()
        } else {
            total_spent.checked_div(elapsed_days).unwrap_or_default()
        };

        let should_rate = if remaining_days > 0 {
            remaining_amount
                .checked_div(remaining_days)
                .unwrap_or_default()
                .round_cents()
                .floor_zero()
        } else {
            Money::zero()
        };

        let expected_total = exact_rate
            .checked_mul(remaining_days)
            .and_then(|projected| projected.checked_add(total_spent))
            .ok_or_else(forecast_overflow)?
            .round_cents();

        Ok(Self {
            limit_amount,
            total_days,
            elapsed_days,
            remaining_days,
            total_spent,
            remaining_amount,
            actual_rate: exact_rate.round_cents(),
            should_rate,
            expected_total,
        })
    }

    pub fn is_over_budget(&self) -> bool {
        self.remaining_amount.is_negative()
    }

    /// Whether the current pace stays within the limit
    pub fn is_on_track(&self) -> bool {
        self.expected_total <= self.limit_amount
    }
}

fn forecast_overflow() -> SpendwiseError {
    SpendwiseError::ArithmeticInvariantViolation("forecast figure overflows".into())
}

/// A limit evaluated in full
#[derive(Debug, Clone)]
pub struct SpendingLimitReport {
    pub limit: SpendingLimit,
    pub window: DateWindow,
    /// Spending records counted against the limit, newest first
    pub records: Vec<RecordLine>,
    pub forecast: Forecast,
}

/// Spent-to-date summary of one limit
#[derive(Debug, Clone)]
pub struct SpendingLimitSummary {
    pub limit: SpendingLimit,
    pub window: DateWindow,
    pub total_spent: Money,
}

impl SpendingLimitSummary {
    pub fn remaining_amount(&self) -> Option<Money> {
        self.limit.amount_of_money.checked_sub(self.total_spent)
    }
}

/// Service for spending-limit evaluation
pub struct ForecastService<'a> {
    storage: &'a Storage,
}

impl<'a> ForecastService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Evaluate a limit as of today (UTC)
    pub fn evaluate(&self, user_id: UserId, id: SpendingLimitId) -> SpendwiseResult<SpendingLimitReport> {
        self.evaluate_on(user_id, id, Utc::now().date_naive())
    }

    /// Evaluate a limit as of `today`
    pub fn evaluate_on(
        &self,
        user_id: UserId,
        id: SpendingLimitId,
        today: NaiveDate,
    ) -> SpendwiseResult<SpendingLimitReport> {
        let limit = self
            .storage
            .limits
            .get(id)?
            .filter(|l| l.user_id == user_id)
            .ok_or_else(|| SpendwiseError::limit_not_found(id.to_string()))?;

        let resolver = CategoryService::new(self.storage).resolver()?;
        let (window, records) = self.scoped_records(&limit, &resolver)?;

        let total_spent = line_total(&records)?;
        let forecast = Forecast::compute(
            limit.amount_of_money,
            total_spent,
            window.total_days(),
            window.days_through(today),
        )?;

        debug!(
            limit = %limit.id,
            records = records.len(),
            spent = %total_spent,
            elapsed = forecast.elapsed_days,
            "spending limit evaluated"
        );

        Ok(SpendingLimitReport {
            limit,
            window,
            records,
            forecast,
        })
    }

    /// Spent-to-date for every limit the user owns
    pub fn evaluate_all(&self, user_id: UserId) -> SpendwiseResult<Vec<SpendingLimitSummary>> {
        let resolver = CategoryService::new(self.storage).resolver()?;

        self.storage
            .limits
            .get_for_user(user_id)?
            .into_iter()
            .map(|limit| {
                let (window, records) = self.scoped_records(&limit, &resolver)?;
                Ok(SpendingLimitSummary {
                    total_spent: line_total(&records)?,
                    window,
                    limit,
                })
            })
            .collect()
    }

    /// In-window spending records of the limit's accounts
    fn scoped_records(
        &self,
        limit: &SpendingLimit,
        resolver: &CategoryResolver,
    ) -> SpendwiseResult<(DateWindow, Vec<RecordLine>)> {
        let window = limit
            .window()
            .map_err(|e| SpendwiseError::Validation(e.to_string()))?;

        let accounts: HashSet<MoneyAccountId> = limit.money_account_ids.iter().copied().collect();

        let records = self.storage.ledger.read(|ledger| {
            let mut records = Vec::new();
            for account_id in &accounts {
                if ledger.owned_account(limit.user_id, *account_id).is_none() {
                    return Err(SpendwiseError::InvalidScope(format!(
                        "spending limit '{}' references account {} the user does not own",
                        limit.name, account_id
                    )));
                }
                records.extend(
                    ledger
                        .records_for_account(*account_id)
                        .filter(|r| window.contains(r.occur_date))
                        .cloned(),
                );
            }
            Ok(records)
        })??;

        let mut lines = Vec::with_capacity(records.len());
        for record in records {
            let category = resolver.resolve(record.cash_flow_category_id)?;
            if category.direction != Direction::Spending {
                continue;
            }
            lines.push(RecordLine {
                category: category.clone(),
                record,
            });
        }
        lines.sort_by(|a, b| b.record.occur_date.cmp(&a.record.occur_date));

        Ok((window, lines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryId, RepeatId};
    use crate::services::ledger::{LedgerService, NewExpenseRecord};
    use crate::services::testing::{category, create_test_storage, open_account};
    use chrono::{DateTime, Duration, TimeZone};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 10, 0, 0).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn money(s: &str) -> Money {
        Money::parse(s).unwrap()
    }

    fn store_limit(
        storage: &Storage,
        user: UserId,
        amount: i64,
        accounts: Vec<MoneyAccountId>,
        categories: Vec<CategoryId>,
        days: i64,
    ) -> SpendingLimit {
        let mut limit = SpendingLimit::new(
            user,
            "Monthly",
            Money::from_major(amount),
            RepeatId::new(),
            at(1),
        );
        limit.money_account_ids = accounts;
        limit.cash_flow_category_ids = categories;
        limit.end_time = Some(at(1) + Duration::days(days - 1));
        storage.limits.upsert(limit.clone()).unwrap();
        limit
    }

    fn spend(
        storage: &Storage,
        user: UserId,
        account: MoneyAccountId,
        category: CategoryId,
        amount: i64,
        cost: i64,
        day: u32,
    ) {
        let mut input =
            NewExpenseRecord::new(account, category, Money::from_major(amount), at(day));
        input.cost_incurred = Money::from_major(cost);
        LedgerService::new(storage).add_record(user, input).unwrap();
    }

    #[test]
    fn test_over_budget_scenario() {
        let forecast = Forecast::compute(
            Money::from_major(3_000_000),
            Money::from_major(10_000_000),
            30,
            10,
        )
        .unwrap();

        assert_eq!(forecast.remaining_amount, Money::from_major(-7_000_000));
        assert_eq!(forecast.actual_rate, Money::from_major(1_000_000));
        assert_eq!(forecast.remaining_days, 20);
        assert_eq!(forecast.should_rate, Money::zero());
        assert_eq!(forecast.expected_total, Money::from_major(30_000_000));
        assert!(forecast.is_over_budget());
        assert!(!forecast.is_on_track());
    }

    #[test]
    fn test_under_budget_rates() {
        let forecast =
            Forecast::compute(Money::from_major(3000), Money::from_major(1000), 30, 10).unwrap();
        assert_eq!(forecast.actual_rate, Money::from_major(100));
        assert_eq!(forecast.should_rate, Money::from_major(100));
        assert_eq!(forecast.expected_total, Money::from_major(3000));
        assert!(forecast.is_on_track());
    }

    #[test]
    fn test_rates_round_half_away_from_zero() {
        let forecast =
            Forecast::compute(Money::from_major(100), Money::from_major(10), 7, 3).unwrap();
        // 10 / 3 and 90 / 4
        assert_eq!(forecast.actual_rate, money("3.33"));
        assert_eq!(forecast.should_rate, money("22.50"));
        // 10/3 * 4 + 10
        assert_eq!(forecast.expected_total, money("23.33"));

        let forecast = Forecast::compute(Money::from_major(1), money("0.125"), 2, 1).unwrap();
        assert_eq!(forecast.actual_rate, money("0.13"));
    }

    #[test]
    fn test_overflowing_figures_are_an_invariant_violation() {
        let max = Money::new(rust_decimal::Decimal::MAX);
        let err = Forecast::compute(-max, Money::from_major(1), 30, 10).unwrap_err();
        assert!(matches!(err, SpendwiseError::ArithmeticInvariantViolation(_)));

        // pace of max per day over the remaining days
        let err = Forecast::compute(max, max, 30, 1).unwrap_err();
        assert!(matches!(err, SpendwiseError::ArithmeticInvariantViolation(_)));
    }

    #[test]
    fn test_before_window_opens() {
        let forecast = Forecast::compute(Money::from_major(300), Money::zero(), 30, -4).unwrap();
        assert_eq!(forecast.elapsed_days, 0);
        assert_eq!(forecast.actual_rate, Money::zero());
        assert_eq!(forecast.remaining_days, 30);
        assert_eq!(forecast.should_rate, Money::from_major(10));
        assert_eq!(forecast.expected_total, Money::zero());
    }

    #[test]
    fn test_after_window_closes() {
        let forecast =
            Forecast::compute(Money::from_major(300), Money::from_major(150), 30, 45).unwrap();
        assert_eq!(forecast.elapsed_days, 30);
        assert_eq!(forecast.remaining_days, 0);
        assert_eq!(forecast.should_rate, Money::zero());
        assert_eq!(forecast.actual_rate, Money::from_major(5));
        assert_eq!(forecast.expected_total, Money::from_major(150));
    }

    #[test]
    fn test_evaluate_counts_only_scoped_spending() {
        let (_temp, storage, user) = create_test_storage();
        let wallet = open_account(&storage, user, "Wallet", 0);
        let bank = open_account(&storage, user, "Bank", 0);
        let outside = open_account(&storage, user, "Savings", 0);
        let food = category(&storage, "Food & Drink");
        let salary = category(&storage, "Salary");

        spend(&storage, user, wallet.id, food, 4_000_000, 0, 2);
        spend(&storage, user, bank.id, food, 5_900_000, 100_000, 9);
        spend(&storage, user, wallet.id, salary, 8_000_000, 0, 3);
        spend(&storage, user, outside.id, food, 1_000, 0, 3);
        spend(&storage, user, wallet.id, food, 1_000, 0, 31);

        let limit = store_limit(&storage, user, 3_000_000, vec![wallet.id, bank.id], vec![], 30);
        let report = ForecastService::new(&storage)
            .evaluate_on(user, limit.id, date(10))
            .unwrap();

        assert_eq!(report.records.len(), 2);
        assert_eq!(report.forecast.total_days, 30);
        assert_eq!(report.forecast.elapsed_days, 10);
        assert_eq!(report.forecast.total_spent, Money::from_major(10_000_000));
        assert_eq!(report.forecast.expected_total, Money::from_major(30_000_000));
        assert_eq!(report.forecast.should_rate, Money::zero());
    }

    #[test]
    fn test_category_scope_does_not_narrow_records() {
        let (_temp, storage, user) = create_test_storage();
        let wallet = open_account(&storage, user, "Wallet", 0);
        let food = category(&storage, "Food & Drink");
        let coffee = category(&storage, "Coffee");
        let transport = category(&storage, "Transport");

        spend(&storage, user, wallet.id, coffee, 30, 0, 2);
        spend(&storage, user, wallet.id, transport, 70, 0, 2);

        let limit = store_limit(&storage, user, 1000, vec![wallet.id], vec![food], 30);
        let report = ForecastService::new(&storage)
            .evaluate_on(user, limit.id, date(2))
            .unwrap();
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.forecast.total_spent, Money::from_major(100));
    }

    #[test]
    fn test_evaluate_is_repeatable() {
        let (_temp, storage, user) = create_test_storage();
        let wallet = open_account(&storage, user, "Wallet", 0);
        let food = category(&storage, "Food & Drink");
        spend(&storage, user, wallet.id, food, 33, 1, 5);

        let limit = store_limit(&storage, user, 500, vec![wallet.id], vec![], 7);
        let service = ForecastService::new(&storage);
        let first = service.evaluate_on(user, limit.id, date(6)).unwrap();
        let second = service.evaluate_on(user, limit.id, date(6)).unwrap();
        assert_eq!(first.forecast, second.forecast);
    }

    #[test]
    fn test_dangling_scope_is_invalid() {
        let (_temp, storage, user) = create_test_storage();
        let wallet = open_account(&storage, user, "Wallet", 0);

        let limit = store_limit(&storage, user, 500, vec![MoneyAccountId::new()], vec![], 7);
        let err = ForecastService::new(&storage)
            .evaluate_on(user, limit.id, date(2))
            .unwrap_err();
        assert!(err.is_invalid_scope());

        storage.ledger.transact(|ledger| {
            ledger.remove_account(wallet.id);
            Ok(())
        }).unwrap();
        let limit = store_limit(&storage, user, 500, vec![wallet.id], vec![], 7);
        let err = ForecastService::new(&storage)
            .evaluate_on(user, limit.id, date(2))
            .unwrap_err();
        assert!(err.is_invalid_scope());
    }

    #[test]
    fn test_other_users_limit_is_not_found() {
        let (_temp, storage, user) = create_test_storage();
        let wallet = open_account(&storage, user, "Wallet", 0);
        let limit = store_limit(&storage, user, 500, vec![wallet.id], vec![], 7);

        let err = ForecastService::new(&storage)
            .evaluate_on(UserId::new(), limit.id, date(2))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_evaluate_all_reports_spent() {
        let (_temp, storage, user) = create_test_storage();
        let wallet = open_account(&storage, user, "Wallet", 0);
        let food = category(&storage, "Food & Drink");
        spend(&storage, user, wallet.id, food, 40, 2, 1);

        store_limit(&storage, user, 100, vec![wallet.id], vec![], 1);
        store_limit(&storage, user, 100, vec![wallet.id], vec![], 30);

        let summaries = ForecastService::new(&storage).evaluate_all(user).unwrap();
        assert_eq!(summaries.len(), 2);
        assert!(summaries.iter().all(|s| s.total_spent == Money::from_major(42)));
        assert_eq!(summaries[0].remaining_amount(), Some(Money::from_major(58)));
    }
}
