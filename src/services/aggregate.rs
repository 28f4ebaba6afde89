//! Time-window aggregation
//!
//! Buckets a user's expense records by UTC calendar day (history views) or by
//! top-level category (statistics) over an optional day window.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{SpendwiseError, SpendwiseResult};
use crate::models::{
    CategoryId, DateWindow, Direction, ExpenseRecord, Money, MoneyAccountId, UserId,
};
use crate::storage::Storage;

use super::category::{CategoryLineage, CategoryResolver, CategoryService, ResolvedCategory};

/// A record paired with its resolved category
#[derive(Debug, Clone)]
pub struct RecordLine {
    pub record: ExpenseRecord,
    pub category: ResolvedCategory,
}

impl RecordLine {
    pub fn direction(&self) -> Direction {
        self.category.direction
    }

    /// Unsigned amount this record contributes to totals
    pub fn total(&self) -> SpendwiseResult<Money> {
        Ok(self.record.total(self.direction())?)
    }

    /// Signed effect on the account balance
    pub fn effect(&self) -> SpendwiseResult<Money> {
        Ok(self.record.effect(self.direction())?)
    }
}

/// Records rolled up under one top-level category
#[derive(Debug, Clone)]
pub struct CategoryBucket {
    pub lineage: CategoryLineage,
    pub total_money: Money,
    /// Share of the direction group's total, two decimal places
    pub percentage: Decimal,
    pub items: Vec<RecordLine>,
}

/// Category statistics over a window
#[derive(Debug, Clone)]
pub struct Statistics {
    pub window: Option<DateWindow>,
    pub spending: Vec<CategoryBucket>,
    pub revenue: Vec<CategoryBucket>,
    pub total_spending: Money,
    pub total_revenue: Money,
}

impl Statistics {
    pub fn net(&self) -> Option<Money> {
        self.total_revenue.checked_sub(self.total_spending)
    }
}

/// Records of one UTC day
#[derive(Debug, Clone)]
pub struct DayBucket {
    pub date: NaiveDate,
    /// Net effect of the day's records
    pub total_money: Money,
    pub spending: Money,
    pub revenue: Money,
    pub records: Vec<RecordLine>,
}

/// Day buckets, newest first
#[derive(Debug, Clone)]
pub struct DailyHistory {
    pub window: Option<DateWindow>,
    pub days: Vec<DayBucket>,
    pub total_spending: Money,
    pub total_revenue: Money,
}

impl DailyHistory {
    pub fn record_count(&self) -> usize {
        self.days.iter().map(|d| d.records.len()).sum()
    }
}

/// Service for windowed aggregates
pub struct AggregateService<'a> {
    storage: &'a Storage,
}

impl<'a> AggregateService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Per-category totals and percentages for reportable records
    pub fn statistics(
        &self,
        user_id: UserId,
        window: Option<DateWindow>,
    ) -> SpendwiseResult<Statistics> {
        let resolver = self.resolver()?;
        let records = self.storage.ledger.records_for_user(user_id)?;

        let lines = resolve_lines(
            records
                .into_iter()
                .filter(|r| r.report && in_window(r, window.as_ref())),
            &resolver,
        )?;
        debug!(records = lines.len(), "computing statistics");

        let (spending, revenue): (Vec<_>, Vec<_>) = lines
            .into_iter()
            .partition(|line| line.direction() == Direction::Spending);

        let spending = bucket_by_lineage(spending)?;
        let revenue = bucket_by_lineage(revenue)?;

        Ok(Statistics {
            window,
            total_spending: checked_total(spending.iter().map(|b| b.total_money))?,
            total_revenue: checked_total(revenue.iter().map(|b| b.total_money))?,
            spending,
            revenue,
        })
    }

    /// Day-bucketed history of one account
    pub fn account_history(
        &self,
        user_id: UserId,
        account_id: MoneyAccountId,
        window: Option<DateWindow>,
    ) -> SpendwiseResult<DailyHistory> {
        let owned = self
            .storage
            .ledger
            .read(|ledger| ledger.owned_account(user_id, account_id).is_some())?;
        if !owned {
            return Err(SpendwiseError::account_not_found(account_id.to_string()));
        }

        let records = self.storage.ledger.records_for_account(account_id)?;
        self.daily(records, window)
    }

    /// Day-bucketed history across all of the user's accounts
    pub fn history(
        &self,
        user_id: UserId,
        window: Option<DateWindow>,
    ) -> SpendwiseResult<DailyHistory> {
        let records = self.storage.ledger.records_for_user(user_id)?;
        self.daily(records, window)
    }

    /// Records in a window that fall under any of `categories` (leaf or parent)
    pub fn records_in_category(
        &self,
        user_id: UserId,
        categories: &[CategoryId],
        window: Option<DateWindow>,
    ) -> SpendwiseResult<Vec<RecordLine>> {
        let resolver = self.resolver()?;
        let records = self.storage.ledger.records_for_user(user_id)?;

        let lines = resolve_lines(
            records.into_iter().filter(|r| in_window(r, window.as_ref())),
            &resolver,
        )?;
        Ok(lines
            .into_iter()
            .filter(|line| {
                categories
                    .iter()
                    .any(|id| *id == line.category.id || *id == line.category.lineage.id)
            })
            .collect())
    }

    fn daily(
        &self,
        records: Vec<ExpenseRecord>,
        window: Option<DateWindow>,
    ) -> SpendwiseResult<DailyHistory> {
        let resolver = self.resolver()?;
        let lines = resolve_lines(
            records.into_iter().filter(|r| in_window(r, window.as_ref())),
            &resolver,
        )?;

        let mut by_day: BTreeMap<NaiveDate, Vec<RecordLine>> = BTreeMap::new();
        for line in lines {
            by_day.entry(line.record.occur_day()).or_default().push(line);
        }

        let days = by_day
            .into_iter()
            .rev()
            .map(|(date, mut records)| {
                records.sort_by(|a, b| b.record.occur_date.cmp(&a.record.occur_date));
                let spending = direction_total(&records, Direction::Spending)?;
                let revenue = direction_total(&records, Direction::Revenue)?;
                Ok(DayBucket {
                    date,
                    total_money: revenue.checked_sub(spending).ok_or_else(overflow)?,
                    spending,
                    revenue,
                    records,
                })
            })
            .collect::<SpendwiseResult<Vec<DayBucket>>>()?;

        Ok(DailyHistory {
            window,
            total_spending: checked_total(days.iter().map(|d| d.spending))?,
            total_revenue: checked_total(days.iter().map(|d| d.revenue))?,
            days,
        })
    }

    fn resolver(&self) -> SpendwiseResult<CategoryResolver> {
        CategoryService::new(self.storage).resolver()
    }
}

fn in_window(record: &ExpenseRecord, window: Option<&DateWindow>) -> bool {
    window.map_or(true, |w| w.contains(record.occur_date))
}

fn resolve_lines(
    records: impl Iterator<Item = ExpenseRecord>,
    resolver: &CategoryResolver,
) -> SpendwiseResult<Vec<RecordLine>> {
    records
        .map(|record| {
            let category = resolver.resolve(record.cash_flow_category_id)?.clone();
            Ok(RecordLine { record, category })
        })
        .collect()
}

fn overflow() -> SpendwiseError {
    SpendwiseError::ArithmeticInvariantViolation("aggregate total overflows".into())
}

fn checked_total(amounts: impl IntoIterator<Item = Money>) -> SpendwiseResult<Money> {
    Money::checked_sum(amounts).ok_or_else(overflow)
}

/// Sum of line totals
pub(crate) fn line_total<'l>(
    lines: impl IntoIterator<Item = &'l RecordLine>,
) -> SpendwiseResult<Money> {
    lines.into_iter().try_fold(Money::zero(), |acc, line| {
        acc.checked_add(line.total()?).ok_or_else(overflow)
    })
}

fn direction_total(lines: &[RecordLine], direction: Direction) -> SpendwiseResult<Money> {
    line_total(lines.iter().filter(|l| l.direction() == direction))
}

/// Fold lines into one bucket per top-level category
///
/// Direct parent records and sub-category records land in the same bucket,
/// keyed by the parent id.
fn bucket_by_lineage(lines: Vec<RecordLine>) -> SpendwiseResult<Vec<CategoryBucket>> {
    let mut buckets: HashMap<CategoryId, CategoryBucket> = HashMap::new();

    for line in lines {
        let bucket = buckets
            .entry(line.category.lineage.id)
            .or_insert_with(|| CategoryBucket {
                lineage: line.category.lineage.clone(),
                total_money: Money::zero(),
                percentage: Decimal::ZERO,
                items: Vec::new(),
            });
        bucket.total_money = bucket
            .total_money
            .checked_add(line.total()?)
            .ok_or_else(overflow)?;
        bucket.items.push(line);
    }

    let grand_total = checked_total(buckets.values().map(|b| b.total_money))?;

    let mut buckets: Vec<_> = buckets
        .into_values()
        .map(|mut bucket| {
            bucket.percentage = bucket.total_money.percentage_of(grand_total);
            bucket
                .items
                .sort_by(|a, b| b.record.occur_date.cmp(&a.record.occur_date));
            bucket
        })
        .collect();

    buckets.sort_by(|a, b| {
        b.total_money
            .cmp(&a.total_money)
            .then_with(|| a.lineage.name.cmp(&b.lineage.name))
    });
    Ok(buckets)
}
