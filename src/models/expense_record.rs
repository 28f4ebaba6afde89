//! Expense record model
//!
//! An expense record is one dated movement of money on one account. Its
//! category decides whether it is spending or revenue.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::category::Direction;
use super::ids::{CategoryId, ExpenseRecordId, MoneyAccountId, UserId};
use super::money::Money;

/// A single spending or revenue entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Unique identifier
    pub id: ExpenseRecordId,

    /// Owning user
    pub user_id: UserId,

    /// Account the record moves money on
    pub money_account_id: MoneyAccountId,

    /// Leaf category (parent or sub-category id)
    pub cash_flow_category_id: CategoryId,

    /// Amount, never negative
    pub amount_of_money: Money,

    /// Extra cost paid on top of the amount (fees), never negative
    #[serde(default)]
    pub cost_incurred: Money,

    /// Category the incurred cost is filed under
    #[serde(default)]
    pub cost_incurred_category_id: Option<CategoryId>,

    /// When the money moved
    pub occur_date: DateTime<Utc>,

    /// Whether the record counts in statistics
    #[serde(default = "default_true")]
    pub report: bool,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub trip_or_event: String,

    #[serde(default)]
    pub location: String,

    /// Who the money was paid for
    #[serde(default)]
    pub pay_for_who: String,

    /// Who the money is collected from
    #[serde(default)]
    pub collect_from_who: String,

    #[serde(default)]
    pub repayment_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub debt_collection_date: Option<DateTime<Utc>>,

    /// Reference to an uploaded receipt image
    #[serde(default)]
    pub proof_image: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl ExpenseRecord {
    /// Create a new record
    pub fn new(
        user_id: UserId,
        money_account_id: MoneyAccountId,
        cash_flow_category_id: CategoryId,
        amount_of_money: Money,
        occur_date: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ExpenseRecordId::new(),
            user_id,
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
            created_at: now,
            updated_at: now,
        }
    }

    /// Signed effect of this record on its account under `direction`
    pub fn effect(&self, direction: Direction) -> Result<Money, RecordValidationError> {
        direction
            .effect(self.amount_of_money, self.cost_incurred)
            .ok_or(RecordValidationError::AmountOverflow)
    }

    /// Unsigned total this record contributes to aggregates under `direction`
    pub fn total(&self, direction: Direction) -> Result<Money, RecordValidationError> {
        direction
            .total(self.amount_of_money, self.cost_incurred)
            .ok_or(RecordValidationError::AmountOverflow)
    }

    /// UTC calendar day the record occurred on
    pub fn occur_day(&self) -> NaiveDate {
        self.occur_date.date_naive()
    }

    /// Drop cost fields that do not apply to `direction`
    pub fn conform_to_direction(&mut self, direction: Direction) {
        if direction == Direction::Revenue {
            self.cost_incurred = Money::zero();
            self.cost_incurred_category_id = None;
        }
    }

    /// Stamp the record as modified
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Validate the record
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.amount_of_money.is_negative() {
            return Err(RecordValidationError::NegativeAmount(self.amount_of_money));
        }

        if self.cost_incurred.is_negative() {
            return Err(RecordValidationError::NegativeCost(self.cost_incurred));
        }

        if self.amount_of_money.checked_add(self.cost_incurred).is_none() {
            return Err(RecordValidationError::AmountOverflow);
        }

        if self.description.len() > 500 {
            return Err(RecordValidationError::DescriptionTooLong(
                self.description.len(),
            ));
        }

        Ok(())
    }
}

impl fmt::Display for ExpenseRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.occur_day(),
            self.amount_of_money,
            self.description
        )
    }
}

/// Validation errors for expense records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    NegativeAmount(Money),
    NegativeCost(Money),
    /// Amount plus cost leaves the representable range
    AmountOverflow,
    DescriptionTooLong(usize),
}

impl RecordValidationError {
    /// Whether the failure is in the amounts rather than the metadata
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            Self::NegativeAmount(_) | Self::NegativeCost(_) | Self::AmountOverflow
        )
    }
}

impl fmt::Display for RecordValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeAmount(m) => {
                write!(f, "amount_of_money must not be negative (got {})", m)
            }
            Self::NegativeCost(m) => {
                write!(f, "cost_incurred must not be negative (got {})", m)
            }
            Self::AmountOverflow => {
                write!(f, "amount_of_money plus cost_incurred overflows")
            }
            Self::DescriptionTooLong(len) => {
                write!(f, "Description too long ({} chars, max 500)", len)
            }
        }
    }
}

impl std::error::Error for RecordValidationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(amount: i64, cost: i64) -> ExpenseRecord {
        let mut record = ExpenseRecord::new(
            UserId::new(),
            MoneyAccountId::new(),
            CategoryId::new(),
            Money::from_major(amount),
            Utc.with_ymd_and_hms(2024, 3, 5, 23, 30, 0).unwrap(),
        );
        record.cost_incurred = Money::from_major(cost);
        record
    }

    #[test]
    fn test_effect_by_direction() {
        let record = record(200, 50);
        assert_eq!(record.effect(Direction::Spending), Ok(Money::from_major(-250)));
        assert_eq!(record.effect(Direction::Revenue), Ok(Money::from_major(200)));
        assert_eq!(record.total(Direction::Revenue), Ok(Money::from_major(200)));
    }

    #[test]
    fn test_occur_day_is_utc() {
        let record = record(1, 0);
        assert_eq!(record.occur_day(), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    }

    #[test]
    fn test_conform_to_direction_clears_cost_for_revenue() {
        let mut record = record(200, 50);
        record.cost_incurred_category_id = Some(CategoryId::new());

        record.conform_to_direction(Direction::Spending);
        assert_eq!(record.cost_incurred, Money::from_major(50));

        record.conform_to_direction(Direction::Revenue);
        assert!(record.cost_incurred.is_zero());
        assert!(record.cost_incurred_category_id.is_none());
    }

    #[test]
    fn test_validation() {
        assert!(record(10, 0).validate().is_ok());

        let err = record(-10, 0).validate().unwrap_err();
        assert!(err.is_arithmetic());

        let err = record(10, -1).validate().unwrap_err();
        assert_eq!(err, RecordValidationError::NegativeCost(Money::from_major(-1)));

        let mut long = record(10, 0);
        long.description = "x".repeat(501);
        assert!(!long.validate().unwrap_err().is_arithmetic());
    }

    #[test]
    fn test_amount_plus_cost_overflow() {
        let mut record = record(1, 1);
        record.amount_of_money = Money::new(rust_decimal::Decimal::MAX);

        let err = record.validate().unwrap_err();
        assert_eq!(err, RecordValidationError::AmountOverflow);
        assert!(err.is_arithmetic());
        assert_eq!(record.total(Direction::Spending), Err(RecordValidationError::AmountOverflow));
        // revenue ignores the cost
        assert!(record.effect(Direction::Revenue).is_ok());
    }
}
