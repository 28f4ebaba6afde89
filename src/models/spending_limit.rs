//! Spending limit model
//!
//! A spending limit is a budget: a target amount over a window of days,
//! scoped to some of the user's accounts and, optionally, categories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CategoryId, MoneyAccountId, RepeatId, SpendingLimitId, UserId};
use super::money::Money;
use super::window::DateWindow;

/// How often a limit is meant to recur
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatCadence {
    Once,
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl fmt::Display for RepeatCadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Once => write!(f, "Once"),
            Self::Daily => write!(f, "Daily"),
            Self::Weekly => write!(f, "Weekly"),
            Self::Monthly => write!(f, "Monthly"),
            Self::Quarterly => write!(f, "Quarterly"),
            Self::Yearly => write!(f, "Yearly"),
        }
    }
}

/// An entry of the repeat policy catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingLimitRepeat {
    pub id: RepeatId,
    pub name: String,
    pub cadence: RepeatCadence,
}

impl SpendingLimitRepeat {
    pub fn new(name: impl Into<String>, cadence: RepeatCadence) -> Self {
        Self {
            id: RepeatId::new(),
            name: name.into(),
            cadence,
        }
    }
}

/// A budget over a window of days
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingLimit {
    /// Unique identifier
    pub id: SpendingLimitId,

    /// Owning user
    pub user_id: UserId,

    pub name: String,

    /// Target amount for the whole window
    pub amount_of_money: Money,

    /// Repeat policy reference
    pub repeat: RepeatId,

    /// Accounts whose records count against the limit
    pub money_account_ids: Vec<MoneyAccountId>,

    /// Categories the limit is filed under; validated on write only
    #[serde(default)]
    pub cash_flow_category_ids: Vec<CategoryId>,

    pub start_time: DateTime<Utc>,

    /// Absent means the window is the start day only
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SpendingLimit {
    /// Create a new limit
    pub fn new(
        user_id: UserId,
        name: impl Into<String>,
        amount_of_money: Money,
        repeat: RepeatId,
        start_time: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: SpendingLimitId::new(),
            user_id,
            name: name.into(),
            amount_of_money,
            repeat,
            money_account_ids: Vec::new(),
            cash_flow_category_ids: Vec::new(),
            start_time,
            end_time: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The inclusive UTC day window the limit is evaluated over
    pub fn window(&self) -> Result<DateWindow, LimitValidationError> {
        let first = self.start_time.date_naive();
        let last = self.end_time.map(|end| end.date_naive()).unwrap_or(first);
        DateWindow::days(first, last).map_err(|_| LimitValidationError::EndBeforeStart)
    }

    /// Validate the limit
    pub fn validate(&self) -> Result<(), LimitValidationError> {
        if self.name.trim().is_empty() {
            return Err(LimitValidationError::EmptyName);
        }

        if self.amount_of_money.is_negative() {
            return Err(LimitValidationError::NegativeAmount(self.amount_of_money));
        }

        if self.money_account_ids.is_empty() {
            return Err(LimitValidationError::NoAccounts);
        }

        self.window()?;

        Ok(())
    }
}

impl fmt::Display for SpendingLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.amount_of_money)
    }
}

/// Validation errors for spending limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitValidationError {
    EmptyName,
    NegativeAmount(Money),
    NoAccounts,
    EndBeforeStart,
}

impl LimitValidationError {
    pub fn is_arithmetic(&self) -> bool {
        matches!(self, Self::NegativeAmount(_))
    }
}

impl fmt::Display for LimitValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Spending limit name cannot be empty"),
            Self::NegativeAmount(m) => {
                write!(f, "Spending limit amount must not be negative (got {})", m)
            }
            Self::NoAccounts => write!(f, "Spending limit needs at least one money account"),
            Self::EndBeforeStart => write!(f, "Spending limit ends before it starts"),
        }
    }
}

impl std::error::Error for LimitValidationError {}
