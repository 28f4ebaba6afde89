//! Core data models for Spendwise
//!
//! This module contains all the data structures that represent the ledger
//! domain: money accounts, expense records, cash-flow categories, spending
//! limits and the day windows they are evaluated over.

pub mod account;
pub mod category;
pub mod expense_record;
pub mod ids;
pub mod money;
pub mod spending_limit;
pub mod window;

pub use account::{AccountKind, MoneyAccount, MoneyAccountType};
pub use category::{CashFlowCategory, CashFlowGroup, Direction, SubCategory};
pub use expense_record::ExpenseRecord;
pub use ids::{
    CategoryId, ExpenseRecordId, MoneyAccountId, MoneyAccountTypeId, RepeatId, SpendingLimitId,
    UserId,
};
pub use money::Money;
pub use spending_limit::{RepeatCadence, SpendingLimit, SpendingLimitRepeat};
pub use window::DateWindow;
