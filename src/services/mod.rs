//! Service layer for Spendwise
//!
//! The service layer provides business logic on top of the storage layer:
//! the category resolver, the ledger balance engine, windowed aggregates and
//! the spending-limit forecaster.

pub mod account;
pub mod aggregate;
pub mod category;
pub mod forecast;
pub mod ledger;
pub mod limit;

pub use account::{AccountService, AccountSummary, BalanceCheck, MoneyAccountPatch, NewMoneyAccount};
pub use aggregate::{AggregateService, CategoryBucket, DailyHistory, DayBucket, RecordLine, Statistics};
pub use category::{CategoryResolver, CategoryService, ResolvedCategory};
pub use forecast::{Forecast, ForecastService, SpendingLimitReport, SpendingLimitSummary};
pub use ledger::{ExpenseRecordPatch, LedgerOutcome, LedgerService, NewExpenseRecord};
pub use limit::{NewSpendingLimit, SpendingLimitPatch, SpendingLimitService};
