//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod account;
pub mod category;
pub mod export;
pub mod limit;
pub mod record;
pub mod report;

pub use account::{handle_account_command, AccountCommands};
pub use category::{handle_category_command, CategoryCommands};
pub use export::{handle_export_command, ExportCommands};
pub use limit::{handle_limit_command, LimitCommands};
pub use record::{handle_record_command, RecordCommands};
pub use report::{handle_report_command, ReportCommands};

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{SpendwiseError, SpendwiseResult};
use crate::models::window::{parse_day, parse_instant};
use crate::models::{DateWindow, Money, MoneyAccount, UserId};
use crate::services::AccountService;
use crate::storage::Storage;

/// Parse a user-entered amount
pub(crate) fn parse_money(input: &str) -> SpendwiseResult<Money> {
    Money::parse(input).map_err(|e| {
        SpendwiseError::Validation(format!(
            "Invalid amount: '{}'. Use a format like '1000.50' or '1,000'. Error: {}",
            input, e
        ))
    })
}

/// Parse a user-entered calendar day
pub(crate) fn parse_date(input: &str) -> SpendwiseResult<NaiveDate> {
    parse_day(input).map_err(|e| SpendwiseError::Validation(e.to_string()))
}

/// Parse a user-entered instant, a bare day meaning its start in UTC
pub(crate) fn parse_when(input: &str) -> SpendwiseResult<DateTime<Utc>> {
    parse_instant(input).map_err(|e| SpendwiseError::Validation(e.to_string()))
}

/// Build a day window from optional `--from` / `--to` arguments
pub(crate) fn parse_window(
    from: Option<&str>,
    to: Option<&str>,
) -> SpendwiseResult<Option<DateWindow>> {
    let from = from.map(parse_date).transpose()?;
    let to = to.map(parse_date).transpose()?;
    DateWindow::from_bounds(from, to).map_err(|e| SpendwiseError::Validation(e.to_string()))
}

/// Find one of the user's accounts by name or ID, failing with NotFound
pub(crate) fn require_account(
    storage: &Storage,
    user_id: UserId,
    identifier: &str,
) -> SpendwiseResult<MoneyAccount> {
    AccountService::new(storage)
        .find(user_id, identifier)?
        .ok_or_else(|| SpendwiseError::account_not_found(identifier))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_window() {
        assert!(parse_window(None, None).unwrap().is_none());

        let single = parse_window(Some("05-03-2024"), None).unwrap().unwrap();
        assert_eq!(single.total_days(), 1);

        let range = parse_window(Some("2024-03-01"), Some("2024-03-31")).unwrap().unwrap();
        assert_eq!(range.total_days(), 31);

        assert!(parse_window(None, Some("2024-03-31")).unwrap_err().is_validation());
        assert!(parse_window(Some("2024-03-31"), Some("2024-03-01"))
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_parse_money_errors_are_validation() {
        assert_eq!(parse_money("1,000.50").unwrap(), Money::parse("1000.5").unwrap());
        assert!(parse_money("abc").unwrap_err().is_validation());
    }
}
