//! Spending limit CLI commands
//!
//! Implements CLI commands for managing spending limits and viewing their
//! forecasts.

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::limit::{format_limit_report, format_limit_summaries};
use crate::error::{SpendwiseError, SpendwiseResult};
use crate::models::{CategoryId, MoneyAccountId, RepeatId, SpendingLimit, UserId};
use crate::services::limit::{NewSpendingLimit, SpendingLimitPatch};
use crate::services::{CategoryService, ForecastService, SpendingLimitService};
use crate::storage::Storage;

use super::{parse_date, parse_money, parse_when, require_account};

/// Spending limit subcommands
#[derive(Subcommand)]
pub enum LimitCommands {
    /// Create a spending limit
    Add {
        /// Limit name
        name: String,
        /// Amount for the whole window
        amount: String,
        /// Comma-separated account names or IDs
        #[arg(short, long, value_delimiter = ',', required = true)]
        accounts: Vec<String>,
        /// Comma-separated categories (empty means all spending)
        #[arg(short = 'C', long, value_delimiter = ',')]
        categories: Vec<String>,
        /// Repeat policy name or cadence (once, daily, weekly, monthly, quarterly, yearly)
        #[arg(short, long, default_value = "once")]
        repeat: String,
        /// First day of the window
        #[arg(long)]
        start: String,
        /// Last day of the window (default: the start day)
        #[arg(long)]
        end: Option<String>,
    },
    /// Edit a spending limit
    Edit {
        /// Limit name or ID
        limit: String,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New amount
        #[arg(long)]
        amount: Option<String>,
        /// Replace the accounts
        #[arg(short, long, value_delimiter = ',')]
        accounts: Option<Vec<String>>,
        /// Replace the categories
        #[arg(short = 'C', long, value_delimiter = ',')]
        categories: Option<Vec<String>>,
        /// New repeat policy
        #[arg(short, long)]
        repeat: Option<String>,
        /// New first day
        #[arg(long)]
        start: Option<String>,
        /// New last day (empty for a single-day window)
        #[arg(long)]
        end: Option<String>,
    },
    /// Delete a spending limit
    Delete {
        /// Limit name or ID
        limit: String,
    },
    /// List limits with spent-to-date
    List,
    /// Show a limit's forecast and the records counted against it
    Show {
        /// Limit name or ID
        limit: String,
        /// Evaluate as of this day instead of today
        #[arg(long)]
        on: Option<String>,
    },
}

fn require_limit(
    storage: &Storage,
    user_id: UserId,
    identifier: &str,
) -> SpendwiseResult<SpendingLimit> {
    SpendingLimitService::new(storage)
        .find(user_id, identifier)?
        .ok_or_else(|| SpendwiseError::limit_not_found(identifier))
}

fn require_repeat(storage: &Storage, identifier: &str) -> SpendwiseResult<RepeatId> {
    storage
        .taxonomy
        .find_repeat(identifier)?
        .map(|r| r.id)
        .ok_or_else(|| SpendwiseError::repeat_not_found(identifier))
}

fn account_ids(
    storage: &Storage,
    user_id: UserId,
    names: &[String],
) -> SpendwiseResult<Vec<MoneyAccountId>> {
    names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .map(|n| require_account(storage, user_id, n).map(|a| a.id))
        .collect()
}

fn category_ids(storage: &Storage, names: &[String]) -> SpendwiseResult<Vec<CategoryId>> {
    let resolver = CategoryService::new(storage).resolver()?;
    names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .map(|n| {
            resolver
                .find(n)
                .map(|c| c.id)
                .ok_or_else(|| SpendwiseError::category_not_found(n))
        })
        .collect()
}

/// Handle a spending limit command
pub fn handle_limit_command(
    storage: &Storage,
    settings: &Settings,
    cmd: LimitCommands,
) -> SpendwiseResult<()> {
    let service = SpendingLimitService::new(storage);
    let user_id = settings.user_id;

    match cmd {
        LimitCommands::Add {
            name,
            amount,
            accounts,
            categories,
            repeat,
            start,
            end,
        } => {
            let limit = service.add(
                user_id,
                NewSpendingLimit {
                    name,
                    amount_of_money: parse_money(&amount)?,
                    repeat: require_repeat(storage, &repeat)?,
                    money_account_ids: account_ids(storage, user_id, &accounts)?,
                    cash_flow_category_ids: category_ids(storage, &categories)?,
                    start_time: parse_when(&start)?,
                    end_time: end.as_deref().map(parse_when).transpose()?,
                },
            )?;

            println!("Created spending limit: {}", limit.name);
            println!("  Amount: {}", settings.format_money(limit.amount_of_money));
            if let Ok(window) = limit.window() {
                println!("  Window: {} ({} days)", window, window.total_days());
            }
            println!("  ID: {}", limit.id);
        }

        LimitCommands::Edit {
            limit,
            name,
            amount,
            accounts,
            categories,
            repeat,
            start,
            end,
        } => {
            let found = require_limit(storage, user_id, &limit)?;

            let patch = SpendingLimitPatch {
                name,
                amount_of_money: amount.as_deref().map(parse_money).transpose()?,
                repeat: repeat
                    .as_deref()
                    .map(|r| require_repeat(storage, r))
                    .transpose()?,
                money_account_ids: accounts
                    .as_deref()
                    .map(|a| account_ids(storage, user_id, a))
                    .transpose()?,
                cash_flow_category_ids: categories
                    .as_deref()
                    .map(|c| category_ids(storage, c))
                    .transpose()?,
                start_time: start.as_deref().map(parse_when).transpose()?,
                end_time: end
                    .as_deref()
                    .map(|e| {
                        if e.trim().is_empty() {
                            Ok(None)
                        } else {
                            parse_when(e).map(Some)
                        }
                    })
                    .transpose()?,
            };

            let updated = service.update(user_id, found.id, patch)?;
            println!("Updated spending limit: {}", updated.name);
        }

        LimitCommands::Delete { limit } => {
            let found = require_limit(storage, user_id, &limit)?;
            let deleted = service.delete(user_id, found.id)?;
            println!("Deleted spending limit: {}", deleted.name);
        }

        LimitCommands::List => {
            let summaries = ForecastService::new(storage).evaluate_all(user_id)?;
            print!("{}", format_limit_summaries(&summaries));
        }

        LimitCommands::Show { limit, on } => {
            let found = require_limit(storage, user_id, &limit)?;
            let forecasts = ForecastService::new(storage);
            let report = match on {
                Some(day) => forecasts.evaluate_on(user_id, found.id, parse_date(&day)?)?,
                None => forecasts.evaluate(user_id, found.id)?,
            };
            print!("{}", format_limit_report(&report));
        }
    }

    Ok(())
}
