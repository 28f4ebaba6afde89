//! Expense record CLI commands
//!
//! Implements CLI commands for adding, editing and listing expense records.

use chrono::Utc;
use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::record::{format_outcome, format_record_details, format_record_register};
use crate::error::{SpendwiseError, SpendwiseResult};
use crate::models::{CategoryId, ExpenseRecordId, UserId};
use crate::services::aggregate::RecordLine;
use crate::services::ledger::{ExpenseRecordPatch, NewExpenseRecord};
use crate::services::{AggregateService, CategoryResolver, CategoryService, LedgerService};
use crate::storage::Storage;

use super::{parse_money, parse_when, parse_window, require_account};

/// Record subcommands
#[derive(Subcommand)]
pub enum RecordCommands {
    /// Add a new record
    Add {
        /// Account name or ID
        account: String,
        /// Category name ("Coffee" or "Food & Drink / Coffee") or ID
        category: String,
        /// Amount (non-negative)
        amount: String,
        /// Fee paid on top of a spending amount
        #[arg(short, long)]
        cost: Option<String>,
        /// Category of the fee
        #[arg(long)]
        cost_category: Option<String>,
        /// When it happened (default: now)
        #[arg(long)]
        date: Option<String>,
        /// Description
        #[arg(short, long)]
        description: Option<String>,
        /// Trip or event
        #[arg(short, long)]
        event: Option<String>,
        /// Location
        #[arg(short, long)]
        location: Option<String>,
        /// Who the money was paid for
        #[arg(long)]
        paid_for: Option<String>,
        /// Who the money is collected from
        #[arg(long)]
        collect_from: Option<String>,
        /// Repayment date
        #[arg(long)]
        repay_by: Option<String>,
        /// Debt collection date
        #[arg(long)]
        collect_by: Option<String>,
        /// Receipt image reference
        #[arg(long)]
        proof: Option<String>,
        /// Leave the record out of statistics
        #[arg(long)]
        no_report: bool,
    },
    /// Edit a record
    Edit {
        /// Record ID (or unique prefix)
        id: String,
        /// Move the record to another account
        #[arg(short, long)]
        account: Option<String>,
        /// New category
        #[arg(short = 'C', long)]
        category: Option<String>,
        /// New amount
        #[arg(long)]
        amount: Option<String>,
        /// New fee
        #[arg(short, long)]
        cost: Option<String>,
        /// New fee category (empty to clear)
        #[arg(long)]
        cost_category: Option<String>,
        /// New date
        #[arg(long)]
        date: Option<String>,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
        /// New trip or event
        #[arg(short, long)]
        event: Option<String>,
        /// New location
        #[arg(short, long)]
        location: Option<String>,
        /// Include the record in statistics (true/false)
        #[arg(long)]
        report: Option<bool>,
    },
    /// Delete a record
    Delete {
        /// Record ID (or unique prefix)
        id: String,
    },
    /// Show record details
    Show {
        /// Record ID (or unique prefix)
        id: String,
    },
    /// List records, newest first
    List {
        /// Only this account
        #[arg(short, long)]
        account: Option<String>,
        /// Only this category (a parent includes its sub-categories)
        #[arg(short = 'C', long)]
        category: Option<String>,
        /// First day
        #[arg(long)]
        from: Option<String>,
        /// Last day (requires --from)
        #[arg(long)]
        to: Option<String>,
    },
}

fn require_category(resolver: &CategoryResolver, identifier: &str) -> SpendwiseResult<CategoryId> {
    resolver
        .find(identifier)
        .map(|c| c.id)
        .ok_or_else(|| SpendwiseError::category_not_found(identifier))
}

/// Resolve a full record ID or a unique prefix of one
fn resolve_record_id(
    storage: &Storage,
    user_id: UserId,
    identifier: &str,
) -> SpendwiseResult<ExpenseRecordId> {
    if let Ok(id) = identifier.parse::<ExpenseRecordId>() {
        return Ok(id);
    }

    let prefix = identifier.trim();
    let prefix = prefix.strip_prefix("rec-").unwrap_or(prefix).to_lowercase();
    if prefix.is_empty() {
        return Err(SpendwiseError::record_not_found(identifier));
    }

    let matches: Vec<ExpenseRecordId> = storage
        .ledger
        .records_for_user(user_id)?
        .into_iter()
        .filter(|r| r.id.as_uuid().to_string().starts_with(&prefix))
        .map(|r| r.id)
        .collect();

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(SpendwiseError::record_not_found(identifier)),
        _ => Err(SpendwiseError::Validation(format!(
            "Record prefix '{}' is ambiguous ({} matches)",
            identifier,
            matches.len()
        ))),
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Handle a record command
pub fn handle_record_command(
    storage: &Storage,
    settings: &Settings,
    cmd: RecordCommands,
) -> SpendwiseResult<()> {
    let service = LedgerService::new(storage);
    let user_id = settings.user_id;

    match cmd {
        RecordCommands::Add {
            account,
            category,
            amount,
            cost,
            cost_category,
            date,
            description,
            event,
            location,
            paid_for,
            collect_from,
            repay_by,
            collect_by,
            proof,
            no_report,
        } => {
            let account = require_account(storage, user_id, &account)?;
            let resolver = CategoryService::new(storage).resolver()?;
            let category = require_category(&resolver, &category)?;
            let occur_date = match date {
                Some(d) => parse_when(&d)?,
                None => Utc::now(),
            };

            let mut input =
                NewExpenseRecord::new(account.id, category, parse_money(&amount)?, occur_date);
            if let Some(cost) = cost {
                input.cost_incurred = parse_money(&cost)?;
            }
            input.cost_incurred_category_id = cost_category
                .as_deref()
                .map(|c| require_category(&resolver, c))
                .transpose()?;
            input.report = !no_report;
            input.description = description.unwrap_or_default();
            input.trip_or_event = event.unwrap_or_default();
            input.location = location.unwrap_or_default();
            input.pay_for_who = paid_for.unwrap_or_default();
            input.collect_from_who = collect_from.unwrap_or_default();
            input.repayment_date = repay_by.as_deref().map(parse_when).transpose()?;
            input.debt_collection_date = collect_by.as_deref().map(parse_when).transpose()?;
            input.proof_image = proof;

            let outcome = service.add_record(user_id, input)?;
            print!("{}", format_outcome("Added", &outcome));
        }

        RecordCommands::Edit {
            id,
            account,
            category,
            amount,
            cost,
            cost_category,
            date,
            description,
            event,
            location,
            report,
        } => {
            let id = resolve_record_id(storage, user_id, &id)?;
            let resolver = CategoryService::new(storage).resolver()?;

            let patch = ExpenseRecordPatch {
                money_account_id: account
                    .as_deref()
                    .map(|a| require_account(storage, user_id, a).map(|a| a.id))
                    .transpose()?,
                cash_flow_category_id: category
                    .as_deref()
                    .map(|c| require_category(&resolver, c))
                    .transpose()?,
                amount_of_money: amount.as_deref().map(parse_money).transpose()?,
                cost_incurred: cost.as_deref().map(parse_money).transpose()?,
                cost_incurred_category_id: cost_category
                    .map(|c| {
                        non_empty(c)
                            .map(|c| require_category(&resolver, &c))
                            .transpose()
                    })
                    .transpose()?,
                occur_date: date.as_deref().map(parse_when).transpose()?,
                report,
                description,
                trip_or_event: event,
                location,
                ..Default::default()
            };

            let outcome = service.update_record(user_id, id, patch)?;
            print!("{}", format_outcome("Updated", &outcome));
        }

        RecordCommands::Delete { id } => {
            let id = resolve_record_id(storage, user_id, &id)?;
            let outcome = service.delete_record(user_id, id)?;
            print!("{}", format_outcome("Deleted", &outcome));
        }

        RecordCommands::Show { id } => {
            let id = resolve_record_id(storage, user_id, &id)?;
            let record = service.get_record(user_id, id)?;
            let category = CategoryService::new(storage).resolve(record.cash_flow_category_id)?;
            let account_name = storage
                .ledger
                .get_account(record.money_account_id)?
                .map(|a| a.name)
                .unwrap_or_else(|| "Unknown".to_string());

            print!("{}", format_record_details(&record, &category, &account_name));
        }

        RecordCommands::List {
            account,
            category,
            from,
            to,
        } => {
            let window = parse_window(from.as_deref(), to.as_deref())?;
            let aggregates = AggregateService::new(storage);

            let mut lines: Vec<RecordLine> = match &category {
                Some(c) => {
                    let resolver = CategoryService::new(storage).resolver()?;
                    let id = require_category(&resolver, c)?;
                    aggregates.records_in_category(user_id, &[id], window)?
                }
                None => aggregates
                    .history(user_id, window)?
                    .days
                    .into_iter()
                    .flat_map(|day| day.records)
                    .collect(),
            };

            if let Some(a) = account {
                let account = require_account(storage, user_id, &a)?;
                lines.retain(|line| line.record.money_account_id == account.id);
            }
            lines.sort_by(|a, b| b.record.occur_date.cmp(&a.record.occur_date));

            print!("{}", format_record_register(&lines));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use crate::services::testing::{category, create_test_storage, open_account};

    #[test]
    fn test_resolve_record_id_by_prefix() {
        let (_temp, storage, user) = create_test_storage();
        let wallet = open_account(&storage, user, "Wallet", 100);
        let coffee = category(&storage, "Coffee");

        let outcome = LedgerService::new(&storage)
            .add_record(
                user,
                NewExpenseRecord::new(wallet.id, coffee, Money::from_major(3), Utc::now()),
            )
            .unwrap();
        let id = outcome.record.id;

        assert_eq!(resolve_record_id(&storage, user, &id.to_string()).unwrap(), id);
        assert_eq!(resolve_record_id(&storage, user, &id.short()).unwrap(), id);

        let err = resolve_record_id(&storage, UserId::new(), &id.short()).unwrap_err();
        assert!(err.is_not_found());
        assert!(resolve_record_id(&storage, user, "rec-").unwrap_err().is_not_found());
    }
}
