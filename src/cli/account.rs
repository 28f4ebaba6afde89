//! Account CLI commands
//!
//! Implements CLI commands for money account management.

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::account::{format_account_details, format_account_list, format_balance_check};
use crate::display::report::format_history;
use crate::error::{SpendwiseError, SpendwiseResult};
use crate::models::{AccountKind, MoneyAccountType};
use crate::services::account::{AccountSummary, MoneyAccountPatch, NewMoneyAccount};
use crate::services::{AccountService, AggregateService};
use crate::storage::Storage;

use super::{parse_money, parse_window, require_account};

/// Account subcommands
#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new account
    Create {
        /// Account name
        name: String,
        /// Account type name or kind (cash, bank, credit, ewallet, investment, other)
        #[arg(short = 't', long, default_value = "cash")]
        account_type: String,
        /// Opening balance (e.g., "1000.00" or "1,000")
        #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
        balance: String,
        /// Free-form description
        #[arg(short, long)]
        description: Option<String>,
        /// Bank name (bank accounts and credit cards)
        #[arg(long)]
        bank: Option<String>,
        /// Credit limit (credit cards)
        #[arg(long)]
        credit_limit: Option<String>,
        /// Leave the account out of reports
        #[arg(long)]
        no_report: bool,
    },
    /// List all accounts
    List,
    /// Show account details
    Show {
        /// Account name or ID
        account: String,
    },
    /// Edit an account
    Edit {
        /// Account name or ID
        account: String,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New account type name or kind
        #[arg(short = 't', long)]
        account_type: Option<String>,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
        /// Bank name
        #[arg(long)]
        bank: Option<String>,
        /// Credit limit
        #[arg(long)]
        credit_limit: Option<String>,
        /// Include the account in reports (true/false)
        #[arg(long)]
        report: Option<bool>,
    },
    /// Set the balance explicitly
    #[command(name = "set-balance")]
    SetBalance {
        /// Account name or ID
        account: String,
        /// New balance
        #[arg(allow_hyphen_values = true)]
        balance: String,
    },
    /// Delete an account and all of its records
    Delete {
        /// Account name or ID
        account: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Compare the stored balance with the balance derived from records
    Check {
        /// Account name or ID
        account: String,
        /// Repair a drifted balance
        #[arg(long)]
        fix: bool,
    },
    /// Show the account's records grouped by day
    History {
        /// Account name or ID
        account: String,
        /// First day (dd-mm-yyyy or yyyy-mm-dd)
        #[arg(long)]
        from: Option<String>,
        /// Last day (requires --from)
        #[arg(long)]
        to: Option<String>,
    },
}

/// Look up an account type by its name or by kind
fn find_account_type(storage: &Storage, input: &str) -> SpendwiseResult<MoneyAccountType> {
    if let Some(found) = storage.taxonomy.find_account_type(input)? {
        return Ok(found);
    }

    if let Some(kind) = AccountKind::parse(input) {
        if let Some(found) = storage
            .taxonomy
            .account_types()?
            .into_iter()
            .find(|t| t.kind == kind)
        {
            return Ok(found);
        }
    }

    Err(SpendwiseError::account_type_not_found(input))
}

/// Handle an account command
pub fn handle_account_command(
    storage: &Storage,
    settings: &Settings,
    cmd: AccountCommands,
) -> SpendwiseResult<()> {
    let service = AccountService::new(storage);
    let user_id = settings.user_id;

    match cmd {
        AccountCommands::Create {
            name,
            account_type,
            balance,
            description,
            bank,
            credit_limit,
            no_report,
        } => {
            let account_type = find_account_type(storage, &account_type)?;

            let mut input = NewMoneyAccount::new(name, account_type.id, parse_money(&balance)?);
            input.description = description.unwrap_or_default();
            input.report = !no_report;
            input.select_bank = bank;
            input.credit_limit_number = credit_limit.as_deref().map(parse_money).transpose()?;

            let account = service.create(user_id, input)?;

            println!("Created account: {}", account.name);
            println!("  Type: {}", account_type.name);
            println!("  Balance: {}", settings.format_money(account.account_balance));
            println!("  ID: {}", account.id);
        }

        AccountCommands::List => {
            let summaries = service.list(user_id)?;
            print!("{}", format_account_list(&summaries));
        }

        AccountCommands::Show { account } => {
            let found = require_account(storage, user_id, &account)?;
            let account_type = storage.taxonomy.get_account_type(found.money_account_type_id)?;
            print!(
                "{}",
                format_account_details(&AccountSummary {
                    account: found,
                    account_type,
                })
            );
        }

        AccountCommands::Edit {
            account,
            name,
            account_type,
            description,
            bank,
            credit_limit,
            report,
        } => {
            let found = require_account(storage, user_id, &account)?;

            let patch = MoneyAccountPatch {
                name,
                money_account_type_id: account_type
                    .as_deref()
                    .map(|t| find_account_type(storage, t).map(|t| t.id))
                    .transpose()?,
                description,
                report,
                select_bank: bank.map(|b| if b.is_empty() { None } else { Some(b) }),
                credit_limit_number: credit_limit
                    .as_deref()
                    .map(|c| {
                        if c.is_empty() {
                            Ok(None)
                        } else {
                            parse_money(c).map(Some)
                        }
                    })
                    .transpose()?,
            };

            let updated = service.update(user_id, found.id, patch)?;
            println!("Updated account: {}", updated.name);
        }

        AccountCommands::SetBalance { account, balance } => {
            let found = require_account(storage, user_id, &account)?;
            let updated = service.set_balance(user_id, found.id, parse_money(&balance)?)?;
            println!(
                "Balance of {} set to {}",
                updated.name,
                settings.format_money(updated.account_balance)
            );
        }

        AccountCommands::Delete { account, yes } => {
            let found = require_account(storage, user_id, &account)?;
            if !yes {
                println!(
                    "This deletes '{}' and all of its records. Re-run with --yes to confirm.",
                    found.name
                );
                return Ok(());
            }

            let (deleted, records) = service.delete(user_id, found.id)?;
            println!("Deleted account: {} ({} records removed)", deleted.name, records);
        }

        AccountCommands::Check { account, fix } => {
            let found = require_account(storage, user_id, &account)?;
            let check = if fix {
                service.reconcile(user_id, found.id)?
            } else {
                service.check_balance(user_id, found.id)?
            };
            print!("{}", format_balance_check(&found.name, &check));
            if fix && !check.is_consistent() {
                println!("Balance repaired to {}", check.derived);
            }
        }

        AccountCommands::History { account, from, to } => {
            let found = require_account(storage, user_id, &account)?;
            let window = parse_window(from.as_deref(), to.as_deref())?;
            let history = AggregateService::new(storage).account_history(user_id, found.id, window)?;
            print!("{}", format_history(&format!("History of {}", found.name), &history));
        }
    }

    Ok(())
}
