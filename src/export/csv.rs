//! CSV export
//!
//! Exports a user's expense records and money accounts to CSV.

use std::collections::HashMap;
use std::io::Write;

use serde::Serialize;
use tracing::info;

use crate::error::SpendwiseResult;
use crate::models::{Money, UserId};
use crate::services::{AccountService, CategoryService};
use crate::storage::Storage;

#[derive(Serialize)]
struct RecordRow<'a> {
    id: String,
    date: String,
    account: &'a str,
    category: String,
    direction: String,
    amount: Money,
    cost_incurred: Money,
    effect: Money,
    report: bool,
    description: &'a str,
    trip_or_event: &'a str,
    location: &'a str,
}

#[derive(Serialize)]
struct AccountRow<'a> {
    id: String,
    name: &'a str,
    account_type: &'a str,
    balance: Money,
    opening_balance: Money,
    report: bool,
    bank: &'a str,
    credit_limit: Option<Money>,
}

/// Export the user's expense records, oldest first. Returns the row count.
pub fn export_records_csv<W: Write>(
    storage: &Storage,
    user_id: UserId,
    writer: W,
) -> SpendwiseResult<usize> {
    let resolver = CategoryService::new(storage).resolver()?;
    let account_names: HashMap<_, _> = storage
        .ledger
        .accounts_for_user(user_id)?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect();

    let records = storage.ledger.records_for_user(user_id)?;
    let mut wtr = csv::Writer::from_writer(writer);

    for record in &records {
        let category = resolver.resolve(record.cash_flow_category_id)?;
        let account = account_names
            .get(&record.money_account_id)
            .map(String::as_str)
            .unwrap_or("Unknown");

        wtr.serialize(RecordRow {
            id: record.id.to_string(),
            date: record.occur_date.format("%Y-%m-%d").to_string(),
            account,
            category: category.qualified_name(),
            direction: category.direction.to_string(),
            amount: record.amount_of_money,
            cost_incurred: record.cost_incurred,
            effect: record.effect(category.direction)?,
            report: record.report,
            description: &record.description,
            trip_or_event: &record.trip_or_event,
            location: &record.location,
        })?;
    }

    wtr.flush()?;
    info!(rows = records.len(), "exported records");
    Ok(records.len())
}

/// Export the user's money accounts. Returns the row count.
pub fn export_accounts_csv<W: Write>(
    storage: &Storage,
    user_id: UserId,
    writer: W,
) -> SpendwiseResult<usize> {
    let summaries = AccountService::new(storage).list(user_id)?;
    let mut wtr = csv::Writer::from_writer(writer);

    for summary in &summaries {
        let account = &summary.account;
        wtr.serialize(AccountRow {
            id: account.id.to_string(),
            name: &account.name,
            account_type: summary
                .account_type
                .as_ref()
                .map(|t| t.name.as_str())
                .unwrap_or("Unknown"),
            balance: account.account_balance,
            opening_balance: account.opening_balance,
            report: account.report,
            bank: account.select_bank.as_deref().unwrap_or(""),
            credit_limit: account.credit_limit_number,
        })?;
    }

    wtr.flush()?;
    info!(rows = summaries.len(), "exported accounts");
    Ok(summaries.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ledger::{LedgerService, NewExpenseRecord};
    use crate::services::testing::{category, create_test_storage, open_account};
    use chrono::Utc;

    #[test]
    fn test_export_records() {
        let (_temp, storage, user) = create_test_storage();
        let wallet = open_account(&storage, user, "Wallet", 100);
        let coffee = category(&storage, "Coffee");

        let mut input = NewExpenseRecord::new(wallet.id, coffee, Money::parse("4.50").unwrap(), Utc::now());
        input.cost_incurred = Money::parse("0.50").unwrap();
        input.description = "Latte, large".into();
        LedgerService::new(&storage).add_record(user, input).unwrap();

        let mut buffer = Vec::new();
        let rows = export_records_csv(&storage, user, &mut buffer).unwrap();
        assert_eq!(rows, 1);

        let output = String::from_utf8(buffer).unwrap();
        let mut lines = output.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,date,account,category,direction,amount,cost_incurred,effect,report,description,trip_or_event,location"
        );
        let row = lines.next().unwrap();
        assert!(row.contains("Wallet,Food & Drink / Coffee,Spending,4.5,0.5,-5,true,\"Latte, large\""));
    }

    #[test]
    fn test_export_accounts() {
        let (_temp, storage, user) = create_test_storage();
        open_account(&storage, user, "Wallet", 100);
        open_account(&storage, UserId::new(), "Theirs", 5);

        let mut buffer = Vec::new();
        let rows = export_accounts_csv(&storage, user, &mut buffer).unwrap();
        assert_eq!(rows, 1);
        assert!(String::from_utf8(buffer).unwrap().contains("Wallet,Cash,100,100,true"));
    }
}
