//! Account display formatting
//!
//! Formats money accounts for terminal output in table and detail views.

use crate::models::Money;
use crate::services::account::{AccountSummary, BalanceCheck};

use super::amount_text;

fn type_label(summary: &AccountSummary) -> String {
    summary
        .account_type
        .as_ref()
        .map(|t| t.name.clone())
        .unwrap_or_else(|| "(unknown)".to_string())
}

/// Format a list of accounts with balances as a table
pub fn format_account_list(summaries: &[AccountSummary]) -> String {
    if summaries.is_empty() {
        return "No accounts found.".to_string();
    }

    let name_width = summaries
        .iter()
        .map(|s| s.account.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let type_width = summaries
        .iter()
        .map(|s| type_label(s).len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:<type_width$}  {:>14}  {}\n",
        "Name",
        "Type",
        "Balance",
        "Report",
        name_width = name_width,
        type_width = type_width,
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:-<type_width$}  {:->14}  {:-<6}\n",
        "",
        "",
        "",
        "",
        name_width = name_width,
        type_width = type_width,
    ));

    for summary in summaries {
        output.push_str(&format!(
            "{:<name_width$}  {:<type_width$}  {:>14}  {}\n",
            summary.account.name,
            type_label(summary),
            summary.account.account_balance.to_string(),
            if summary.account.report { "Yes" } else { "No" },
            name_width = name_width,
            type_width = type_width,
        ));
    }

    let total = amount_text(Money::checked_sum(
        summaries
            .iter()
            .filter(|s| s.account.report)
            .map(|s| s.account.account_balance),
    ));

    output.push_str(&format!(
        "{:-<name_width$}  {:-<type_width$}  {:->14}\n",
        "",
        "",
        "",
        name_width = name_width,
        type_width = type_width,
    ));
    output.push_str(&format!(
        "{:<name_width$}  {:<type_width$}  {:>14}\n",
        "TOTAL",
        "",
        total,
        name_width = name_width,
        type_width = type_width,
    ));

    output
}

/// Format a single account's details
pub fn format_account_details(summary: &AccountSummary) -> String {
    let account = &summary.account;

    let mut output = String::new();
    output.push_str(&format!("Account: {}\n", account.name));
    output.push_str(&format!("  Type:            {}\n", type_label(summary)));
    output.push_str(&format!("  ID:              {}\n", account.id));
    output.push_str(&format!("  Balance:         {}\n", account.account_balance));
    output.push_str(&format!("  Opening Balance: {}\n", account.opening_balance));
    output.push_str(&format!(
        "  In Reports:      {}\n",
        if account.report { "Yes" } else { "No" }
    ));

    if let Some(bank) = &account.select_bank {
        output.push_str(&format!("  Bank:            {}\n", bank));
    }
    if let Some(limit) = account.credit_limit_number {
        output.push_str(&format!("  Credit Limit:    {}\n", limit));
    }
    if !account.description.is_empty() {
        output.push_str(&format!("  Description:     {}\n", account.description));
    }

    output.push_str(&format!(
        "  Created:         {}\n",
        account.created_at.format("%Y-%m-%d %H:%M")
    ));

    output
}

/// Format the result of a balance check
pub fn format_balance_check(name: &str, check: &BalanceCheck) -> String {
    let mut output = format!(
        "Balance check for {} ({} records)\n  Stored:  {}\n  Derived: {}\n",
        name, check.record_count, check.materialized, check.derived
    );

    if check.is_consistent() {
        output.push_str("  Status:  OK\n");
    } else {
        output.push_str(&format!("  Status:  DRIFT of {}\n", amount_text(check.drift())));
    }

    output
}
