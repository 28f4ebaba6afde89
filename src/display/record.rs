//! Expense record display formatting

use crate::models::ExpenseRecord;
use crate::services::aggregate::RecordLine;
use crate::services::category::ResolvedCategory;
use crate::services::ledger::LedgerOutcome;

use super::amount_text;

/// Format one record as a register row
pub fn format_record_row(line: &RecordLine) -> String {
    let report_flag = if line.record.report { " " } else { "·" };

    format!(
        "{} {:12} {} {:24} {:>14}  {}",
        report_flag,
        line.record.id.short(),
        line.record.occur_date.format("%Y-%m-%d"),
        truncate(&line.category.qualified_name(), 24),
        amount_text(line.effect().ok()),
        truncate(&line.record.description, 30)
    )
}

/// Format a list of records as a register
pub fn format_record_register(lines: &[RecordLine]) -> String {
    if lines.is_empty() {
        return "No records found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:1} {:12} {:10} {:24} {:>14}  {}\n",
        "", "ID", "Date", "Category", "Effect", "Description"
    ));
    output.push_str(&"-".repeat(83));
    output.push('\n');

    for line in lines {
        output.push_str(&format_record_row(line));
        output.push('\n');
    }

    output
}

/// Format record details
pub fn format_record_details(
    record: &ExpenseRecord,
    category: &ResolvedCategory,
    account_name: &str,
) -> String {
    let mut output = String::new();

    output.push_str(&format!("Record:      {}\n", record.id));
    output.push_str(&format!("Date:        {}\n", record.occur_date.format("%Y-%m-%d %H:%M")));
    output.push_str(&format!("Account:     {}\n", account_name));
    output.push_str(&format!(
        "Category:    {} ({})\n",
        category.qualified_name(),
        category.direction
    ));
    output.push_str(&format!("Amount:      {}\n", record.amount_of_money));
    if !record.cost_incurred.is_zero() {
        output.push_str(&format!("Cost:        {}\n", record.cost_incurred));
    }
    output.push_str(&format!(
        "Effect:      {}\n",
        amount_text(record.effect(category.direction).ok())
    ));
    output.push_str(&format!(
        "In Reports:  {}\n",
        if record.report { "Yes" } else { "No" }
    ));

    let optional = [
        ("Description", &record.description),
        ("Event", &record.trip_or_event),
        ("Location", &record.location),
        ("Paid For", &record.pay_for_who),
        ("Collect From", &record.collect_from_who),
    ];
    for (label, value) in optional {
        if !value.is_empty() {
            output.push_str(&format!("{:<13}{}\n", format!("{}:", label), value));
        }
    }

    if let Some(date) = record.repayment_date {
        output.push_str(&format!("Repay By:    {}\n", date.format("%Y-%m-%d")));
    }
    if let Some(date) = record.debt_collection_date {
        output.push_str(&format!("Collect By:  {}\n", date.format("%Y-%m-%d")));
    }
    if let Some(proof) = &record.proof_image {
        output.push_str(&format!("Proof:       {}\n", proof));
    }

    output
}

/// Format the balance changes of a ledger operation
pub fn format_outcome(verb: &str, outcome: &LedgerOutcome) -> String {
    let mut output = format!("{} record {}\n", verb, outcome.record.id);

    for change in &outcome.changes {
        output.push_str(&format!(
            "  Balance {}: {} -> {}\n",
            change.account_id.short(),
            change.before,
            change.after
        ));
    }
    output.push_str(&format!("  New balance: {}\n", outcome.balance));

    output
}

/// Truncate a string to a maximum number of characters
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a long description", 10), "a long ...");
        assert_eq!(truncate("ăâêôơư xyz", 8), "ăâêôơ...");
    }
}
