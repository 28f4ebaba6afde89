//! Spending limit display formatting

use crate::services::forecast::{SpendingLimitReport, SpendingLimitSummary};

use super::amount_text;
use super::record::format_record_register;

/// Format the summary table of all limits
pub fn format_limit_summaries(summaries: &[SpendingLimitSummary]) -> String {
    if summaries.is_empty() {
        return "No spending limits found.\n".to_string();
    }

    let name_width = summaries
        .iter()
        .map(|s| s.limit.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:<24}  {:>14}  {:>14}  {:>14}\n",
        "Name",
        "Window",
        "Limit",
        "Spent",
        "Remaining",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:-<24}  {:->14}  {:->14}  {:->14}\n",
        "",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for summary in summaries {
        output.push_str(&format!(
            "{:<name_width$}  {:<24}  {:>14}  {:>14}  {:>14}\n",
            summary.limit.name,
            summary.window.to_string(),
            summary.limit.amount_of_money.to_string(),
            summary.total_spent.to_string(),
            amount_text(summary.remaining_amount()),
            name_width = name_width,
        ));
    }

    output
}

/// Format one limit with its forecast
pub fn format_limit_report(report: &SpendingLimitReport) -> String {
    let limit = &report.limit;
    let forecast = &report.forecast;

    let mut output = String::new();
    output.push_str(&format!("Spending limit: {}\n", limit.name));
    output.push_str(&format!("  ID:              {}\n", limit.id));
    output.push_str(&format!("  Window:          {}\n", report.window));
    output.push_str(&format!(
        "  Days:            {} of {} elapsed, {} remaining\n",
        forecast.elapsed_days, forecast.total_days, forecast.remaining_days
    ));
    output.push_str(&format!("  Limit:           {}\n", forecast.limit_amount));
    output.push_str(&format!("  Spent:           {}\n", forecast.total_spent));
    output.push_str(&format!("  Remaining:       {}\n", forecast.remaining_amount));
    output.push_str(&format!("  Actual / day:    {}\n", forecast.actual_rate));
    output.push_str(&format!("  Should / day:    {}\n", forecast.should_rate));
    output.push_str(&format!("  Expected total:  {}\n", forecast.expected_total));

    let status = if forecast.is_over_budget() {
        "Over budget"
    } else if !forecast.is_on_track() {
        "At risk"
    } else {
        "On track"
    };
    output.push_str(&format!("  Status:          {}\n", status));

    output.push('\n');
    output.push_str(&format_record_register(&report.records));

    output
}
