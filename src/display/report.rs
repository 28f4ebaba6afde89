//! Report formatting for terminal output
//!
//! Category statistics and day-bucketed history views.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::services::aggregate::{CategoryBucket, DailyHistory, Statistics};

use super::amount_text;
use super::record::format_record_row;

const WIDTH: usize = 72;

/// Create a simple bar for a percentage in 0..=100
pub fn format_bar(percentage: Decimal, width: usize) -> String {
    let share = percentage.to_f64().unwrap_or(0.0).clamp(0.0, 100.0) / 100.0;
    let filled = ((share * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Format a separator line
pub fn separator(width: usize) -> String {
    "─".repeat(width)
}

fn format_buckets(title: &str, buckets: &[CategoryBucket], output: &mut String) {
    output.push_str(&format!("{}\n", title));
    if buckets.is_empty() {
        output.push_str("  (none)\n");
        return;
    }

    for bucket in buckets {
        output.push_str(&format!(
            "  {:<24} {:>14} {:>7}% {}\n",
            bucket.lineage.name,
            bucket.total_money.to_string(),
            format!("{:.2}", bucket.percentage),
            format_bar(bucket.percentage, 16)
        ));
    }
}

/// Format category statistics
pub fn format_statistics(stats: &Statistics) -> String {
    let mut output = String::new();

    let scope = stats
        .window
        .map(|w| w.to_string())
        .unwrap_or_else(|| "all time".to_string());
    output.push_str(&format!("Statistics ({})\n", scope));
    output.push_str(&separator(WIDTH));
    output.push('\n');

    format_buckets("Spending", &stats.spending, &mut output);
    output.push('\n');
    format_buckets("Revenue", &stats.revenue, &mut output);

    output.push_str(&separator(WIDTH));
    output.push('\n');
    output.push_str(&format!("  {:<24} {:>14}\n", "Total spending", stats.total_spending.to_string()));
    output.push_str(&format!("  {:<24} {:>14}\n", "Total revenue", stats.total_revenue.to_string()));
    output.push_str(&format!("  {:<24} {:>14}\n", "Net", amount_text(stats.net())));

    output
}

/// Format a day-bucketed history
pub fn format_history(title: &str, history: &DailyHistory) -> String {
    let mut output = format!("{}\n", title);

    if history.days.is_empty() {
        output.push_str("No records found.\n");
        return output;
    }

    for day in &history.days {
        output.push_str(&separator(WIDTH));
        output.push('\n');
        output.push_str(&format!(
            "{}  spent {}  earned {}  net {}\n",
            day.date.format("%Y-%m-%d"),
            day.spending,
            day.revenue,
            day.total_money
        ));
        for line in &day.records {
            output.push_str(&format_record_row(line));
            output.push('\n');
        }
    }

    output.push_str(&separator(WIDTH));
    output.push('\n');
    output.push_str(&format!(
        "{} records  spent {}  earned {}\n",
        history.record_count(),
        history.total_spending,
        history.total_revenue
    ));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;

    #[test]
    fn test_bar_widths() {
        assert_eq!(format_bar(Decimal::ZERO, 4), "░░░░");
        assert_eq!(format_bar(Decimal::from(50), 4), "██░░");
        assert_eq!(format_bar(Decimal::from(150), 4), "████");
    }

    #[test]
    fn test_empty_statistics() {
        let stats = Statistics {
            window: None,
            spending: Vec::new(),
            revenue: Vec::new(),
            total_spending: Money::zero(),
            total_revenue: Money::zero(),
        };
        let output = format_statistics(&stats);
        assert!(output.contains("all time"));
        assert!(output.contains("(none)"));
    }
}
