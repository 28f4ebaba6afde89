//! Report CLI commands
//!
//! Implements CLI commands for category statistics and day-by-day history.

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::record::format_record_register;
use crate::display::report::{format_history, format_statistics};
use crate::error::{SpendwiseError, SpendwiseResult};
use crate::services::{AggregateService, CategoryService};
use crate::storage::Storage;

use super::parse_window;

/// Report subcommands
#[derive(Subcommand)]
pub enum ReportCommands {
    /// Totals and shares per top-level category
    Stats {
        /// First day
        #[arg(long)]
        from: Option<String>,
        /// Last day (requires --from)
        #[arg(long)]
        to: Option<String>,
    },
    /// Records across all accounts grouped by day
    History {
        /// First day
        #[arg(long)]
        from: Option<String>,
        /// Last day (requires --from)
        #[arg(long)]
        to: Option<String>,
    },
    /// Records under one category (a parent includes its sub-categories)
    Category {
        /// Category name or ID
        category: String,
        /// First day
        #[arg(long)]
        from: Option<String>,
        /// Last day (requires --from)
        #[arg(long)]
        to: Option<String>,
    },
}

/// Handle a report command
pub fn handle_report_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ReportCommands,
) -> SpendwiseResult<()> {
    let service = AggregateService::new(storage);
    let user_id = settings.user_id;

    match cmd {
        ReportCommands::Stats { from, to } => {
            let window = parse_window(from.as_deref(), to.as_deref())?;
            let stats = service.statistics(user_id, window)?;
            print!("{}", format_statistics(&stats));
        }

        ReportCommands::History { from, to } => {
            let window = parse_window(from.as_deref(), to.as_deref())?;
            let history = service.history(user_id, window)?;
            print!("{}", format_history("History", &history));
        }

        ReportCommands::Category { category, from, to } => {
            let window = parse_window(from.as_deref(), to.as_deref())?;
            let resolver = CategoryService::new(storage).resolver()?;
            let found = resolver
                .find(&category)
                .ok_or_else(|| SpendwiseError::category_not_found(category.as_str()))?;

            let lines = service.records_in_category(user_id, &[found.id], window)?;
            println!("Records in {}", found.qualified_name());
            print!("{}", format_record_register(&lines));
        }
    }

    Ok(())
}
