//! Taxonomy CLI commands
//!
//! Read-only views of cash-flow categories, account types and repeat
//! policies.

use clap::Subcommand;

use crate::display::category::{
    format_account_types, format_category_details, format_category_tree, format_repeats,
};
use crate::error::{SpendwiseError, SpendwiseResult};
use crate::services::CategoryService;
use crate::storage::Storage;

/// Category subcommands
#[derive(Subcommand)]
pub enum CategoryCommands {
    /// List categories grouped by listing group
    List,
    /// Show a category
    Show {
        /// Category name or ID
        category: String,
    },
    /// List money account types
    Types,
    /// List spending limit repeat policies
    Repeats,
}

/// Handle a category command
pub fn handle_category_command(storage: &Storage, cmd: CategoryCommands) -> SpendwiseResult<()> {
    let service = CategoryService::new(storage);

    match cmd {
        CategoryCommands::List => {
            print!("{}", format_category_tree(&service.list_grouped()?));
        }

        CategoryCommands::Show { category } => {
            let resolver = service.resolver()?;
            let found = resolver
                .find(&category)
                .ok_or_else(|| SpendwiseError::category_not_found(category.as_str()))?;
            print!("{}", format_category_details(found));
        }

        CategoryCommands::Types => {
            print!("{}", format_account_types(&service.list_account_types()?));
        }

        CategoryCommands::Repeats => {
            print!("{}", format_repeats(&service.list_repeats()?));
        }
    }

    Ok(())
}
