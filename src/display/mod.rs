//! Display formatting for terminal output
//!
//! Provides utilities for formatting data models and service results for
//! terminal display.

pub mod account;
pub mod category;
pub mod limit;
pub mod record;
pub mod report;

pub use account::{format_account_details, format_account_list, format_balance_check};
pub use category::{format_account_types, format_category_details, format_category_tree, format_repeats};
pub use limit::{format_limit_report, format_limit_summaries};
pub use record::{format_outcome, format_record_details, format_record_register};
pub use report::{format_history, format_statistics};

use crate::models::Money;

/// Text for an amount that may have overflowed
pub(crate) fn amount_text(amount: Option<Money>) -> String {
    amount.map_or_else(|| "overflow".to_string(), |m| m.to_string())
}
