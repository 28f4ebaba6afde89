//! Export module for Spendwise
//!
//! Spreadsheet-compatible CSV exports of a user's records and accounts.

pub mod csv;

pub use self::csv::{export_accounts_csv, export_records_csv};
