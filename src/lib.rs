//! Spendwise - ledger consistency and spending-limit forecasting
//!
//! This library keeps a user's money accounts consistent with the expense
//! records booked against them, aggregates those records by category and by
//! day, and forecasts spending limits from the pace of spending so far.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (accounts, records, categories, limits)
//! - `storage`: JSON file storage layer
//! - `services`: Category resolver, ledger balance engine, aggregates, forecasts
//! - `audit`: Audit logging system
//! - `display`: Terminal formatting
//! - `export`: CSV exports
//! - `cli`: Command handlers for the `spendwise` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use spendwise::config::{paths::SpendwisePaths, settings::Settings};
//! use spendwise::storage::Storage;
//!
//! let paths = SpendwisePaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::new(paths)?;
//! storage.load_all()?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{SpendwiseError, SpendwiseResult};
