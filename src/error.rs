//! Custom error types for Spendwise
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

use crate::models::expense_record::RecordValidationError;

/// The main error type for Spendwise operations
#[derive(Error, Debug)]
pub enum SpendwiseError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models and user input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// A spending limit references an account or category outside the user's ledger
    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    /// A negative amount reached a place where none is allowed
    #[error("Arithmetic invariant violated: {0}")]
    ArithmeticInvariantViolation(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl SpendwiseError {
    /// Create a "not found" error for money accounts
    pub fn account_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Money account",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for money account types
    pub fn account_type_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Money account type",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for cash-flow categories
    pub fn category_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Category",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for expense records
    pub fn record_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Expense record",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for spending limits
    pub fn limit_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Spending limit",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for repeat policies
    pub fn repeat_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Repeat policy",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a scope error
    pub fn is_invalid_scope(&self) -> bool {
        matches!(self, Self::InvalidScope(_))
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for SpendwiseError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SpendwiseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<RecordValidationError> for SpendwiseError {
    fn from(err: RecordValidationError) -> Self {
        if err.is_arithmetic() {
            Self::ArithmeticInvariantViolation(err.to_string())
        } else {
            Self::Validation(err.to_string())
        }
    }
}

impl From<csv::Error> for SpendwiseError {
    fn from(err: csv::Error) -> Self {
        Self::Export(err.to_string())
    }
}

/// Result type alias for Spendwise operations
pub type SpendwiseResult<T> = Result<T, SpendwiseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SpendwiseError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = SpendwiseError::account_not_found("Wallet");
        assert_eq!(err.to_string(), "Money account not found: Wallet");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_invariant_error_display() {
        let err = SpendwiseError::ArithmeticInvariantViolation(
            "amount_of_money must not be negative".into(),
        );
        assert_eq!(
            err.to_string(),
            "Arithmetic invariant violated: amount_of_money must not be negative"
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SpendwiseError = io_err.into();
        assert!(matches!(err, SpendwiseError::Io(_)));
    }
}
