//! Money account model
//!
//! Represents the places money lives (wallets, bank accounts, credit cards,
//! etc.) together with the account-type catalog they reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{MoneyAccountId, MoneyAccountTypeId, UserId};
use super::money::Money;

/// Closed set of account kinds
///
/// The kind decides which optional account fields are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Cash,
    BankAccount,
    CreditCard,
    EWallet,
    Investment,
    Other,
}

impl AccountKind {
    /// Whether accounts of this kind carry a bank name
    pub fn supports_bank(&self) -> bool {
        matches!(self, Self::BankAccount | Self::CreditCard)
    }

    /// Whether accounts of this kind carry a credit limit
    pub fn supports_credit_limit(&self) -> bool {
        matches!(self, Self::CreditCard)
    }

    /// Parse an account kind from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "cash" => Some(Self::Cash),
            "bank" | "bank_account" => Some(Self::BankAccount),
            "credit" | "credit_card" => Some(Self::CreditCard),
            "ewallet" | "e_wallet" => Some(Self::EWallet),
            "investment" => Some(Self::Investment),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cash => write!(f, "Cash"),
            Self::BankAccount => write!(f, "Bank account"),
            Self::CreditCard => write!(f, "Credit card"),
            Self::EWallet => write!(f, "E-wallet"),
            Self::Investment => write!(f, "Investment"),
            Self::Other => write!(f, "Other"),
        }
    }
}

/// An entry of the money account type catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyAccountType {
    pub id: MoneyAccountTypeId,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    pub kind: AccountKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MoneyAccountType {
    pub fn new(name: impl Into<String>, icon: impl Into<String>, kind: AccountKind) -> Self {
        let now = Utc::now();
        Self {
            id: MoneyAccountTypeId::new(),
            name: name.into(),
            icon: icon.into(),
            kind,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A money account owned by one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyAccount {
    /// Unique identifier
    pub id: MoneyAccountId,

    /// Owning user
    pub user_id: UserId,

    /// Account name (e.g., "Wallet")
    pub name: String,

    /// Materialized balance: opening balance plus the effect of every record
    pub account_balance: Money,

    /// Balance the record effects are applied on top of
    pub opening_balance: Money,

    /// Account type reference
    pub money_account_type_id: MoneyAccountTypeId,

    #[serde(default)]
    pub description: String,

    /// Whether the account shows up in reports
    #[serde(default = "default_true")]
    pub report: bool,

    /// Bank name, for bank accounts and credit cards
    #[serde(default)]
    pub select_bank: Option<String>,

    /// Credit limit, for credit cards
    #[serde(default)]
    pub credit_limit_number: Option<Money>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl MoneyAccount {
    /// Create a new account with an opening balance
    pub fn new(
        user_id: UserId,
        name: impl Into<String>,
        money_account_type_id: MoneyAccountTypeId,
        opening_balance: Money,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: MoneyAccountId::new(),
            user_id,
            name: name.into(),
            account_balance: opening_balance,
            opening_balance,
            money_account_type_id,
            description: String::new(),
            report: true,
            select_bank: None,
            credit_limit_number: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a signed balance delta and stamp the account
    ///
    /// Returns the new balance, or None when it would overflow. The account
    /// is left unchanged in that case.
    pub fn apply_delta(&mut self, delta: Money) -> Option<Money> {
        let balance = self.account_balance.checked_add(delta)?;
        self.account_balance = balance;
        self.updated_at = Utc::now();
        Some(balance)
    }

    /// Explicit balance edit
    ///
    /// Shifts the opening balance by the same amount so the balance stays
    /// the opening balance plus the sum of record effects.
    pub fn set_balance(&mut self, balance: Money) -> Option<()> {
        let opening = balance
            .checked_sub(self.account_balance)
            .and_then(|shift| self.opening_balance.checked_add(shift))?;
        self.opening_balance = opening;
        self.account_balance = balance;
        self.updated_at = Utc::now();
        Some(())
    }

    /// Drop the optional fields the account kind does not carry
    pub fn conform_to_kind(&mut self, kind: AccountKind) {
        if !kind.supports_bank() {
            self.select_bank = None;
        }
        if !kind.supports_credit_limit() {
            self.credit_limit_number = None;
        }
    }

    /// Validate the account
    pub fn validate(&self) -> Result<(), AccountValidationError> {
        if self.name.trim().is_empty() {
            return Err(AccountValidationError::EmptyName);
        }

        if self.name.len() > 100 {
            return Err(AccountValidationError::NameTooLong(self.name.len()));
        }

        if let Some(limit) = self.credit_limit_number {
            if limit.is_negative() {
                return Err(AccountValidationError::NegativeCreditLimit);
            }
        }

        Ok(())
    }
}

impl fmt::Display for MoneyAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.account_balance)
    }
}

/// Validation errors for accounts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    EmptyName,
    NameTooLong(usize),
    NegativeCreditLimit,
}

impl fmt::Display for AccountValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Account name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Account name too long ({} chars, max 100)", len)
            }
            Self::NegativeCreditLimit => write!(f, "Credit limit cannot be negative"),
        }
    }
}

impl std::error::Error for AccountValidationError {}
