//! Cash-flow category models
//!
//! Categories form a two-level tree: a parent category carries the direction
//! and an embedded list of sub-categories, which inherit it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::CategoryId;
use super::money::Money;

/// Whether a category moves money out of or into an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Spending,
    Revenue,
}

impl Direction {
    /// Signed balance effect of a record with this direction
    ///
    /// Spending removes the amount and its incurred cost; revenue adds the
    /// amount and never looks at the cost. None when amount plus cost
    /// overflows.
    pub fn effect(&self, amount: Money, cost_incurred: Money) -> Option<Money> {
        match self {
            Self::Spending => amount.checked_add(cost_incurred).map(|total| -total),
            Self::Revenue => Some(amount),
        }
    }

    /// Unsigned total a record with this direction contributes to aggregates
    pub fn total(&self, amount: Money, cost_incurred: Money) -> Option<Money> {
        match self {
            Self::Spending => amount.checked_add(cost_incurred),
            Self::Revenue => Some(amount),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spending => write!(f, "Spending"),
            Self::Revenue => write!(f, "Revenue"),
        }
    }
}

/// Listing group of a top-level category
///
/// Loans are shown apart from ordinary spending and revenue even though
/// each loan category still has one of the two directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashFlowGroup {
    Spending,
    Revenue,
    Loan,
}

impl CashFlowGroup {
    pub fn all() -> &'static [Self] {
        &[Self::Spending, Self::Revenue, Self::Loan]
    }
}

impl fmt::Display for CashFlowGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spending => write!(f, "Spending"),
            Self::Revenue => write!(f, "Revenue"),
            Self::Loan => write!(f, "Loan"),
        }
    }
}

/// A category nested under a parent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategory {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub icon: String,
}

/// A top-level cash-flow category with its sub-categories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowCategory {
    /// Unique identifier
    pub id: CategoryId,

    /// Display name (e.g., "Food & Drink")
    pub name: String,

    #[serde(default)]
    pub icon: String,

    /// Direction inherited by every sub-category
    pub direction: Direction,

    /// Listing group
    pub group: CashFlowGroup,

    #[serde(default)]
    pub sub_categories: Vec<SubCategory>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CashFlowCategory {
    /// Create a new top-level category
    pub fn new(
        name: impl Into<String>,
        icon: impl Into<String>,
        direction: Direction,
        group: CashFlowGroup,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: CategoryId::new(),
            name: name.into(),
            icon: icon.into(),
            direction,
            group,
            sub_categories: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Add a sub-category and return its id
    pub fn add_sub_category(
        &mut self,
        name: impl Into<String>,
        icon: impl Into<String>,
    ) -> CategoryId {
        let sub = SubCategory {
            id: CategoryId::new(),
            name: name.into(),
            icon: icon.into(),
        };
        let id = sub.id;
        self.sub_categories.push(sub);
        self.updated_at = Utc::now();
        id
    }

    /// Builder-style variant of [`add_sub_category`](Self::add_sub_category)
    pub fn with_sub_category(mut self, name: impl Into<String>, icon: impl Into<String>) -> Self {
        self.add_sub_category(name, icon);
        self
    }

    /// Find a nested sub-category by id
    pub fn find_sub_category(&self, id: CategoryId) -> Option<&SubCategory> {
        self.sub_categories.iter().find(|s| s.id == id)
    }

    /// Whether `id` is this category or one of its sub-categories
    pub fn covers(&self, id: CategoryId) -> bool {
        self.id == id || self.find_sub_category(id).is_some()
    }

    /// Validate the category
    pub fn validate(&self) -> Result<(), CategoryValidationError> {
        if self.name.trim().is_empty() {
            return Err(CategoryValidationError::EmptyName);
        }

        if self.name.len() > 50 {
            return Err(CategoryValidationError::NameTooLong(self.name.len()));
        }

        for sub in &self.sub_categories {
            if sub.name.trim().is_empty() {
                return Err(CategoryValidationError::EmptyName);
            }
            if sub.id == self.id {
                return Err(CategoryValidationError::SelfNested(self.name.clone()));
            }
        }

        Ok(())
    }
}

impl fmt::Display for CashFlowCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Validation errors for categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryValidationError {
    EmptyName,
    NameTooLong(usize),
    SelfNested(String),
}

impl fmt::Display for CategoryValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Category name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Category name too long ({} chars, max 50)", len)
            }
            Self::SelfNested(name) => {
                write!(f, "Category '{}' lists itself as a sub-category", name)
            }
        }
    }
}

impl std::error::Error for CategoryValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_sign_rule() {
        let amount = Money::from_major(200);
        let cost = Money::from_major(50);

        assert_eq!(Direction::Spending.effect(amount, cost), Some(Money::from_major(-250)));
        assert_eq!(Direction::Revenue.effect(amount, cost), Some(Money::from_major(200)));
        assert_eq!(Direction::Spending.total(amount, cost), Some(Money::from_major(250)));
        assert_eq!(Direction::Revenue.total(amount, cost), Some(Money::from_major(200)));
    }

    #[test]
    fn test_sub_categories() {
        let mut food = CashFlowCategory::new(
            "Food & Drink",
            "🍜",
            Direction::Spending,
            CashFlowGroup::Spending,
        );
        let coffee = food.add_sub_category("Coffee", "☕");

        assert!(food.covers(food.id));
        assert!(food.covers(coffee));
        assert!(!food.covers(CategoryId::new()));
        assert_eq!(food.find_sub_category(coffee).unwrap().name, "Coffee");
    }

    #[test]
    fn test_validation() {
        let mut category =
            CashFlowCategory::new("Salary", "", Direction::Revenue, CashFlowGroup::Revenue);
        assert!(category.validate().is_ok());

        category.sub_categories.push(SubCategory {
            id: category.id,
            name: "Loop".into(),
            icon: String::new(),
        });
        assert!(matches!(
            category.validate(),
            Err(CategoryValidationError::SelfNested(_))
        ));

        category.name = String::new();
        assert_eq!(category.validate(), Err(CategoryValidationError::EmptyName));
    }
}
