//! Category resolution and taxonomy reads
//!
//! The resolver answers, for any leaf category id, which direction it has
//! and which top-level category it rolls up into.

use std::collections::HashMap;

use crate::error::{SpendwiseError, SpendwiseResult};
use crate::models::{
    CashFlowCategory, CashFlowGroup, CategoryId, Direction, MoneyAccountType, SpendingLimitRepeat,
};
use crate::storage::Storage;

/// The top-level category a leaf rolls up into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryLineage {
    pub id: CategoryId,
    pub name: String,
    pub icon: String,
}

/// Everything known about a leaf category id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCategory {
    pub id: CategoryId,
    pub direction: Direction,
    pub name: String,
    pub icon: String,
    /// Set only for sub-categories
    pub parent_id: Option<CategoryId>,
    /// The category itself when top-level, else its parent
    pub lineage: CategoryLineage,
}

impl ResolvedCategory {
    pub fn is_sub_category(&self) -> bool {
        self.parent_id.is_some()
    }

    /// "Parent / Child" for sub-categories, the plain name otherwise
    pub fn qualified_name(&self) -> String {
        if self.is_sub_category() {
            format!("{} / {}", self.lineage.name, self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Lookup table from leaf id to resolved category
#[derive(Debug, Clone, Default)]
pub struct CategoryResolver {
    entries: HashMap<CategoryId, ResolvedCategory>,
}

impl CategoryResolver {
    /// Index a set of top-level categories
    ///
    /// An id that appears in more than one place (as two parents, as a
    /// parent and a sub-category, or under two parents) is rejected.
    pub fn new(categories: &[CashFlowCategory]) -> SpendwiseResult<Self> {
        let mut entries = HashMap::new();

        for category in categories {
            let lineage = CategoryLineage {
                id: category.id,
                name: category.name.clone(),
                icon: category.icon.clone(),
            };

            let parent = ResolvedCategory {
                id: category.id,
                direction: category.direction,
                name: category.name.clone(),
                icon: category.icon.clone(),
                parent_id: None,
                lineage: lineage.clone(),
            };
            insert_unique(&mut entries, parent)?;

            for sub in &category.sub_categories {
                let child = ResolvedCategory {
                    id: sub.id,
                    direction: category.direction,
                    name: sub.name.clone(),
                    icon: sub.icon.clone(),
                    parent_id: Some(category.id),
                    lineage: lineage.clone(),
                };
                insert_unique(&mut entries, child)?;
            }
        }

        Ok(Self { entries })
    }

    /// Resolve a leaf id, failing with NotFound when it is unknown
    pub fn resolve(&self, id: CategoryId) -> SpendwiseResult<&ResolvedCategory> {
        self.entries
            .get(&id)
            .ok_or_else(|| SpendwiseError::category_not_found(id.to_string()))
    }

    /// Direction of a leaf id
    pub fn direction(&self, id: CategoryId) -> SpendwiseResult<Direction> {
        self.resolve(id).map(|c| c.direction)
    }

    /// Find a leaf by name, qualified name or id string (case-insensitive)
    ///
    /// A top-level category wins over same-named sub-categories. A bare name
    /// shared by sub-categories of different parents is ambiguous and finds
    /// nothing; the qualified name still finds each of them.
    pub fn find(&self, identifier: &str) -> Option<&ResolvedCategory> {
        if let Ok(id) = identifier.parse::<CategoryId>() {
            return self.entries.get(&id);
        }

        let needle = identifier.trim().to_lowercase();
        let mut matches: Vec<_> = self
            .entries
            .values()
            .filter(|c| {
                c.name.to_lowercase() == needle || c.qualified_name().to_lowercase() == needle
            })
            .collect();

        matches.sort_by_key(|c| c.is_sub_category());
        match matches.as_slice() {
            [] => None,
            [first, second, ..] if first.is_sub_category() == second.is_sub_category() => None,
            [first, ..] => Some(*first),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn insert_unique(
    entries: &mut HashMap<CategoryId, ResolvedCategory>,
    category: ResolvedCategory,
) -> SpendwiseResult<()> {
    if let Some(existing) = entries.get(&category.id) {
        return Err(SpendwiseError::Validation(format!(
            "Category id {} is used by both '{}' and '{}'",
            category.id,
            existing.qualified_name(),
            category.qualified_name()
        )));
    }
    entries.insert(category.id, category);
    Ok(())
}

/// Categories of one listing group
#[derive(Debug, Clone)]
pub struct CategoryGroupListing {
    pub group: CashFlowGroup,
    pub categories: Vec<CashFlowCategory>,
}

/// Service for taxonomy reads
pub struct CategoryService<'a> {
    storage: &'a Storage,
}

impl<'a> CategoryService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Build a resolver over the current categories
    pub fn resolver(&self) -> SpendwiseResult<CategoryResolver> {
        CategoryResolver::new(&self.storage.taxonomy.categories()?)
    }

    /// Resolve a single leaf id
    pub fn resolve(&self, id: CategoryId) -> SpendwiseResult<ResolvedCategory> {
        self.resolver()?.resolve(id).cloned()
    }

    /// Categories split into Spending, Revenue and Loan listings
    pub fn list_grouped(&self) -> SpendwiseResult<Vec<CategoryGroupListing>> {
        let categories = self.storage.taxonomy.categories()?;
        Ok(CashFlowGroup::all()
            .iter()
            .map(|group| CategoryGroupListing {
                group: *group,
                categories: categories
                    .iter()
                    .filter(|c| c.group == *group)
                    .cloned()
                    .collect(),
            })
            .collect())
    }

    pub fn list_account_types(&self) -> SpendwiseResult<Vec<MoneyAccountType>> {
        self.storage.taxonomy.account_types()
    }

    pub fn list_repeats(&self) -> SpendwiseResult<Vec<SpendingLimitRepeat>> {
        self.storage.taxonomy.repeats()
    }
}
