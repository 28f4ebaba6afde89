//! Taxonomy display formatting
//!
//! Formats cash-flow categories, account types and repeat policies.

use crate::models::{MoneyAccountType, SpendingLimitRepeat};
use crate::services::category::{CategoryGroupListing, ResolvedCategory};

/// Format categories as a tree grouped by listing group
pub fn format_category_tree(groups: &[CategoryGroupListing]) -> String {
    if groups.iter().all(|g| g.categories.is_empty()) {
        return "No categories found.\n\nRun 'spendwise init' to create default categories."
            .to_string();
    }

    let mut output = String::new();

    for (i, listing) in groups.iter().enumerate() {
        output.push_str(&format!("{}\n", listing.group));

        if listing.categories.is_empty() {
            output.push_str("  (no categories)\n");
        }

        for (j, category) in listing.categories.iter().enumerate() {
            let is_last = j == listing.categories.len() - 1;
            let (prefix, indent) = if is_last {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };

            output.push_str(&format!(
                "  {}{} {} ({})\n",
                prefix, category.icon, category.name, category.direction
            ));

            for (k, sub) in category.sub_categories.iter().enumerate() {
                let sub_prefix = if k == category.sub_categories.len() - 1 {
                    "└── "
                } else {
                    "├── "
                };
                output.push_str(&format!(
                    "  {}{}{} {}\n",
                    indent, sub_prefix, sub.icon, sub.name
                ));
            }
        }

        if i < groups.len() - 1 {
            output.push('\n');
        }
    }

    output
}

/// Format a resolved category
pub fn format_category_details(category: &ResolvedCategory) -> String {
    let mut output = String::new();

    output.push_str(&format!("Category:  {} {}\n", category.icon, category.name));
    output.push_str(&format!("  ID:        {}\n", category.id));
    output.push_str(&format!("  Direction: {}\n", category.direction));
    if category.is_sub_category() {
        output.push_str(&format!(
            "  Parent:    {} ({})\n",
            category.lineage.name, category.lineage.id
        ));
    }

    output
}

/// Format the account type catalog
pub fn format_account_types(types: &[MoneyAccountType]) -> String {
    if types.is_empty() {
        return "No account types found.".to_string();
    }

    let mut output = String::from("Account Types:\n");
    for account_type in types {
        output.push_str(&format!(
            "  {} {:<16} {}\n",
            account_type.icon, account_type.name, account_type.kind
        ));
    }
    output
}

/// Format the repeat policy catalog
pub fn format_repeats(repeats: &[SpendingLimitRepeat]) -> String {
    if repeats.is_empty() {
        return "No repeat policies found.".to_string();
    }

    let mut output = String::from("Repeat Policies:\n");
    for repeat in repeats {
        output.push_str(&format!("  {:<18} {}\n", repeat.name, repeat.cadence));
    }
    output
}
