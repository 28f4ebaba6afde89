//! Storage initialization
//!
//! Handles first-run setup and the default taxonomy.

use tracing::info;

use crate::error::SpendwiseResult;
use crate::models::{
    AccountKind, CashFlowCategory, CashFlowGroup, Direction, MoneyAccountType, RepeatCadence,
    SpendingLimitRepeat,
};

use super::taxonomy::TaxonomyData;
use super::Storage;

/// Initialize storage for a fresh installation
///
/// Seeds the default taxonomy when none exists yet. Returns whether seeding
/// happened.
pub fn initialize_storage(storage: &Storage) -> SpendwiseResult<bool> {
    storage.paths().ensure_directories()?;

    if !storage.taxonomy.is_empty()? {
        return Ok(false);
    }

    let taxonomy = default_taxonomy();
    info!(
        categories = taxonomy.categories.len(),
        account_types = taxonomy.account_types.len(),
        "seeding default taxonomy"
    );
    storage.taxonomy.replace(taxonomy)?;
    Ok(true)
}

/// The taxonomy a new installation starts with
pub fn default_taxonomy() -> TaxonomyData {
    use CashFlowGroup as G;
    use Direction as D;

    let categories = vec![
        CashFlowCategory::new("Food & Drink", "🍜", D::Spending, G::Spending)
            .with_sub_category("Groceries", "🛒")
            .with_sub_category("Restaurants", "🍽")
            .with_sub_category("Coffee", "☕"),
        CashFlowCategory::new("Transport", "🚌", D::Spending, G::Spending)
            .with_sub_category("Fuel", "⛽")
            .with_sub_category("Taxi", "🚕")
            .with_sub_category("Parking", "🅿"),
        CashFlowCategory::new("Bills & Utilities", "🧾", D::Spending, G::Spending)
            .with_sub_category("Electricity", "💡")
            .with_sub_category("Water", "🚰")
            .with_sub_category("Internet", "🌐")
            .with_sub_category("Rent", "🏠"),
        CashFlowCategory::new("Shopping", "🛍", D::Spending, G::Spending)
            .with_sub_category("Clothing", "👕")
            .with_sub_category("Electronics", "💻"),
        CashFlowCategory::new("Health", "💊", D::Spending, G::Spending),
        CashFlowCategory::new("Entertainment", "🎬", D::Spending, G::Spending),
        CashFlowCategory::new("Fees & Charges", "🏦", D::Spending, G::Spending),
        CashFlowCategory::new("Salary", "💼", D::Revenue, G::Revenue),
        CashFlowCategory::new("Bonus", "🎁", D::Revenue, G::Revenue),
        CashFlowCategory::new("Interest", "📈", D::Revenue, G::Revenue),
        CashFlowCategory::new("Other Income", "💰", D::Revenue, G::Revenue),
        CashFlowCategory::new("Lend", "🤝", D::Spending, G::Loan),
        CashFlowCategory::new("Repayment", "↩", D::Spending, G::Loan),
        CashFlowCategory::new("Borrow", "📥", D::Revenue, G::Loan),
        CashFlowCategory::new("Debt Collection", "📬", D::Revenue, G::Loan),
    ];

    let account_types = vec![
        MoneyAccountType::new("Cash", "💵", AccountKind::Cash),
        MoneyAccountType::new("Bank account", "🏦", AccountKind::BankAccount),
        MoneyAccountType::new("Credit card", "💳", AccountKind::CreditCard),
        MoneyAccountType::new("E-wallet", "📱", AccountKind::EWallet),
        MoneyAccountType::new("Investment", "📊", AccountKind::Investment),
        MoneyAccountType::new("Other", "📁", AccountKind::Other),
    ];

    let repeats = vec![
        SpendingLimitRepeat::new("Does not repeat", RepeatCadence::Once),
        SpendingLimitRepeat::new("Every day", RepeatCadence::Daily),
        SpendingLimitRepeat::new("Every week", RepeatCadence::Weekly),
        SpendingLimitRepeat::new("Every month", RepeatCadence::Monthly),
        SpendingLimitRepeat::new("Every quarter", RepeatCadence::Quarterly),
        SpendingLimitRepeat::new("Every year", RepeatCadence::Yearly),
    ];

    TaxonomyData {
        categories,
        account_types,
        repeats,
    }
}
