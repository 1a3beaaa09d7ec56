use serde::{Deserialize, Serialize};

use super::TransactionKind;

/// A label transactions are filed under. Names are unique within a kind,
/// so "其他" can exist once as income and once as expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub kind: TransactionKind,
    pub name: String,
    /// Opaque icon identifier for whatever front end renders the catalog
    pub icon: String,
}

impl Category {
    pub fn new(kind: TransactionKind, name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            icon: icon.into(),
        }
    }
}

/// Catalog seeded into an empty database, in storage order.
pub const DEFAULT_CATEGORIES: &[(TransactionKind, &str, &str)] = &[
    (TransactionKind::Expense, "餐饮", "food"),
    (TransactionKind::Expense, "交通", "transport"),
    (TransactionKind::Expense, "购物", "shopping"),
    (TransactionKind::Expense, "娱乐", "entertainment"),
    (TransactionKind::Expense, "居住", "housing"),
    (TransactionKind::Expense, "医疗", "medical"),
    (TransactionKind::Expense, "其他", "other"),
    (TransactionKind::Income, "工资", "salary"),
    (TransactionKind::Income, "奖金", "bonus"),
    (TransactionKind::Income, "理财", "investment"),
    (TransactionKind::Income, "其他", "other"),
];

pub fn default_categories() -> Vec<Category> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(kind, name, icon)| Category::new(*kind, *name, *icon))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_catalog_shape() {
        let catalog = default_categories();
        let expense = catalog
            .iter()
            .filter(|c| c.kind == TransactionKind::Expense)
            .count();
        let income = catalog
            .iter()
            .filter(|c| c.kind == TransactionKind::Income)
            .count();

        assert_eq!(expense, 7);
        assert_eq!(income, 4);
    }

    #[test]
    fn test_default_names_unique_within_kind() {
        let mut seen = HashSet::new();
        for category in default_categories() {
            assert!(
                seen.insert((category.kind, category.name.clone())),
                "duplicate default category {} ({})",
                category.name,
                category.kind
            );
        }
    }
}
