use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Cents, Transaction, TransactionKind, YearMonth};

/// Income and expense totals for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub month: YearMonth,
    pub income: Cents,
    pub expense: Cents,
}

impl MonthlySummary {
    pub fn balance(&self) -> Cents {
        self.income - self.expense
    }
}

/// Per-category aggregate for a month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Cents,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryReport {
    pub month: YearMonth,
    /// `None` means both kinds were combined
    pub kind: Option<TransactionKind>,
    pub categories: Vec<CategoryTotal>,
    pub total: Cents,
}

impl CategoryReport {
    /// Share of the report total for one category, in percent.
    pub fn percentage(&self, entry: &CategoryTotal) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            entry.total as f64 * 100.0 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub kind: Option<TransactionKind>,
    pub total: Cents,
}

/// One page of the transaction history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionPage {
    pub items: Vec<Transaction>,
    /// 1-based
    pub page: i64,
    pub page_count: i64,
    pub total: i64,
}

/// Number of pages needed to show `count` rows, `page_size` at a time.
pub fn page_count(count: i64, page_size: i64) -> i64 {
    if count <= 0 || page_size <= 0 {
        return 0;
    }
    (count - 1) / page_size + 1
}
