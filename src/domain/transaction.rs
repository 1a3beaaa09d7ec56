use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;

pub type TransactionId = Uuid;

/// Direction of money for a transaction. Amounts are always positive;
/// the kind decides whether they count as money in or money out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Some(TransactionKind::Income),
            "expense" => Some(TransactionKind::Expense),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single ledger entry. Transactions are never edited in place,
/// only created and deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Insertion order, assigned by the repository. Breaks timestamp ties.
    pub sequence: i64,
    pub kind: TransactionKind,
    pub category: String,
    /// Amount in cents (always positive)
    pub amount_cents: Cents,
    pub note: Option<String>,
    /// Local wall-clock time the money moved
    pub timestamp: NaiveDateTime,
    /// When we recorded this transaction in the system
    pub recorded_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction. Sequence number must be assigned by the repository.
    pub fn new(
        kind: TransactionKind,
        category: impl Into<String>,
        amount_cents: Cents,
        timestamp: NaiveDateTime,
    ) -> Self {
        assert!(amount_cents > 0, "Transaction amount must be positive");
        Self {
            id: Uuid::new_v4(),
            sequence: 0,
            kind,
            category: category.into(),
            amount_cents,
            note: None,
            timestamp,
            recorded_at: Utc::now(),
        }
    }

    /// Attach a note. Blank notes are stored as no note at all.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        let note = note.into();
        self.note = if note.trim().is_empty() {
            None
        } else {
            Some(note)
        };
        self
    }

    /// Signed amount: positive for income, negative for expenses.
    pub fn signed_amount(&self) -> Cents {
        match self.kind {
            TransactionKind::Income => self.amount_cents,
            TransactionKind::Expense => -self.amount_cents,
        }
    }
}
