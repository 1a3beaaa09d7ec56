// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDateTime;
use tally::application::LedgerService;
use tally::domain::{parse_timestamp, Transaction, TransactionKind};
use tempfile::TempDir;

/// Helper to create a test service with a temporary, initialized database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to parse "YYYY-MM-DD" or "YYYY-MM-DD HH:MM:SS"
pub fn ts(input: &str) -> NaiveDateTime {
    parse_timestamp(input).unwrap()
}

pub async fn expense(
    service: &LedgerService,
    category: &str,
    amount: i64,
    at: &str,
) -> Result<Transaction> {
    Ok(service
        .add_transaction(TransactionKind::Expense, category, amount, None, ts(at))
        .await?)
}

pub async fn income(
    service: &LedgerService,
    category: &str,
    amount: i64,
    at: &str,
) -> Result<Transaction> {
    Ok(service
        .add_transaction(TransactionKind::Income, category, amount, None, ts(at))
        .await?)
}
