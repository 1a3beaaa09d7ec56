use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{ConnectOptions, Connection, Row};
use uuid::Uuid;

use crate::application::CategoryTotal;
use crate::domain::{
    format_timestamp, parse_timestamp, Category, Cents, Transaction, TransactionId,
    TransactionKind,
};

use super::MIGRATION_001_INITIAL;

const TRANSACTION_COLUMNS: &str =
    "sequence, id, kind, category, amount_cents, note, timestamp, recorded_at";

/// Repository for persisting and querying transactions and categories.
///
/// The repository holds connect options, not a live connection. Every
/// operation opens its own connection and closes it before returning.
pub struct Repository {
    options: SqliteConnectOptions,
}

impl Repository {
    /// Create a new repository from prepared connect options.
    pub fn new(options: SqliteConnectOptions) -> Self {
        Self { options }
    }

    /// Connect to a SQLite database URL (e.g. `sqlite:ledger.db?mode=rwc`).
    /// Opens one connection up front so a missing or unreadable file fails here.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url).context("Invalid database URL")?;
        let repo = Self::new(options);
        repo.open().await?.close().await.context("Failed to close database")?;
        Ok(repo)
    }

    async fn open(&self) -> Result<SqliteConnection> {
        self.options
            .connect()
            .await
            .context("Failed to connect to database")
    }

    /// Create tables if they do not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        let mut conn = self.open().await?;
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&mut conn)
            .await
            .context("Failed to run migration 001")?;
        conn.close().await.context("Failed to close database")?;
        Ok(())
    }

    // ========================
    // Category operations
    // ========================

    /// Insert `categories` if and only if the catalog is empty.
    /// Returns the number of rows inserted.
    pub async fn seed_categories(&self, categories: &[Category]) -> Result<u64> {
        let mut conn = self.open().await?;
        let mut tx = conn.begin().await.context("Failed to begin transaction")?;

        let existing: i64 = sqlx::query("SELECT COUNT(*) as count FROM categories")
            .fetch_one(&mut *tx)
            .await
            .context("Failed to count categories")?
            .get("count");

        let mut inserted = 0;
        if existing == 0 {
            for category in categories {
                inserted += sqlx::query(
                    "INSERT OR IGNORE INTO categories (kind, name, icon) VALUES (?, ?, ?)",
                )
                .bind(category.kind.as_str())
                .bind(&category.name)
                .bind(&category.icon)
                .execute(&mut *tx)
                .await
                .context("Failed to seed category")?
                .rows_affected();
            }
        }

        tx.commit().await.context("Failed to commit categories")?;
        conn.close().await.context("Failed to close database")?;

        tracing::debug!(existing, inserted, "category catalog checked");
        Ok(inserted)
    }

    /// List categories in storage order, optionally for one kind.
    pub async fn list_categories(&self, kind: Option<TransactionKind>) -> Result<Vec<Category>> {
        let mut query = String::from("SELECT kind, name, icon FROM categories");
        if kind.is_some() {
            query.push_str(" WHERE kind = ?");
        }
        query.push_str(" ORDER BY position");

        let mut sql_query = sqlx::query(&query);
        if let Some(kind) = kind {
            sql_query = sql_query.bind(kind.as_str());
        }

        let mut conn = self.open().await?;
        let rows = sql_query
            .fetch_all(&mut conn)
            .await
            .context("Failed to list categories")?;
        conn.close().await.context("Failed to close database")?;

        rows.iter().map(Self::row_to_category).collect()
    }

    fn row_to_category(row: &SqliteRow) -> Result<Category> {
        let kind_str: String = row.get("kind");
        Ok(Category {
            kind: TransactionKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid category kind: {}", kind_str))?,
            name: row.get("name"),
            icon: row.get("icon"),
        })
    }

    // ========================
    // Transaction operations
    // ========================

    /// Save a new transaction. Assigns the sequence number from the row id.
    pub async fn save_transaction(&self, transaction: &mut Transaction) -> Result<()> {
        let mut conn = self.open().await?;
        let mut tx = conn.begin().await.context("Failed to begin transaction")?;

        let result = sqlx::query(
            r#"
            INSERT INTO transactions (id, kind, category, amount_cents, note, timestamp, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(transaction.id.to_string())
        .bind(transaction.kind.as_str())
        .bind(&transaction.category)
        .bind(transaction.amount_cents)
        .bind(&transaction.note)
        .bind(format_timestamp(transaction.timestamp))
        .bind(transaction.recorded_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .context("Failed to save transaction")?;

        tx.commit().await.context("Failed to commit transaction")?;
        conn.close().await.context("Failed to close database")?;

        transaction.sequence = result.last_insert_rowid();
        tracing::debug!(id = %transaction.id, sequence = transaction.sequence, "transaction saved");
        Ok(())
    }

    /// Get a transaction by ID.
    pub async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>> {
        let query = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?");

        let mut conn = self.open().await?;
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&mut conn)
            .await
            .context("Failed to fetch transaction")?;
        conn.close().await.context("Failed to close database")?;

        row.as_ref().map(Self::row_to_transaction).transpose()
    }

    /// List transactions newest first. Equal timestamps list the most
    /// recently inserted row first.
    pub async fn list_transactions(
        &self,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<Vec<Transaction>> {
        let query = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions \
             ORDER BY timestamp DESC, sequence DESC LIMIT ? OFFSET ?"
        );

        let mut conn = self.open().await?;
        let rows = sqlx::query(&query)
            // SQLite treats a negative limit as "no limit"
            .bind(limit.unwrap_or(-1))
            .bind(offset)
            .fetch_all(&mut conn)
            .await
            .context("Failed to list transactions")?;
        conn.close().await.context("Failed to close database")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// List transactions at or after `since`, newest first.
    pub async fn list_transactions_since(&self, since: NaiveDateTime) -> Result<Vec<Transaction>> {
        let query = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions \
             WHERE timestamp >= ? ORDER BY timestamp DESC, sequence DESC"
        );

        let mut conn = self.open().await?;
        let rows = sqlx::query(&query)
            .bind(format_timestamp(since))
            .fetch_all(&mut conn)
            .await
            .context("Failed to list recent transactions")?;
        conn.close().await.context("Failed to close database")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    pub async fn count_transactions(&self) -> Result<i64> {
        let mut conn = self.open().await?;
        let count: i64 = sqlx::query("SELECT COUNT(*) as count FROM transactions")
            .fetch_one(&mut conn)
            .await
            .context("Failed to count transactions")?
            .get("count");
        conn.close().await.context("Failed to close database")?;
        Ok(count)
    }

    /// Delete a transaction. Returns false when no row had that ID.
    pub async fn delete_transaction(&self, id: TransactionId) -> Result<bool> {
        let mut conn = self.open().await?;
        let mut tx = conn.begin().await.context("Failed to begin transaction")?;

        let affected = sqlx::query("DELETE FROM transactions WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to delete transaction")?
            .rows_affected();

        tx.commit().await.context("Failed to commit delete")?;
        conn.close().await.context("Failed to close database")?;

        tracing::debug!(%id, affected, "delete executed");
        Ok(affected > 0)
    }

    /// Sum income and expense separately within `[start, end)`.
    /// Returns `(income, expense)`; either is 0 when there are no rows.
    pub async fn sum_by_kind(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<(Cents, Cents)> {
        let mut conn = self.open().await?;
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN kind = 'income' THEN amount_cents ELSE 0 END), 0) as income,
                COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount_cents ELSE 0 END), 0) as expense
            FROM transactions
            WHERE timestamp >= ? AND timestamp < ?
            "#,
        )
        .bind(format_timestamp(start))
        .bind(format_timestamp(end))
        .fetch_one(&mut conn)
        .await
        .context("Failed to sum transactions by kind")?;
        conn.close().await.context("Failed to close database")?;

        Ok((row.get("income"), row.get("expense")))
    }

    /// Sum amounts within `[start, end)`, optionally for one kind.
    pub async fn sum_in_range(
        &self,
        kind: Option<TransactionKind>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Cents> {
        let mut query = String::from(
            "SELECT COALESCE(SUM(amount_cents), 0) as total FROM transactions \
             WHERE timestamp >= ? AND timestamp < ?",
        );
        if kind.is_some() {
            query.push_str(" AND kind = ?");
        }

        let mut sql_query = sqlx::query(&query)
            .bind(format_timestamp(start))
            .bind(format_timestamp(end));
        if let Some(kind) = kind {
            sql_query = sql_query.bind(kind.as_str());
        }

        let mut conn = self.open().await?;
        let total: Cents = sql_query
            .fetch_one(&mut conn)
            .await
            .context("Failed to sum transactions")?
            .get("total");
        conn.close().await.context("Failed to close database")?;
        Ok(total)
    }

    /// Aggregate amounts per category within `[start, end)`.
    /// Without a kind filter, same-named categories of both kinds are combined.
    pub async fn category_totals(
        &self,
        kind: Option<TransactionKind>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<CategoryTotal>> {
        let mut query = String::from(
            "SELECT category, SUM(amount_cents) as total, COUNT(*) as count FROM transactions \
             WHERE timestamp >= ? AND timestamp < ?",
        );
        if kind.is_some() {
            query.push_str(" AND kind = ?");
        }
        query.push_str(" GROUP BY category ORDER BY total DESC, category ASC");

        let mut sql_query = sqlx::query(&query)
            .bind(format_timestamp(start))
            .bind(format_timestamp(end));
        if let Some(kind) = kind {
            sql_query = sql_query.bind(kind.as_str());
        }

        let mut conn = self.open().await?;
        let rows = sql_query
            .fetch_all(&mut conn)
            .await
            .context("Failed to aggregate categories")?;
        conn.close().await.context("Failed to close database")?;

        Ok(rows
            .iter()
            .map(|row| CategoryTotal {
                category: row.get("category"),
                total: row.get("total"),
                count: row.get("count"),
            })
            .collect())
    }

    fn row_to_transaction(row: &SqliteRow) -> Result<Transaction> {
        let id_str: String = row.get("id");
        let kind_str: String = row.get("kind");
        let timestamp_str: String = row.get("timestamp");
        let recorded_at_str: String = row.get("recorded_at");

        Ok(Transaction {
            id: Uuid::parse_str(&id_str).context("Invalid transaction ID")?,
            sequence: row.get("sequence"),
            kind: TransactionKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid transaction kind: {}", kind_str))?,
            category: row.get("category"),
            amount_cents: row.get("amount_cents"),
            note: row.get("note"),
            timestamp: parse_timestamp(&timestamp_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid timestamp: {}", timestamp_str))?,
            recorded_at: DateTime::parse_from_rfc3339(&recorded_at_str)
                .context("Invalid recorded_at")?
                .with_timezone(&Utc),
        })
    }
}
