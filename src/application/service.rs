use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::domain::{
    default_categories, Category, Cents, Transaction, TransactionId, TransactionKind, YearMonth,
};
use crate::storage::Repository;

use super::{
    page_count, AppError, CategoryReport, DailyTotal, MonthlySummary, TransactionPage,
};

/// Application service providing the ledger operations.
/// This is the only surface clients (CLI, tests, any future GUI) depend on.
pub struct LedgerService {
    repo: Repository,
}

/// Parse a kind typed by a user. Empty or unknown text is rejected.
pub fn parse_kind(input: &str) -> Result<TransactionKind, AppError> {
    TransactionKind::from_str(input).ok_or_else(|| AppError::InvalidKind(input.to_string()))
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Open (creating if needed) the database at the given path and
    /// make sure the schema and default catalog exist.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::connect(&db_url).await?;
        let service = Self::new(repo);
        service.initialize().await?;
        Ok(service)
    }

    /// Connect to an existing database without touching its schema.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Create missing tables and seed the category catalog if it is empty.
    /// Safe to call on every startup. Returns how many categories were seeded.
    pub async fn initialize(&self) -> Result<u64, AppError> {
        self.repo.migrate().await?;
        let seeded = self.repo.seed_categories(&default_categories()).await?;
        if seeded > 0 {
            tracing::info!(seeded, "seeded default category catalog");
        }
        Ok(seeded)
    }

    // ========================
    // Transaction operations
    // ========================

    /// Record a new transaction.
    pub async fn add_transaction(
        &self,
        kind: TransactionKind,
        category: &str,
        amount_cents: Cents,
        note: Option<String>,
        timestamp: NaiveDateTime,
    ) -> Result<Transaction, AppError> {
        if amount_cents <= 0 {
            return Err(AppError::InvalidAmount(
                "Amount must be positive".to_string(),
            ));
        }

        let category = category.trim();
        if category.is_empty() {
            return Err(AppError::InvalidCategory(
                "Category must not be empty".to_string(),
            ));
        }

        let mut transaction = Transaction::new(kind, category, amount_cents, timestamp);
        if let Some(note) = note {
            transaction = transaction.with_note(note);
        }

        self.repo.save_transaction(&mut transaction).await?;

        tracing::info!(
            id = %transaction.id,
            kind = %transaction.kind,
            category = %transaction.category,
            amount_cents = transaction.amount_cents,
            "recorded transaction"
        );
        Ok(transaction)
    }

    pub async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, AppError> {
        Ok(self.repo.get_transaction(id).await?)
    }

    /// List transactions newest first, `limit` rows starting at `offset`.
    pub async fn list_transactions(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>, AppError> {
        if limit < 1 {
            return Err(AppError::InvalidPageSize);
        }
        Ok(self
            .repo
            .list_transactions(Some(limit), offset.max(0))
            .await?)
    }

    /// Every transaction, newest first.
    pub async fn list_all_transactions(&self) -> Result<Vec<Transaction>, AppError> {
        Ok(self.repo.list_transactions(None, 0).await?)
    }

    pub async fn count_transactions(&self) -> Result<i64, AppError> {
        Ok(self.repo.count_transactions().await?)
    }

    /// Number of pages of `page_size` rows needed for the whole history.
    pub async fn page_count(&self, page_size: i64) -> Result<i64, AppError> {
        if page_size < 1 {
            return Err(AppError::InvalidPageSize);
        }
        let count = self.repo.count_transactions().await?;
        Ok(page_count(count, page_size))
    }

    /// Fetch a 1-based page of history. Out-of-range page numbers are
    /// clamped to the first or last page.
    pub async fn list_page(&self, page: i64, page_size: i64) -> Result<TransactionPage, AppError> {
        if page_size < 1 {
            return Err(AppError::InvalidPageSize);
        }
        let total = self.repo.count_transactions().await?;
        let pages = page_count(total, page_size);
        let page = page.clamp(1, pages.max(1));

        let items = self
            .repo
            .list_transactions(Some(page_size), (page - 1) * page_size)
            .await?;

        Ok(TransactionPage {
            items,
            page,
            page_count: pages,
            total,
        })
    }

    /// Transactions from the last `days` days up to `now`, newest first.
    /// A window reaching past the earliest representable date covers everything.
    pub async fn list_recent(
        &self,
        days: i64,
        now: NaiveDateTime,
    ) -> Result<Vec<Transaction>, AppError> {
        let since = Duration::try_days(days.max(0))
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(NaiveDateTime::MIN);
        Ok(self.repo.list_transactions_since(since).await?)
    }

    /// Delete a transaction. Returns false if there was nothing to delete.
    pub async fn delete_transaction(&self, id: TransactionId) -> Result<bool, AppError> {
        let deleted = self.repo.delete_transaction(id).await?;
        if deleted {
            tracing::info!(%id, "deleted transaction");
        } else {
            tracing::debug!(%id, "no transaction to delete");
        }
        Ok(deleted)
    }

    // ========================
    // Summaries
    // ========================

    /// Income and expense totals for a calendar month.
    pub async fn monthly_summary(&self, month: YearMonth) -> Result<MonthlySummary, AppError> {
        let (start, end) = Self::month_bounds(month)?;
        let (income, expense) = self.repo.sum_by_kind(start, end).await?;
        Ok(MonthlySummary {
            month,
            income,
            expense,
        })
    }

    /// Per-category totals for a calendar month. `None` combines both kinds.
    pub async fn category_summary(
        &self,
        kind: Option<TransactionKind>,
        month: YearMonth,
    ) -> Result<CategoryReport, AppError> {
        let (start, end) = Self::month_bounds(month)?;
        let categories = self.repo.category_totals(kind, start, end).await?;
        let total = categories.iter().map(|c| c.total).sum();

        Ok(CategoryReport {
            month,
            kind,
            categories,
            total,
        })
    }

    /// Total for one calendar day, optionally for one kind.
    pub async fn daily_total(
        &self,
        date: NaiveDate,
        kind: Option<TransactionKind>,
    ) -> Result<DailyTotal, AppError> {
        let start = date.and_time(NaiveTime::MIN);
        let end = start + Duration::days(1);
        let total = self.repo.sum_in_range(kind, start, end).await?;
        Ok(DailyTotal { date, kind, total })
    }

    fn month_bounds(month: YearMonth) -> Result<(NaiveDateTime, NaiveDateTime), AppError> {
        month.bounds().ok_or(AppError::InvalidMonth {
            year: month.year(),
            month: month.month(),
        })
    }

    // ========================
    // Categories
    // ========================

    /// The category catalog in storage order, optionally for one kind.
    pub async fn list_categories(
        &self,
        kind: Option<TransactionKind>,
    ) -> Result<Vec<Category>, AppError> {
        Ok(self.repo.list_categories(kind).await?)
    }
}
