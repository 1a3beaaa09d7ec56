use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use crate::application::LedgerService;
use crate::domain::{format_cents, format_timestamp};

/// Column header of exported files.
pub const CSV_HEADER: [&str; 4] = ["Date", "Amount", "Category", "Note"];

/// UTF-8 byte-order mark. Spreadsheet tools need it to detect UTF-8 and
/// show non-ASCII categories and notes correctly.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// File name for an export taken at `now`, e.g. `ledger_20240315_093000.csv`.
pub fn export_file_name(now: NaiveDateTime) -> String {
    format!("ledger_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// Exporter for writing ledger data to flat files
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export all transactions, newest first, as CSV. Returns the row count.
    pub async fn export_transactions_csv<W: Write>(&self, mut writer: W) -> Result<usize> {
        let transactions = self.service.list_all_transactions().await?;

        writer.write_all(UTF8_BOM)?;
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(CSV_HEADER)?;

        let mut count = 0;
        for transaction in &transactions {
            csv_writer.write_record([
                format_timestamp(transaction.timestamp),
                format_cents(transaction.amount_cents),
                transaction.category.clone(),
                transaction.note.clone().unwrap_or_default(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export into `dir` under a timestamped file name. Returns the path written
    /// and the number of rows.
    pub async fn export_to_dir(&self, dir: &Path, now: NaiveDateTime) -> Result<(PathBuf, usize)> {
        let path = dir.join(export_file_name(now));
        let count = self.export_to_file(&path).await?;
        Ok((path, count))
    }

    pub async fn export_to_file(&self, path: &Path) -> Result<usize> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create export file {}", path.display()))?;
        let count = self.export_transactions_csv(BufWriter::new(file)).await?;
        tracing::info!(path = %path.display(), rows = count, "exported transactions");
        Ok(count)
    }
}
