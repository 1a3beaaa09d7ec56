use std::io::stdout;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::{parse_kind, AppError, CategoryReport, LedgerService, MonthlySummary};
use crate::domain::{
    format_cents, format_timestamp, now_local, parse_amount, parse_timestamp, Transaction,
    TransactionKind, YearMonth,
};
use crate::io::Exporter;

/// Tally - local expense ledger
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Record income and expenses, then summarize them by month and category")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "TALLY_DB", default_value = "ledger.db")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and default categories
    Init,

    /// Record a transaction
    Add {
        /// Amount (e.g., "25.50" or "25"); must be greater than zero
        amount: String,

        /// Kind: income or expense
        #[arg(short, long, default_value = "expense")]
        kind: String,

        /// Category name (e.g., "餐饮")
        #[arg(short, long)]
        category: String,

        /// Free-text note
        #[arg(short, long)]
        note: Option<String>,

        /// When it happened (YYYY-MM-DD or "YYYY-MM-DD HH:MM:SS", defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// List transactions, newest first, one page at a time
    List {
        /// Page number, starting at 1
        #[arg(short, long, default_value = "1")]
        page: i64,

        /// Rows per page
        #[arg(long, default_value = "20")]
        page_size: i64,
    },

    /// List transactions from the last few days
    Recent {
        /// Number of days to look back
        #[arg(long, default_value = "7")]
        days: i64,
    },

    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: String,
    },

    /// Income and expense totals for a month
    Summary {
        /// Month (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,

        /// Move the selected month by this many months (e.g., -1 for the previous one)
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        offset: i32,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Category breakdown for a month
    Breakdown {
        /// Kind: income or expense (omit to combine both)
        #[arg(short, long)]
        kind: Option<String>,

        /// Month (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,

        /// Move the selected month by this many months
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        offset: i32,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Show the category catalog
    Categories {
        /// Kind: income or expense (omit for all)
        #[arg(short, long)]
        kind: Option<String>,
    },

    /// Show today's total
    Today {
        /// Kind: income or expense
        #[arg(short, long, default_value = "expense")]
        kind: String,
    },

    /// Export all transactions to CSV
    Export {
        /// Output file ("-" for stdout). Defaults to a timestamped file in --dir
        #[arg(short, long)]
        output: Option<String>,

        /// Directory for the timestamped export file
        #[arg(long, default_value = ".")]
        dir: String,
    },
}

/// Install the global tracing subscriber. `RUST_LOG` wins over `--verbose`.
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tally={default_level}")));

    // A subscriber may already be installed (e.g. when embedded); keep it.
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        init_tracing(self.verbose);

        let service = LedgerService::init(&self.database)
            .await
            .with_context(|| format!("Failed to open database {}", self.database))?;

        match self.command {
            Commands::Init => {
                let categories = service.list_categories(None).await?;
                println!(
                    "Database initialized: {} ({} categories)",
                    self.database,
                    categories.len()
                );
            }

            Commands::Add {
                amount,
                kind,
                category,
                note,
                date,
            } => {
                let kind = parse_kind(&kind)?;
                let amount_cents = parse_amount(&amount).with_context(|| {
                    format!("Invalid amount '{}'. Use a positive value like '25.50'", amount)
                })?;
                let timestamp = match date {
                    Some(date_str) => {
                        parse_timestamp(&date_str).ok_or(AppError::InvalidDate(date_str))?
                    }
                    None => now_local(),
                };

                let transaction = service
                    .add_transaction(kind, &category, amount_cents, note, timestamp)
                    .await?;

                println!(
                    "Recorded {}: {} {} on {} ({})",
                    transaction.kind,
                    format_cents(transaction.amount_cents),
                    transaction.category,
                    format_timestamp(transaction.timestamp),
                    transaction.id
                );
            }

            Commands::List { page, page_size } => {
                let page = service.list_page(page, page_size).await?;
                if page.items.is_empty() {
                    println!("No transactions found.");
                } else {
                    print_transactions(&page.items);
                    println!();
                    println!(
                        "Page {} of {} ({} transactions)",
                        page.page, page.page_count, page.total
                    );
                }
            }

            Commands::Recent { days } => {
                let transactions = service.list_recent(days, now_local()).await?;
                if transactions.is_empty() {
                    println!("No transactions in the last {} days.", days);
                } else {
                    print_transactions(&transactions);
                }
            }

            Commands::Delete { id } => {
                let transaction_id =
                    Uuid::parse_str(&id).context("Invalid transaction ID format (expected UUID)")?;

                if service.delete_transaction(transaction_id).await? {
                    println!("Deleted transaction {}", transaction_id);
                } else {
                    println!("No transaction found with ID {}", transaction_id);
                }
            }

            Commands::Summary {
                month,
                offset,
                format,
            } => {
                let month = resolve_month(month.as_deref(), offset)?;
                let summary = service.monthly_summary(month).await?;
                print_summary(&summary, &format)?;
            }

            Commands::Breakdown {
                kind,
                month,
                offset,
                format,
            } => {
                let kind = kind.as_deref().map(parse_kind).transpose()?;
                let month = resolve_month(month.as_deref(), offset)?;
                let report = service.category_summary(kind, month).await?;
                print_breakdown(&report, &format)?;
            }

            Commands::Categories { kind } => {
                let kind = kind.as_deref().map(parse_kind).transpose()?;
                let categories = service.list_categories(kind).await?;
                if categories.is_empty() {
                    println!("No categories found.");
                } else {
                    println!("{:<10} {:<12} {:<16}", "KIND", "NAME", "ICON");
                    println!("{}", "-".repeat(40));
                    for category in categories {
                        println!(
                            "{:<10} {:<12} {:<16}",
                            category.kind, category.name, category.icon
                        );
                    }
                }
            }

            Commands::Today { kind } => {
                let kind = parse_kind(&kind)?;
                let today = now_local().date();
                let daily = service.daily_total(today, Some(kind)).await?;
                let label = match kind {
                    TransactionKind::Income => "income",
                    TransactionKind::Expense => "spending",
                };
                println!("Today's {} ({}): {}", label, today, format_cents(daily.total));
            }

            Commands::Export { output, dir } => {
                let exporter = Exporter::new(&service);
                match output.as_deref() {
                    Some("-") => {
                        exporter.export_transactions_csv(stdout().lock()).await?;
                    }
                    Some(path) => {
                        let count = exporter.export_to_file(Path::new(path)).await?;
                        println!("Exported {} transactions to {}", count, path);
                    }
                    None => {
                        let (path, count) =
                            exporter.export_to_dir(Path::new(&dir), now_local()).await?;
                        println!("Exported {} transactions to {}", count, path.display());
                    }
                }
            }
        }

        Ok(())
    }
}

/// Pick the month to report on: `--month` or the current month, moved by `offset`.
fn resolve_month(month: Option<&str>, offset: i32) -> Result<YearMonth> {
    let base = match month {
        Some(text) => match YearMonth::parse(text) {
            Some(month) => month,
            None => bail!("Invalid month '{}'. Use YYYY-MM", text),
        },
        None => YearMonth::current(),
    };
    Ok(base.shift(offset))
}

fn print_transactions(transactions: &[Transaction]) {
    println!(
        "{:<36} {:<19} {:<8} {:>10} {:<10} NOTE",
        "ID", "DATE", "KIND", "AMOUNT", "CATEGORY"
    );
    println!("{}", "-".repeat(100));
    for transaction in transactions {
        println!("{}", transaction_row(transaction));
    }
}

/// One table row. Expenses show as negative amounts.
fn transaction_row(transaction: &Transaction) -> String {
    format!(
        "{:<36} {:<19} {:<8} {:>10} {:<10} {}",
        transaction.id,
        format_timestamp(transaction.timestamp),
        transaction.kind,
        format_cents(transaction.signed_amount()),
        truncate(&transaction.category, 10),
        truncate(transaction.note.as_deref().unwrap_or(""), 30)
    )
}

fn print_summary(summary: &MonthlySummary, format: &str) -> Result<()> {
    match format {
        "table" => {
            println!("Summary for {}", summary.month);
            println!("  Income:   {:>12}", format_cents(summary.income));
            println!("  Expense:  {:>12}", format_cents(summary.expense));
            println!("  Balance:  {:>12}", format_cents(summary.balance()));
        }
        "json" => println!("{}", serde_json::to_string_pretty(summary)?),
        other => bail!("Unknown format '{}'. Use table or json", other),
    }
    Ok(())
}

fn print_breakdown(report: &CategoryReport, format: &str) -> Result<()> {
    match format {
        "table" => {
            let scope = report.kind.map(|k| k.as_str()).unwrap_or("all");
            println!("Categories for {} ({})", report.month, scope);
            if report.categories.is_empty() {
                println!("No transactions in this month.");
                return Ok(());
            }
            println!(
                "{:<12} {:>12} {:>6} {:>7}",
                "CATEGORY", "TOTAL", "COUNT", "SHARE"
            );
            println!("{}", "-".repeat(40));
            for entry in &report.categories {
                println!(
                    "{:<12} {:>12} {:>6} {:>6.1}%",
                    truncate(&entry.category, 12),
                    format_cents(entry.total),
                    entry.count,
                    report.percentage(entry)
                );
            }
            println!("{}", "-".repeat(40));
            println!("{:<12} {:>12}", "TOTAL", format_cents(report.total));
        }
        "json" => println!("{}", serde_json::to_string_pretty(report)?),
        other => bail!("Unknown format '{}'. Use table or json", other),
    }
    Ok(())
}

/// Shorten to at most `max_chars` characters, counting chars rather than bytes.
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
