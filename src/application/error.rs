use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid transaction kind '{0}': expected income or expense")]
    InvalidKind(String),

    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    #[error("Invalid date '{0}': use YYYY-MM-DD or YYYY-MM-DD HH:MM:SS")]
    InvalidDate(String),

    #[error("Invalid month: {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },

    #[error("Page size must be at least 1")]
    InvalidPageSize,

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
