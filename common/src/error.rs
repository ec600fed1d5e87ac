//! Error type shared by every ledger operation.

use thiserror::Error;

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transaction {id} is {status}, only pending transactions can change state")]
    InvalidTransition { id: i32, status: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LedgerError {
    pub fn is_unique_violation(&self) -> bool {
        match self {
            LedgerError::Database(sqlx::Error::Database(e)) => {
                e.code().as_deref() == Some(UNIQUE_VIOLATION)
            }
            _ => false,
        }
    }
}
