//! Repository Module
//!
//! CRUD operations over the SQLite pool, one module per aggregate. All
//! functions are plain async fns taking `&SqlitePool`; the only
//! multi-statement transaction lives in [`order::create`].

pub mod cart;
pub mod order;
pub mod otp;
pub mod product;
pub mod user;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err
            && matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation)
        {
            return RepoError::Duplicate(db_err.message().to_string());
        }
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
