//! Store error type.

use thiserror::Error;

pub type StoreResult<T> = Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("stored value is not a valid integer: {0}")]
    NotAnInteger(String),
}
