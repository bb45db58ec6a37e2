use thiserror::Error;

/// Classified persistence failure. Every store implementation maps its
/// backend's native errors onto these variants; anything it cannot classify
/// travels as `Other` and surfaces as a generic 500.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("value too long: {0}")]
    ValueTooLong(String),
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("foreign key constraint failed: {0}")]
    ForeignKeyViolation(String),
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
