use chrono::NaiveDate;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures reported by a [`crate::BookingStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The atomic insert found a same-day overlap while holding the day lock.
    #[error("booking overlaps an existing booking on {day}")]
    Overlap { day: NaiveDate },

    #[error("an identity with email '{email}' already exists")]
    DuplicateEmail { email: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Unique-constraint violations from PostgreSQL (SQLSTATE 23505).
    pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
        err.as_database_error()
            .and_then(|db| db.code())
            .is_some_and(|code| code == "23505")
    }
}
