use thiserror::Error;
use wishlist_types::models::UnknownRelationType;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Wish not found: {0}")]
    NotFound(i64),
    #[error("Wish already booked: {0}")]
    AlreadyBooked(i64),
    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("Invalid stored value: {0}")]
    InvalidStoredValue(#[from] UnknownRelationType),
    #[error("DB lock poisoned: {0}")]
    LockPoisoned(String),
}

pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// True for failures of the store itself rather than of the request.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::Sqlite(_) | Self::InvalidStoredValue(_) | Self::LockPoisoned(_)
        )
    }
}

/// UNIQUE or PRIMARY KEY violation, as opposed to foreign key or NOT NULL failures.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.code == rusqlite::ErrorCode::ConstraintViolation
                && (e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
        }
        _ => false,
    }
}
