use rusqlite::ffi;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,

    #[error("{0}")]
    AlreadyExists(&'static str),

    /// A foreign key pointed at a row that does not exist.
    #[error("referenced record does not exist")]
    MissingReference,

    #[error("database lock poisoned")]
    Poisoned,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl DbError {
    /// Classify a failed write. Key collisions become `AlreadyExists` with the
    /// given message, dangling references become `MissingReference`.
    pub(crate) fn from_write(err: rusqlite::Error, duplicate: &'static str) -> Self {
        if let rusqlite::Error::SqliteFailure(ref e, _) = err {
            match e.extended_code {
                ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => {
                    return Self::AlreadyExists(duplicate);
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return Self::MissingReference,
                _ => {}
            }
        }
        Self::Sqlite(err)
    }
}

/// Read paths report every failure as `NotFound`; anything other than an
/// empty result is logged first.
pub(crate) fn lookup_failed(err: rusqlite::Error, lookup: &str) -> DbError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => {
            tracing::debug!(lookup, "no matching row");
        }
        e => {
            tracing::warn!(lookup, "lookup failed: {}", e);
        }
    }
    DbError::NotFound
}
