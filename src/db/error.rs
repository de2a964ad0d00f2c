//! Database error types.

use derive_more::{Display, Error};
use tracing::instrument;

/// What went wrong in the storage layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum DbErrorKind {
    /// The database file could not be opened.
    #[display("connection")]
    Connection,
    /// A schema migration failed on open.
    #[display("migration")]
    Migration,
    /// A query or transaction failed.
    #[display("query")]
    Query,
    /// A stored row holds values this build cannot read back.
    #[display("corrupt row")]
    CorruptRow,
}

/// Database error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Database {} error: {} at {}:{}", kind, message, file, line)]
pub struct DbError {
    /// Failure category.
    pub kind: DbErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl DbError {
    /// Creates an error of `kind`, recording the caller's location.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(kind: DbErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// A stored value failed to parse.
    #[track_caller]
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::new(DbErrorKind::CorruptRow, message)
    }

    /// Returns true when the data read back is unusable but the database
    /// itself is healthy.
    pub fn is_corrupt_row(&self) -> bool {
        self.kind == DbErrorKind::CorruptRow
    }
}

impl From<diesel::result::Error> for DbError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        Self::new(DbErrorKind::Query, err.to_string())
    }
}

impl From<diesel::ConnectionError> for DbError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::new(DbErrorKind::Connection, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_in_message_and_location_tracked() {
        let err = DbError::corrupt("Invalid mark 'Z'");
        assert!(err.is_corrupt_row());
        assert_eq!(err.file, file!());
        assert!(err.to_string().starts_with("Database corrupt row error: Invalid mark 'Z'"));
    }

    #[test]
    fn test_diesel_errors_are_query_failures() {
        let err = DbError::from(diesel::result::Error::NotFound);
        assert_eq!(err.kind, DbErrorKind::Query);
        assert!(!err.is_corrupt_row());
    }
}
