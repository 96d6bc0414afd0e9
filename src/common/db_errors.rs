//! Database error categorization
//!
//! SQLite reports constraint failures only through the error text, so errors are
//! classified by message and then mapped onto [`crate::errors::CoreErrorKind`].
//!
//! ```rust
//! use research_admin::common::db_errors::DbErrorKind;
//! use sea_orm::DbErr;
//!
//! let err = DbErr::RecordNotFound("Researcher not found".to_string());
//! assert_eq!(DbErrorKind::from_db_err(&err), DbErrorKind::NotFound);
//! ```

use sea_orm::DbErr;

use crate::errors::CoreErrorKind;

/// Categories of database errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorKind {
    /// Record not found (query returned no results)
    NotFound,

    /// Unique constraint violation, e.g. a second researcher with the same email
    UniqueViolation,

    /// Foreign key constraint violation
    ForeignKeyViolation,

    /// Database connection error
    ConnectionError,

    /// Query timeout
    Timeout,

    /// Unknown/other database error
    Unknown,
}

impl DbErrorKind {
    pub fn from_db_err(err: &DbErr) -> Self {
        match err {
            DbErr::RecordNotFound(_) => Self::NotFound,
            DbErr::Conn(inner) => {
                if inner.to_string().to_lowercase().contains("timeout") {
                    Self::Timeout
                } else {
                    Self::ConnectionError
                }
            }
            DbErr::ConnectionAcquire(_) => Self::ConnectionError,
            other => {
                let msg = other.to_string().to_lowercase();
                if msg.contains("unique") || msg.contains("duplicate") {
                    Self::UniqueViolation
                } else if msg.contains("foreign key") || msg.contains("fk_") {
                    Self::ForeignKeyViolation
                } else if msg.contains("timeout") {
                    Self::Timeout
                } else {
                    Self::Unknown
                }
            }
        }
    }

    /// Service-level error kind for this database failure
    pub fn core_kind(&self) -> CoreErrorKind {
        match self {
            Self::NotFound => CoreErrorKind::NotFound,
            Self::UniqueViolation => CoreErrorKind::Conflict,
            Self::ForeignKeyViolation => CoreErrorKind::Validation,
            Self::ConnectionError | Self::Timeout | Self::Unknown => CoreErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_record_not_found() {
        let err = DbErr::RecordNotFound("Lab not found".to_string());
        let kind = DbErrorKind::from_db_err(&err);
        assert_eq!(kind, DbErrorKind::NotFound);
        assert_eq!(kind.core_kind(), CoreErrorKind::NotFound);
    }

    #[test]
    fn test_categorize_unique_violation() {
        let err = DbErr::Custom("UNIQUE constraint failed: researchers.email".to_string());
        let kind = DbErrorKind::from_db_err(&err);
        assert_eq!(kind, DbErrorKind::UniqueViolation);
        assert_eq!(kind.core_kind(), CoreErrorKind::Conflict);
    }

    #[test]
    fn test_categorize_foreign_key_violation() {
        let err = DbErr::Custom("FOREIGN KEY constraint failed".to_string());
        let kind = DbErrorKind::from_db_err(&err);
        assert_eq!(kind, DbErrorKind::ForeignKeyViolation);
        assert_eq!(kind.core_kind(), CoreErrorKind::Validation);
    }

    #[test]
    fn test_connection_failures_are_internal() {
        let kind = DbErrorKind::ConnectionError;
        assert_eq!(kind.core_kind(), CoreErrorKind::Internal);
    }
}
